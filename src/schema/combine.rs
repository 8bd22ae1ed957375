//! Merge exact column definitions with their descriptions.

use crate::report::render_table;
use crate::schema::descriptive::DescribedTable;
use crate::schema::exact::TableDef;
use crate::schema::fuzzy::best_match;
use crate::types::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Description used when no described column matches.
pub const MISSING_DESCRIPTION: &str = "No description found";

/// One row of the combined schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRow {
    #[serde(rename = "Table")]
    pub table: String,

    #[serde(rename = "Col_Name")]
    pub column: String,

    #[serde(rename = "Col_Type")]
    pub col_type: String,

    #[serde(rename = "Description")]
    pub description: String,
}

/// Attach a description to every column of every matched table.
///
/// Tables without a described counterpart are skipped; columns without
/// one get `MISSING_DESCRIPTION`. Both cases are logged as warnings.
pub fn combine_schemas(
    exact: &[TableDef],
    descriptive: &[DescribedTable],
    threshold: u8,
) -> Vec<SchemaRow> {
    let mut rows = Vec::new();

    for table in exact {
        let matched = best_match(
            &table.name,
            descriptive.iter().map(|t| t.name.as_str()),
            threshold,
        )
        .and_then(|name| descriptive.iter().find(|t| t.name == name));

        let Some(described) = matched else {
            tracing::warn!(table = %table.name, "no matching description found for table");
            continue;
        };

        for column in &table.columns {
            let description = best_match(
                &column.name,
                described.columns.iter().map(|(name, _)| name.as_str()),
                threshold,
            )
            .and_then(|name| described.description(name));

            let description = match description {
                Some(d) => d.to_string(),
                None => {
                    tracing::warn!(
                        table = %table.name,
                        column = %column.name,
                        "no matching description found for column"
                    );
                    MISSING_DESCRIPTION.to_string()
                }
            };

            rows.push(SchemaRow {
                table: table.name.clone(),
                column: column.name.clone(),
                col_type: column.col_type.clone(),
                description,
            });
        }
    }

    rows
}

/// Write rows as CSV with a `Table,Col_Name,Col_Type,Description` header.
pub fn write_csv<W: Write>(rows: &[SchemaRow], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    if rows.is_empty() {
        csv_writer.write_record(["Table", "Col_Name", "Col_Type", "Description"])?;
    }
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Aligned text table of the rows.
pub fn render_rows(rows: &[SchemaRow]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.table.clone(),
                r.column.clone(),
                r.col_type.clone(),
                r.description.clone(),
            ]
        })
        .collect();
    render_table(&["Table", "Col_Name", "Col_Type", "Description"], &cells)
}
