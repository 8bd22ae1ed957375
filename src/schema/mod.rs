//! Database schema documentation merging.
//!
//! Combines a DDL dump (exact column names and types) with a free-form
//! data dictionary (column descriptions) into one table, linking the two
//! through fuzzy name matching.

pub mod combine;
pub mod descriptive;
pub mod exact;
pub mod fuzzy;

pub use combine::{combine_schemas, render_rows, write_csv, SchemaRow, MISSING_DESCRIPTION};
pub use descriptive::{parse_descriptive_schema, DescribedTable};
pub use exact::{parse_exact_schema, ColumnDef, TableDef};
pub use fuzzy::{best_match, ratio, DEFAULT_THRESHOLD};

use crate::types::{EvalError, Result};
use std::path::Path;

/// Read both schema files and combine them.
///
/// # Errors
///
/// Returns `EvalError::SchemaError` if the exact schema has no
/// `CREATE TABLE` statement.
pub fn combine_schema_files(
    exact_path: &Path,
    descriptive_path: &Path,
    threshold: u8,
) -> Result<Vec<SchemaRow>> {
    let exact = parse_exact_schema(&std::fs::read_to_string(exact_path)?);
    if exact.is_empty() {
        return Err(EvalError::SchemaError(format!(
            "No CREATE TABLE statement in {}",
            exact_path.display()
        )));
    }
    let descriptive = parse_descriptive_schema(&std::fs::read_to_string(descriptive_path)?);
    Ok(combine_schemas(&exact, &descriptive, threshold))
}
