//! Column descriptions from free-form data dictionary text.
//!
//! The text is split at every `<name> table` heading. Within a block, each
//! `<column>` followed by two or more spaces and a description is one entry:
//!
//! ```text
//! Player table
//! player_id    Unique player identifier
//! name         Full name
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static TABLE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\w+)\s+table").unwrap());

static COLUMN_ENTRY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w+)\s{2,}(.+)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescribedTable {
    /// Lower-cased table name
    pub name: String,

    /// `(column, description)` in first-seen order
    pub columns: Vec<(String, String)>,
}

impl DescribedTable {
    pub fn description(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, description)| description.as_str())
    }

    fn set(&mut self, column: &str, description: &str) {
        match self.columns.iter_mut().find(|(name, _)| name == column) {
            Some(entry) => entry.1 = description.to_string(),
            None => self.columns.push((column.to_string(), description.to_string())),
        }
    }
}

/// Parse described tables, in first-seen order.
///
/// A repeated table replaces the earlier block's entries; a repeated
/// column keeps the last description.
pub fn parse_descriptive_schema(text: &str) -> Vec<DescribedTable> {
    let headings: Vec<_> = TABLE_HEADING.captures_iter(text).collect();
    let mut tables: Vec<DescribedTable> = Vec::new();

    for (i, caps) in headings.iter().enumerate() {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let block_end = headings
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(text.len(), |m| m.start());
        let block = text[whole.end()..block_end].trim();

        let mut table = DescribedTable {
            name: name.as_str().trim().to_lowercase(),
            columns: Vec::new(),
        };
        for entry in COLUMN_ENTRY.captures_iter(block) {
            table.set(entry[1].trim(), entry[2].trim());
        }

        match tables.iter_mut().find(|t| t.name == table.name) {
            Some(existing) => existing.columns = table.columns,
            None => tables.push(table),
        }
    }

    tracing::debug!(tables = tables.len(), "parsed descriptive schema");
    tables
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "\
Player Table
player_id    Unique identifier of the player
name  Full name
name  Display name

TEAM TABLE
team_id   Unique team id
city      Home city
";

    #[test]
    fn test_blocks_and_entries() {
        let tables = parse_descriptive_schema(TEXT);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].name, "player");
        assert_eq!(tables[1].name, "team");

        assert_eq!(tables[0].description("player_id"), Some("Unique identifier of the player"));
        assert_eq!(tables[1].description("city"), Some("Home city"));
    }

    #[test]
    fn test_repeated_column_keeps_last() {
        let tables = parse_descriptive_schema(TEXT);
        assert_eq!(tables[0].columns.len(), 2);
        assert_eq!(tables[0].description("name"), Some("Display name"));
    }

    #[test]
    fn test_single_space_is_not_an_entry() {
        let tables = parse_descriptive_schema("game table\nid the id\n");
        assert!(tables[0].columns.is_empty());
    }

    #[test]
    fn test_no_headings() {
        assert!(parse_descriptive_schema("just text").is_empty());
    }
}
