//! Column names and types from a `CREATE TABLE` dump.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static CREATE_TABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^CREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?[`"\[]?(\w+)"#).unwrap()
});

/// Lines that describe the table rather than a column.
const CONSTRAINT_PREFIXES: [&str; 5] = ["PRIMARY KEY", "FOREIGN KEY", "CONSTRAINT", "UNIQUE", "CHECK"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,

    /// Declared type, empty when the line has none
    pub col_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

/// Parse tables and their columns from DDL text, in file order.
///
/// Columns are split on top-level commas inside the table's parentheses,
/// so both layouts work:
///
/// ```text
/// CREATE TABLE player (
///     player_id INTEGER,
///     name TEXT,
///     PRIMARY KEY (player_id)
/// );
/// CREATE TABLE team (team_id INTEGER, city TEXT);
/// ```
///
/// `--` comments and `.` shell commands are ignored.
pub fn parse_exact_schema(text: &str) -> Vec<TableDef> {
    let mut tables: Vec<TableDef> = Vec::new();
    // paren depth inside the current table body, 0 when outside
    let mut depth = 0usize;
    let mut awaiting_body = false;

    for line in text.lines().map(strip_comment).map(str::trim) {
        if line.is_empty() || line.starts_with('.') {
            continue;
        }

        let mut rest = line;
        if let Some(caps) = CREATE_TABLE.captures(line) {
            tables.push(TableDef {
                name: caps[1].to_string(),
                columns: Vec::new(),
            });
            depth = 0;
            awaiting_body = true;
            rest = &line[caps.get(0).map_or(0, |m| m.end())..];
        }

        if awaiting_body {
            match (rest.find('('), rest.find(';')) {
                (Some(open), semi) if semi.map_or(true, |s| open < s) => {
                    awaiting_body = false;
                    depth = 1;
                    rest = &rest[open + 1..];
                }
                (_, Some(_)) => {
                    // CREATE TABLE ... AS SELECT and friends
                    awaiting_body = false;
                    continue;
                }
                _ => continue,
            }
        }

        if depth == 0 {
            continue;
        }

        let (pieces, closed) = split_columns(rest, &mut depth);
        if let Some(table) = tables.last_mut() {
            table.columns.extend(
                pieces
                    .iter()
                    .filter(|piece| !is_constraint(piece))
                    .filter_map(|piece| parse_column(piece)),
            );
        }
        if closed {
            depth = 0;
        }
    }

    tracing::debug!(tables = tables.len(), "parsed exact schema");
    tables
}

fn strip_comment(line: &str) -> &str {
    line.find("--").map_or(line, |at| &line[..at])
}

/// Split a line of a table body on commas at depth 1.
///
/// Returns the column pieces and whether the body's closing paren was seen.
fn split_columns<'a>(line: &'a str, depth: &mut usize) -> (Vec<&'a str>, bool) {
    let mut pieces = Vec::new();
    let mut start = 0;

    for (i, c) in line.char_indices() {
        match c {
            '(' => *depth += 1,
            ')' => {
                *depth -= 1;
                if *depth == 0 {
                    pieces.push(line[start..i].trim());
                    return (pieces.into_iter().filter(|p| !p.is_empty()).collect(), true);
                }
            }
            ',' if *depth == 1 => {
                pieces.push(line[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }

    pieces.push(line[start..].trim());
    (pieces.into_iter().filter(|p| !p.is_empty()).collect(), false)
}

fn is_constraint(line: &str) -> bool {
    let upper = line.to_ascii_uppercase();
    CONSTRAINT_PREFIXES.iter().any(|prefix| upper.starts_with(prefix))
}

fn parse_column(piece: &str) -> Option<ColumnDef> {
    let mut words = piece.split_whitespace();
    let name = clean_word(words.next()?);
    if name.is_empty() {
        return None;
    }
    let col_type = words.next().map(clean_word).unwrap_or_default();
    Some(ColumnDef { name, col_type })
}

/// Strip identifier quoting.
fn clean_word(word: &str) -> String {
    word.trim_matches(|c: char| matches!(c, '`' | '"' | '[' | ']'))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DDL: &str = r#"
.mode columns
CREATE TABLE player (
    player_id INTEGER NOT NULL,
    name TEXT,
    team_id INTEGER,
    PRIMARY KEY (player_id),
    FOREIGN KEY (team_id) REFERENCES team(team_id)
);

CREATE TABLE IF NOT EXISTS team (
    team_id INTEGER,
    city VARCHAR(40),
    founded
);
"#;

    #[test]
    fn test_tables_and_columns() {
        let tables = parse_exact_schema(DDL);
        assert_eq!(tables.len(), 2);

        let player = &tables[0];
        assert_eq!(player.name, "player");
        let names: Vec<&str> = player.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["player_id", "name", "team_id"]);
        assert_eq!(player.columns[0].col_type, "INTEGER");
        assert_eq!(player.columns[1].col_type, "TEXT");
    }

    #[test]
    fn test_type_cleanup_and_missing_type() {
        let tables = parse_exact_schema(DDL);
        let team = &tables[1];
        assert_eq!(team.name, "team");
        assert_eq!(team.columns[1].col_type, "VARCHAR(40)");
        assert_eq!(team.columns[2], ColumnDef { name: "founded".to_string(), col_type: String::new() });
    }

    #[test]
    fn test_single_line_table() {
        let tables = parse_exact_schema(
            "CREATE TABLE a (id INTEGER, name VARCHAR(20), PRIMARY KEY (id));\nCREATE INDEX idx_a ON a(id);\n",
        );
        assert_eq!(tables.len(), 1);
        assert_eq!(
            tables[0].columns,
            vec![
                ColumnDef { name: "id".to_string(), col_type: "INTEGER".to_string() },
                ColumnDef { name: "name".to_string(), col_type: "VARCHAR(20)".to_string() },
            ]
        );
    }

    #[test]
    fn test_closing_paren_on_last_column() {
        let ddl = "CREATE TABLE a (\n    id INTEGER,\n    b TEXT);\nCREATE INDEX idx_b ON a(b);\nCREATE TABLE c (\n    x REAL\n);\n";
        let tables = parse_exact_schema(ddl);
        assert_eq!(tables.len(), 2);

        let names: Vec<&str> = tables[0].columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "b"]);
        assert_eq!(tables[0].columns[1].col_type, "TEXT");
        assert_eq!(tables[1].columns, vec![ColumnDef { name: "x".to_string(), col_type: "REAL".to_string() }]);
    }

    #[test]
    fn test_comments_inside_table() {
        let ddl = "CREATE TABLE a\n(\n    -- surrogate key\n    id INTEGER, -- never null\n    name TEXT\n);\n";
        let tables = parse_exact_schema(ddl);
        let names: Vec<&str> = tables[0].columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name"]);
    }

    #[test]
    fn test_create_table_as_select_has_no_columns() {
        let tables = parse_exact_schema("CREATE TABLE b AS SELECT * FROM a;\nid INTEGER\n");
        assert_eq!(tables.len(), 1);
        assert!(tables[0].columns.is_empty());
    }

    #[test]
    fn test_lines_outside_tables_ignored() {
        assert!(parse_exact_schema("player_id INTEGER\n.tables\n").is_empty());
    }
}
