//! SQL text helpers shared by verification and the selection protocol

use once_cell::sync::Lazy;
use regex::Regex;

use super::state::starts_with_from;

/// Statement prefix that turns off execution for the probe
pub const NOEXEC_ON: &str = "SET NOEXEC ON;";
/// Statement suffix that turns execution back on
pub const NOEXEC_OFF: &str = "SET NOEXEC OFF;";

static LINE_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r\n|\r|\n").unwrap());

static FROM_TARGET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)^\s*from\s+([\[\]"\w.]+)"#).unwrap());

/// Collapse every CR/LF into a single space
pub fn collapse_line_breaks(text: &str) -> String {
    LINE_BREAKS.replace_all(text, " ").trim().to_string()
}

/// Quote a value as a SQL string literal, doubling embedded single quotes.
///
/// This only keeps quotes from breaking the literal; it is not a general
/// injection defence.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Build `SELECT <columns> FROM <schema>.<table> [WHERE ..] [GROUP BY ..] [ORDER BY ..]`.
///
/// A where text starting with `from ` replaces the FROM clause entirely.
pub fn build_select(
    schema: &str,
    table: Option<&str>,
    columns: &str,
    where_clause: &str,
    group_by: &str,
    order_by: &str,
) -> String {
    let columns = collapse_line_breaks(columns);
    let where_clause = collapse_line_breaks(where_clause);
    let group_by = collapse_line_breaks(group_by);
    let order_by = collapse_line_breaks(order_by);

    let mut sql = format!("SELECT {}", columns);

    if starts_with_from(&where_clause) {
        sql.push(' ');
        sql.push_str(&where_clause);
    } else {
        if let Some(table) = table {
            sql.push_str(&format!(" FROM {}.{}", schema, table));
        }
        if !where_clause.is_empty() {
            sql.push_str(&format!(" WHERE {}", where_clause));
        }
    }

    if !group_by.is_empty() {
        sql.push_str(&format!(" GROUP BY {}", group_by));
    }
    if !order_by.is_empty() {
        sql.push_str(&format!(" ORDER BY {}", order_by));
    }

    sql
}

/// Wrap a statement so the server compiles it without executing it
pub fn probe_statement(select: &str) -> String {
    format!("{}\n{};\n{}", NOEXEC_ON, select, NOEXEC_OFF)
}

/// Remove the NOEXEC bracketing from a server message
pub fn strip_probe_markers(message: &str) -> String {
    message
        .replace(NOEXEC_ON, "")
        .replace(NOEXEC_OFF, "")
        .trim()
        .to_string()
}

/// Table named by a `from ...` where text, without schema or brackets
pub fn table_from_clause(where_clause: &str) -> Option<String> {
    let target = FROM_TARGET.captures(where_clause)?.get(1)?.as_str();
    let table = target.rsplit('.').next().unwrap_or(target);
    let table = table.trim_matches(|c| c == '[' || c == ']' || c == '"');
    (!table.is_empty()).then(|| table.to_string())
}
