//! Saved query files
//!
//! A saved query is six tagged lines in fixed order:
//!
//! ```text
//! FIELDS {TaxonName, Shape}
//! FROM {Species}
//! WHERE {TaxonGroup = 'Birds'$$AND Year > 2000}
//! GROUP BY {}
//! ORDER BY {TaxonName}
//! FORMAT {Shapefile}
//! ```
//!
//! Line breaks inside a value are written as `$$`. Text that already contains
//! `$$` is not escaped and comes back with line breaks in its place.

use std::path::{Path, PathBuf};

use crate::error::{DataSelectorError, Result};
use crate::output::OutputFormat;
use crate::query::QueryState;

/// Sentinel replacing line breaks inside a value
pub const LINE_BREAK_SENTINEL: &str = "$$";

const TAG_FIELDS: &str = "FIELDS";
const TAG_FROM: &str = "FROM";
const TAG_WHERE: &str = "WHERE";
const TAG_GROUP_BY: &str = "GROUP BY";
const TAG_ORDER_BY: &str = "ORDER BY";
const TAG_FORMAT: &str = "FORMAT";

fn encode_value(value: &str) -> String {
    value
        .replace("\r\n", LINE_BREAK_SENTINEL)
        .replace(['\n', '\r'], LINE_BREAK_SENTINEL)
}

fn decode_value(value: &str) -> String {
    value.replace(LINE_BREAK_SENTINEL, "\n").replace('\r', "\n")
}

fn tagged_line(tag: &str, value: &str) -> String {
    format!("{} {{{}}}", tag, encode_value(value))
}

/// Value of a `<TAG> {<value>}` line, `None` if the line carries another tag
fn tagged_value<'a>(line: &'a str, tag: &str) -> Option<&'a str> {
    let rest = line.trim_end().strip_prefix(tag)?.strip_prefix(" {")?;
    rest.strip_suffix('}')
}

/// Render the query as its six tagged lines
pub fn serialize_query(state: &QueryState) -> String {
    let lines = [
        tagged_line(TAG_FIELDS, &state.columns),
        tagged_line(TAG_FROM, state.selected_table.as_deref().unwrap_or("")),
        tagged_line(TAG_WHERE, &state.where_clause),
        tagged_line(TAG_GROUP_BY, &state.group_by),
        tagged_line(TAG_ORDER_BY, &state.order_by),
        tagged_line(
            TAG_FORMAT,
            state.selected_output_format.map_or("", |f| f.label()),
        ),
    ];
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// Parse saved query text into a fresh state.
///
/// Missing or empty tags leave their field empty; unrecognised lines are
/// ignored, as is a FORMAT value that names no known format.
pub fn parse_query(text: &str) -> QueryState {
    let mut state = QueryState::default();

    for line in text.lines() {
        if let Some(value) = tagged_value(line, TAG_FIELDS) {
            state.columns = decode_value(value);
        } else if let Some(value) = tagged_value(line, TAG_FROM) {
            let table = decode_value(value);
            state.selected_table = (!table.trim().is_empty()).then_some(table);
        } else if let Some(value) = tagged_value(line, TAG_WHERE) {
            state.where_clause = decode_value(value);
        } else if let Some(value) = tagged_value(line, TAG_GROUP_BY) {
            state.group_by = decode_value(value);
        } else if let Some(value) = tagged_value(line, TAG_ORDER_BY) {
            state.order_by = decode_value(value);
        } else if let Some(value) = tagged_value(line, TAG_FORMAT) {
            if !value.trim().is_empty() {
                state.selected_output_format = OutputFormat::from_label(value);
                if state.selected_output_format.is_none() {
                    log::warn!("Ignoring unknown output format '{}' in saved query", value);
                }
            }
        }
    }

    state
}

/// Correct or reject a save path: no extension gets `.<extension>` appended,
/// any other extension is an error.
pub fn resolve_query_path(path: &Path, extension: &str) -> Result<PathBuf> {
    match path.extension().and_then(|e| e.to_str()) {
        None => {
            let mut file = path.as_os_str().to_owned();
            file.push(".");
            file.push(extension);
            Ok(PathBuf::from(file))
        }
        Some(ext) if ext.eq_ignore_ascii_case(extension) => Ok(path.to_path_buf()),
        Some(ext) => Err(DataSelectorError::InvalidInput(format!(
            "Query files must have the .{} extension, not .{}",
            extension, ext
        ))),
    }
}

/// Write the query to `path`
pub fn write_query_file(path: &Path, state: &QueryState) -> Result<()> {
    std::fs::write(path, serialize_query(state)).map_err(|e| {
        DataSelectorError::QueryFile(format!("Failed to write {}: {}", path.display(), e))
    })?;
    log::info!("Saved query to {}", path.display());
    Ok(())
}

/// Read a query file; the saved query name is the file stem
pub fn read_query_file(path: &Path) -> Result<QueryState> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        DataSelectorError::QueryFile(format!("Failed to read {}: {}", path.display(), e))
    })?;

    let mut state = parse_query(&text);
    state.saved_query_name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned());
    log::info!("Loaded query from {}", path.display());
    Ok(state)
}
