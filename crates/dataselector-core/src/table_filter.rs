//! Table name filtering
//!
//! Filters the raw schema-qualified table names returned by the server against
//! the configured include/exclude wildcard patterns.

use regex::Regex;

/// Placeholders replaced by the schema name inside a wildcard pattern
const SCHEMA_PLACEHOLDERS: &[&str] = &["{schema}", "{0}"];

/// Compile a `*`/`?` wildcard pattern into an anchored, case-insensitive regex.
///
/// Returns `None` for an empty pattern.
fn compile_wildcard(pattern: &str, schema: &str) -> Option<Regex> {
    let mut expanded = pattern.trim().to_string();
    if expanded.is_empty() {
        return None;
    }
    for placeholder in SCHEMA_PLACEHOLDERS {
        expanded = expanded.replace(placeholder, schema);
    }

    let mut re = String::with_capacity(expanded.len() + 8);
    re.push_str("(?i)^");
    for ch in expanded.chars() {
        match ch {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            c => re.push_str(&regex::escape(&c.to_string())),
        }
    }
    re.push('$');

    // Every non-wildcard character is escaped, so compilation cannot fail.
    Regex::new(&re).ok()
}

/// Strip the schema prefix, splitting on the first `.`
pub fn strip_schema(name: &str) -> &str {
    match name.split_once('.') {
        Some((_, table)) => table,
        None => name,
    }
}

/// Keep the names matching `include_pattern` and not matching `exclude_pattern`.
///
/// Patterns are case-insensitive globs; `{schema}` (or `{0}`) is replaced by
/// `schema`. An empty include pattern keeps everything, an empty exclude
/// pattern drops nothing. Unless `keep_full_name` is set, the schema prefix is
/// removed from kept names. Output order follows input order.
pub fn filter_table_names<S: AsRef<str>>(
    names: &[S],
    schema: &str,
    include_pattern: &str,
    exclude_pattern: &str,
    keep_full_name: bool,
) -> Vec<String> {
    let include = compile_wildcard(include_pattern, schema);
    let exclude = compile_wildcard(exclude_pattern, schema);

    names
        .iter()
        .map(|n| n.as_ref().trim())
        .filter(|name| !name.is_empty())
        .filter(|name| include.as_ref().map_or(true, |re| re.is_match(name)))
        .filter(|name| !exclude.as_ref().map_or(false, |re| re.is_match(name)))
        .map(|name| {
            if keep_full_name {
                name.to_string()
            } else {
                strip_schema(name).to_string()
            }
        })
        .collect()
}
