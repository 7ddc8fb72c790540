// Default value functions

use super::loader::expand_path;

pub fn default_schema() -> String {
    "dbo".to_string()
}

pub fn default_objects_table() -> String {
    "INFORMATION_SCHEMA.TABLES".to_string()
}

pub fn default_include_wildcard() -> String {
    "{schema}.*".to_string()
}

pub fn default_probe_timeout_secs() -> u64 {
    30
}

pub fn default_select_procedure() -> String {
    "Selector_Select".to_string()
}

pub fn default_clear_procedure() -> String {
    "Selector_Clear".to_string()
}

pub fn default_query_dir() -> String {
    expand_path("~/DataSelector/queries")
}

pub fn default_query_extension() -> String {
    "qsf".to_string()
}

pub fn default_geometry_columns() -> Vec<String> {
    vec!["SP_GEOMETRY".to_string(), "Shape".to_string()]
}

pub fn default_output_dir() -> String {
    expand_path("~/DataSelector/output")
}

pub fn default_map_name() -> String {
    "Data Selector".to_string()
}

pub fn default_run_log_dir() -> String {
    expand_path("~/DataSelector/logs")
}

pub fn default_true() -> bool {
    true
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_log_file_path() -> String {
    expand_path("~/DataSelector/logs/diagnostics.log")
}

pub fn default_log_format() -> String {
    "compact".to_string()
}
