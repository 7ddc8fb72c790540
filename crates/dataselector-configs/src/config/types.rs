use super::defaults::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Main pane configuration
///
/// # Configuration Format
///
/// ```toml
/// [database]
/// connection_file = "C:/GIS/connections/nbn.sde"
/// schema = "dbo"
/// objects_table = "INFORMATION_SCHEMA.TABLES"
/// include_wildcard = "{schema}.*"
/// exclude_wildcard = "{schema}.*_point_*"
/// probe_timeout_secs = 30
///
/// [procedures]
/// select = "Selector_Select"
/// clear = "Selector_Clear"
///
/// [query]
/// geometry_columns = ["SP_GEOMETRY", "Shape"]
///
/// [run_log]
/// dir = "~/DataSelector/logs"
/// clear_on_run = true
/// open_on_completion = false
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSelectorConfig {
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub procedures: ProcedureSettings,
    #[serde(default)]
    pub query: QuerySettings,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub run_log: RunLogSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Spatial database connection and table listing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Connection file (container path) prefixed to server object names when
    /// the GIS side copies result objects out of the database
    #[serde(default)]
    pub connection_file: String,

    /// Schema that owns the source tables and the temporary result objects
    #[serde(default = "default_schema")]
    pub schema: String,

    /// Table or view listing the schema-qualified table names
    #[serde(default = "default_objects_table")]
    pub objects_table: String,

    /// Include pattern (`*`/`?` wildcards, `{schema}` placeholder)
    #[serde(default = "default_include_wildcard")]
    pub include_wildcard: String,

    /// Exclude pattern; empty excludes nothing
    #[serde(default)]
    pub exclude_wildcard: String,

    /// Timeout for the SQL verification probe
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            connection_file: String::new(),
            schema: default_schema(),
            objects_table: default_objects_table(),
            include_wildcard: default_include_wildcard(),
            exclude_wildcard: String::new(),
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

impl DatabaseSettings {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

/// Names of the server-side stored procedures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcedureSettings {
    #[serde(default = "default_select_procedure")]
    pub select: String,
    #[serde(default = "default_clear_procedure")]
    pub clear: String,
}

impl Default for ProcedureSettings {
    fn default() -> Self {
        Self {
            select: default_select_procedure(),
            clear: default_clear_procedure(),
        }
    }
}

/// Saved query files and spatial detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerySettings {
    /// Initial directory offered when saving or loading queries
    #[serde(default = "default_query_dir")]
    pub default_dir: String,

    /// Extension (without dot) of saved query files
    #[serde(default = "default_query_extension")]
    pub file_extension: String,

    /// Column names that mark a result set as spatial
    #[serde(default = "default_geometry_columns")]
    pub geometry_columns: Vec<String>,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            default_dir: default_query_dir(),
            file_extension: default_query_extension(),
            geometry_columns: default_geometry_columns(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Initial directory offered by the output prompt
    #[serde(default = "default_output_dir")]
    pub default_dir: String,

    /// Output format label preselected when the pane opens
    #[serde(default)]
    pub default_format: Option<String>,

    /// Name of the map created when no map is active
    #[serde(default = "default_map_name")]
    pub map_name: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            default_dir: default_output_dir(),
            default_format: None,
            map_name: default_map_name(),
        }
    }
}

/// Per-user run log written by every selection run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLogSettings {
    #[serde(default = "default_run_log_dir")]
    pub dir: String,

    /// Delete the previous run log before each run
    #[serde(default = "default_true")]
    pub clear_on_run: bool,

    /// Open the run log once the run completes (it always opens on warnings)
    #[serde(default)]
    pub open_on_completion: bool,
}

impl Default for RunLogSettings {
    fn default() -> Self {
        Self {
            dir: default_run_log_dir(),
            clear_on_run: true,
            open_on_completion: false,
        }
    }
}

/// Diagnostic logging (tracing subscriber) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_file_path")]
    pub file_path: String,

    #[serde(default)]
    pub log_to_console: bool,

    /// "compact" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Per-target level overrides, e.g. `dataselector_core::pipeline = "debug"`
    #[serde(default)]
    pub targets: HashMap<String, String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_path: default_log_file_path(),
            log_to_console: false,
            format: default_log_format(),
            targets: HashMap::new(),
        }
    }
}
