//! Collaborator traits
//!
//! The core never talks to a database driver, a GIS SDK or a UI toolkit
//! directly. The host supplies implementations of these traits:
//!
//! - [`DatabaseClient`]: metadata lookups and raw commands on the geodatabase connection
//! - [`SqlProbe`]: a direct, timeout-bounded connection used to verify SQL
//! - [`MapService`]: dataset copies/exports and map/layer management
//! - [`Prompter`]: path pickers, yes/no questions and message boxes
//! - [`HostPane`]: running flag, progress sink, notifications

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;

/// Severity of a message, notification or run status image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Image tag the host maps to an icon
    pub fn image_tag(&self) -> &'static str {
        match self {
            Severity::Success => "Success",
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.image_tag())
    }
}

/// Database client on the geodatabase connection
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Schema-qualified table names listed by `objects_table`
    async fn list_table_names(&self, objects_table: &str) -> Result<Vec<String>>;

    /// Column names of a schema-qualified table
    async fn list_column_names(&self, table: &str) -> Result<Vec<String>>;

    /// Row count of a table or feature class
    async fn row_count(&self, object: &str) -> Result<u64>;

    async fn object_exists(&self, name: &str) -> Result<bool>;

    /// Execute a raw, parameterless command
    async fn execute_command(&self, text: &str) -> Result<()>;
}

/// Direct SQL connection used by verification.
///
/// Implementations open a connection, run `sql`, and close it. A statement
/// the server rejects must surface as [`crate::DataSelectorError::Sql`];
/// connection failures as [`crate::DataSelectorError::Connection`].
#[async_trait]
pub trait SqlProbe: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<()>;
}

/// GIS dataset and map operations
#[async_trait]
pub trait MapService: Send + Sync {
    /// Name of the active map, if any
    async fn active_map_name(&self) -> Result<Option<String>>;

    async fn create_map(&self, name: &str) -> Result<()>;

    async fn add_layer_to_map(&self, path: &Path) -> Result<()>;

    async fn add_table_to_map(&self, path: &Path) -> Result<()>;

    /// Copy a feature class into a geodatabase
    async fn copy_features(&self, source: &Path, destination: &Path, suppress_auto_add: bool)
        -> Result<()>;

    async fn copy_table(&self, source: &Path, destination: &Path, add_to_map: bool) -> Result<()>;

    /// Export a feature class to a standalone dataset such as a shapefile
    async fn export_features(&self, source: &Path, destination: &Path, add_to_map: bool)
        -> Result<()>;

    /// Write rows to a delimited text file, appending when `append` is set
    async fn delimited_copy(
        &self,
        source: &Path,
        destination: &Path,
        is_csv: bool,
        append: bool,
    ) -> Result<()>;

    /// True if a file or geodatabase item already exists at `path`
    async fn dataset_exists(&self, path: &Path) -> Result<bool>;
}

/// File filter offered by a path prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathFilter {
    pub description: String,
    /// Expected extension without dot; `None` for geodatabase items
    pub extension: Option<String>,
}

/// A request for a path from the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRequest {
    pub title: String,
    pub filter: PathFilter,
    pub initial_dir: PathBuf,
    /// Save dialog (true) or open dialog (false)
    pub for_save: bool,
}

/// Interactive prompts
#[async_trait]
pub trait Prompter: Send + Sync {
    /// `None` when the user cancels
    async fn ask_path(&self, request: &PathRequest) -> Option<PathBuf>;

    async fn ask_yes_no(&self, question: &str) -> bool;

    async fn show_message(&self, message: &str, severity: Severity);
}

/// The hosting pane
pub trait HostPane: Send + Sync {
    fn set_running(&self, running: bool);

    fn report_progress(&self, message: &str, step: u32, total_steps: u32);

    /// Ask the host to re-read enablement flags
    fn refresh_enablement(&self);

    /// Desktop notification
    fn notify(&self, title: &str, message: &str, severity: Severity);

    /// Open a file with the system viewer
    fn open_file(&self, path: &Path);
}
