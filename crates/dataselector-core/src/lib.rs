//! # dataselector-core
//!
//! Query building and server-side selection for the DataSelector pane.
//!
//! The pane lets a user compose a SELECT against a spatial SQL database, check
//! it, save or load it, and run it. Running hands the work to two stored
//! procedures on the server, then copies the result objects into a
//! geodatabase, shapefile or delimited text file and adds them to a map.
//!
//! ## Architecture
//!
//! - **[`QuerySession`]**: pane-scoped state, enablement and user actions
//! - **[`SelectionPipeline`]**: the run, from validation to clean-up
//! - **[`protocol`]**: Select/Clear procedure commands and the Clear obligation
//! - **[`output`]**: format resolution, destination negotiation and export
//! - **[`query`]**: query state, saved query files and SQL text
//! - **[`services`]**: traits the host implements (database, map, prompts, pane)
//!
//! ### Run Lifecycle
//! ```text
//! Idle → Validating → ResolvingOutput → Selecting → Counting
//!      → Exporting → MapUpdating → Reporting → Idle
//!               ↓ (cancel)      ↓ (error)
//!            Reporting ← ─ ─ ─ ─ ┘   Clear always runs after Select
//! ```
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use dataselector_core::{PipelineServices, QueryEdit, QuerySession};
//!
//! let mut session = QuerySession::new(config, services, probe);
//! session.refresh_tables().await?;
//! session.edit(QueryEdit::Columns("TaxonName, Shape".into()));
//! session.edit(QueryEdit::Table(Some("Species".into())));
//! let report = session.run().await;
//! ```

pub mod catalog;
pub mod error;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod protocol;
pub mod query;
pub mod services;
pub mod session;
pub mod table_filter;
pub mod verify;

// Re-export commonly used types
pub use catalog::{fetch_table_names, TableCatalog};
pub use error::{DataSelectorError, Result};
pub use logging::init_logging;
pub use output::{OutputFormat, OutputKind, OutputPaths, OutputTarget};
pub use pipeline::{PipelineServices, RunReport, RunStatus, SelectionPipeline};
pub use protocol::{ResultObjects, SelectionCounts, SelectionProtocol};
pub use query::{EnablementFlags, ProcessingState, QueryEdit, QueryState};
pub use services::{DatabaseClient, HostPane, MapService, PathRequest, Prompter, Severity, SqlProbe};
pub use session::{PaneMessage, QuerySession};
pub use verify::{SqlVerifier, VerifyOutcome};
