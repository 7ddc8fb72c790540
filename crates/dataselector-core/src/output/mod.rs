//! Output formats, destination negotiation and export

pub mod export;
pub mod format;
pub mod negotiate;

pub use export::{ExportPlan, Exporter};
pub use format::{OutputFormat, OutputKind};
pub use negotiate::{derive_split_paths, validate_output_path, OutputNegotiator, OutputPaths, OutputTarget};
