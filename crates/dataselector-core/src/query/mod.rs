//! Query construction: state, enablement, saved files and SQL text

pub mod persistence;
pub mod sql;
pub mod state;

pub use persistence::{parse_query, read_query_file, resolve_query_path, serialize_query, write_query_file};
pub use state::{derive_enablement, starts_with_from, EnablementFlags, ProcessingState, QueryEdit, QueryState};
