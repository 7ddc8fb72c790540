pub mod defaults;
pub mod loader;
pub mod types;

pub use loader::expand_path;
pub use types::*;
