//! dataselector-configs
//!
//! Pane configuration types and loader for DataSelector.

pub mod config;

pub use config::*;
pub use config::defaults;
