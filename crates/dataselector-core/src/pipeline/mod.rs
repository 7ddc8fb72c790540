//! Selection pipeline: run orchestration, run log, user token and reporting

pub mod orchestrator;
pub mod run_log;
pub mod status;
pub mod user_token;

pub use orchestrator::{PipelineServices, SelectionPipeline, NOTIFICATION_TITLE};
pub use run_log::RunLog;
pub use status::{PipelineStage, RunReport, RunStatus};
pub use user_token::{os_user_name, UserToken};
