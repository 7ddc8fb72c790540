//! Pipeline stages and run outcomes

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::output::OutputKind;
use crate::protocol::SelectionCounts;
use crate::services::Severity;

/// Stages of a selection run, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Validating,
    ResolvingOutput,
    Selecting,
    Counting,
    Exporting,
    MapUpdating,
    Reporting,
}

impl PipelineStage {
    pub const TOTAL_STEPS: u32 = 7;

    /// 1-based step number for progress reporting
    pub fn step(&self) -> u32 {
        match self {
            PipelineStage::Validating => 1,
            PipelineStage::ResolvingOutput => 2,
            PipelineStage::Selecting => 3,
            PipelineStage::Counting => 4,
            PipelineStage::Exporting => 5,
            PipelineStage::MapUpdating => 6,
            PipelineStage::Reporting => 7,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PipelineStage::Validating => "Validating query ...",
            PipelineStage::ResolvingOutput => "Choosing output ...",
            PipelineStage::Selecting => "Executing selection on the server ...",
            PipelineStage::Counting => "Counting results ...",
            PipelineStage::Exporting => "Exporting results ...",
            PipelineStage::MapUpdating => "Updating map ...",
            PipelineStage::Reporting => "Finishing ...",
        }
    }
}

/// Final status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    SuccessWithWarnings,
    /// Completed without error but nothing matched
    NoOutput,
    /// The user declined to choose an output
    Cancelled,
    /// Query or preconditions rejected before any server work
    Rejected,
    Error,
}

impl RunStatus {
    pub fn severity(&self) -> Severity {
        match self {
            RunStatus::Success => Severity::Success,
            RunStatus::SuccessWithWarnings | RunStatus::Rejected => Severity::Warning,
            RunStatus::NoOutput | RunStatus::Cancelled => Severity::Info,
            RunStatus::Error => Severity::Error,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, RunStatus::Error)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RunStatus::Success => "Process complete!",
            RunStatus::SuccessWithWarnings => "Process complete with warnings!",
            RunStatus::NoOutput => "Process complete! No records found.",
            RunStatus::Cancelled => "Process cancelled.",
            RunStatus::Rejected => "Process not started.",
            RunStatus::Error => "Process ended with errors!",
        };
        f.write_str(text)
    }
}

/// Everything the pane needs to show after a run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub status: RunStatus,
    /// Human-readable detail (first error, rejection reason, ...)
    pub message: String,
    pub counts: SelectionCounts,
    pub is_spatial: bool,
    pub output_kind: Option<OutputKind>,
    pub outputs: Vec<PathBuf>,
    pub warnings: Vec<String>,
    /// True once the Clear procedure was issued
    pub cleared: bool,
    pub log_path: Option<PathBuf>,
    pub elapsed: Duration,
}

impl RunReport {
    pub(crate) fn new(status: RunStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            counts: SelectionCounts::default(),
            is_spatial: false,
            output_kind: None,
            outputs: Vec::new(),
            warnings: Vec::new(),
            cleared: false,
            log_path: None,
            elapsed: Duration::ZERO,
        }
    }

    /// A run refused before any work started
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(RunStatus::Rejected, message)
    }

    pub fn severity(&self) -> Severity {
        self.status.severity()
    }

    /// Lines of the framed summary block written to the run log
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![self.status.to_string()];
        if !self.message.is_empty() {
            lines.push(self.message.clone());
        }
        if self.is_spatial {
            lines.push(format!(
                "{} point and {} polygon records selected",
                self.counts.point_count, self.counts.poly_count
            ));
        } else if self.counts.table_count > 0 {
            lines.push(format!("{} records selected", self.counts.table_count));
        }
        if let Some(kind) = self.output_kind {
            lines.push(format!("Output format: {}", kind));
        }
        for output in &self.outputs {
            lines.push(format!("Output: {}", output.display()));
        }
        for warning in &self.warnings {
            lines.push(format!("Warning: {}", warning));
        }
        lines.push(format!("Elapsed time: {:.1} s", self.elapsed.as_secs_f64()));
        lines
    }
}
