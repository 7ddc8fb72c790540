//! Query session
//!
//! Pane-scoped owner of the query state, the table catalog, the processing
//! flag and the standing message. Every action is gated by the enablement
//! flags; one action runs at a time.

use std::path::PathBuf;
use std::sync::Arc;

use dataselector_configs::DataSelectorConfig;

use crate::catalog::{fetch_table_names, TableCatalog};
use crate::error::{DataSelectorError, Result};
use crate::output::OutputFormat;
use crate::pipeline::{PipelineServices, RunReport, RunStatus, SelectionPipeline};
use crate::query::{
    derive_enablement, read_query_file, resolve_query_path, write_query_file, EnablementFlags,
    ProcessingState, QueryEdit, QueryState,
};
use crate::services::{PathFilter, PathRequest, Severity, SqlProbe};
use crate::verify::{SqlVerifier, VerifyOutcome};

/// Message shown under the query boxes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneMessage {
    pub text: String,
    pub severity: Severity,
}

impl PaneMessage {
    fn new(text: impl Into<String>, severity: Severity) -> Self {
        Self {
            text: text.into(),
            severity,
        }
    }
}

pub struct QuerySession {
    config: Arc<DataSelectorConfig>,
    services: PipelineServices,
    verifier: SqlVerifier,
    pipeline: SelectionPipeline,
    state: QueryState,
    catalog: TableCatalog,
    processing: ProcessingState,
    message: Option<PaneMessage>,
}

impl QuerySession {
    pub fn new(
        config: Arc<DataSelectorConfig>,
        services: PipelineServices,
        probe: Arc<dyn SqlProbe>,
    ) -> Self {
        let verifier = SqlVerifier::new(
            probe,
            config.database.schema.clone(),
            config.database.probe_timeout(),
        );
        let pipeline = SelectionPipeline::new(Arc::clone(&config), services.clone());
        let state = QueryState::new().apply(QueryEdit::OutputFormat(
            config
                .output
                .default_format
                .as_deref()
                .and_then(OutputFormat::from_label),
        ));

        Self {
            config,
            services,
            verifier,
            pipeline,
            state,
            catalog: TableCatalog::NotLoaded,
            processing: ProcessingState::Idle,
            message: None,
        }
    }

    /// Override the OS-reported user name used for result objects
    pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
        self.pipeline = self.pipeline.with_user_name(user_name);
        self
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn catalog(&self) -> &TableCatalog {
        &self.catalog
    }

    pub fn processing(&self) -> ProcessingState {
        self.processing
    }

    pub fn message(&self) -> Option<&PaneMessage> {
        self.message.as_ref()
    }

    pub fn pipeline(&self) -> &SelectionPipeline {
        &self.pipeline
    }

    pub fn enablement(&self) -> EnablementFlags {
        derive_enablement(&self.state, self.catalog.is_loaded(), self.processing)
    }

    fn set_processing(&mut self, processing: ProcessingState) {
        self.processing = processing;
        self.services.host.refresh_enablement();
    }

    fn set_message(&mut self, text: impl Into<String>, severity: Severity) {
        self.message = Some(PaneMessage::new(text, severity));
    }

    fn ensure_idle(&self, action: &str) -> Result<()> {
        if self.processing.is_idle() {
            Ok(())
        } else {
            Err(DataSelectorError::InvalidInput(format!(
                "Cannot {} while another process is running",
                action
            )))
        }
    }

    fn query_file_filter(&self) -> PathFilter {
        PathFilter {
            description: "Query files".to_string(),
            extension: Some(self.config.query.file_extension.clone()),
        }
    }

    /// Apply a user edit; clears the standing message
    pub fn edit(&mut self, edit: QueryEdit) -> EnablementFlags {
        self.state = self.state.apply(edit);
        self.message = None;
        self.services.host.refresh_enablement();
        self.enablement()
    }

    /// Empty the query boxes and deselect the table
    pub fn clear(&mut self) -> EnablementFlags {
        if self.enablement().clear {
            self.state = self.state.cleared();
            self.message = None;
            self.services.host.refresh_enablement();
        }
        self.enablement()
    }

    /// Reload the table list from the server
    pub async fn refresh_tables(&mut self) -> Result<()> {
        self.ensure_idle("refresh the table list")?;
        self.set_processing(ProcessingState::RefreshingTables);
        self.catalog = TableCatalog::Loading;

        let result = fetch_table_names(self.services.db.as_ref(), &self.config.database).await;

        let outcome = match result {
            Ok(tables) => {
                if let Some(table) = self.state.selected_table.clone() {
                    if !tables.iter().any(|t| t.eq_ignore_ascii_case(&table)) {
                        log::info!("Selected table {} is no longer listed", table);
                        self.state = self.state.apply(QueryEdit::Table(None));
                        self.message = None;
                    }
                }
                self.catalog = TableCatalog::Loaded(tables);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to load table list: {}", e);
                self.catalog = TableCatalog::NotLoaded;
                self.set_message(format!("Could not load the table list: {}", e), Severity::Error);
                Err(e)
            }
        };

        self.set_processing(ProcessingState::Idle);
        outcome
    }

    /// Check the query against the server without running it
    pub async fn verify(&mut self) -> Result<VerifyOutcome> {
        if !self.enablement().verify {
            return Err(DataSelectorError::InvalidInput(
                "Enter columns and a table or FROM clause before verifying".to_string(),
            ));
        }
        self.set_processing(ProcessingState::Verifying);

        let result = self.verifier.verify(&self.state).await;
        match &result {
            Ok(VerifyOutcome::Valid) => self.set_message("SQL is valid.", Severity::Success),
            Ok(VerifyOutcome::Invalid(error)) => {
                self.set_message(format!("SQL is invalid: {}", error), Severity::Warning)
            }
            Err(e) => self.set_message(format!("Could not verify SQL: {}", e), Severity::Error),
        }

        self.set_processing(ProcessingState::Idle);
        result
    }

    /// Save the query to a file the user picks. `Ok(None)` when the user
    /// cancels, declines to overwrite, or the path is rejected.
    pub async fn save_query(&mut self) -> Result<Option<PathBuf>> {
        if !self.enablement().save {
            return Err(DataSelectorError::InvalidInput(
                "There is nothing to save".to_string(),
            ));
        }
        self.set_processing(ProcessingState::Saving);
        let result = self.save_query_inner().await;
        self.set_processing(ProcessingState::Idle);
        result
    }

    async fn save_query_inner(&mut self) -> Result<Option<PathBuf>> {
        let prompter = Arc::clone(&self.services.prompter);
        let request = PathRequest {
            title: "Save query".to_string(),
            filter: self.query_file_filter(),
            initial_dir: PathBuf::from(&self.config.query.default_dir),
            for_save: true,
        };

        let Some(chosen) = prompter.ask_path(&request).await else {
            return Ok(None);
        };

        let path = match resolve_query_path(&chosen, &self.config.query.file_extension) {
            Ok(path) => path,
            Err(e) => {
                self.set_message(e.to_string(), Severity::Warning);
                return Ok(None);
            }
        };

        if path.exists() {
            let question = format!("{} already exists. Overwrite?", path.display());
            if !prompter.ask_yes_no(&question).await {
                return Ok(None);
            }
        }

        if let Err(e) = write_query_file(&path, &self.state) {
            self.set_message(e.to_string(), Severity::Error);
            return Err(e);
        }

        self.state.saved_query_name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned());
        self.set_message(format!("Query saved to {}", path.display()), Severity::Info);
        Ok(Some(path))
    }

    /// Replace the query with one loaded from a file the user picks
    pub async fn load_query(&mut self) -> Result<Option<PathBuf>> {
        self.ensure_idle("load a query")?;
        self.set_processing(ProcessingState::Loading);
        let result = self.load_query_inner().await;
        self.set_processing(ProcessingState::Idle);
        result
    }

    async fn load_query_inner(&mut self) -> Result<Option<PathBuf>> {
        let prompter = Arc::clone(&self.services.prompter);
        let request = PathRequest {
            title: "Load query".to_string(),
            filter: self.query_file_filter(),
            initial_dir: PathBuf::from(&self.config.query.default_dir),
            for_save: false,
        };

        let Some(path) = prompter.ask_path(&request).await else {
            return Ok(None);
        };

        let extension = &self.config.query.file_extension;
        let has_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case(extension));
        if !has_extension {
            self.set_message(
                format!("Query files must have the .{} extension", extension),
                Severity::Warning,
            );
            return Ok(None);
        }
        if !path.exists() {
            self.set_message(format!("{} does not exist", path.display()), Severity::Warning);
            return Ok(None);
        }

        match read_query_file(&path) {
            Ok(state) => {
                if let (Some(table), true) = (&state.selected_table, self.catalog.is_loaded()) {
                    if !self.catalog.contains(table) {
                        log::warn!("Loaded query names table {} which is not listed", table);
                    }
                }
                self.state = state;
                self.set_message(format!("Query loaded from {}", path.display()), Severity::Info);
                Ok(Some(path))
            }
            Err(e) => {
                self.set_message(e.to_string(), Severity::Error);
                Err(e)
            }
        }
    }

    /// Run the selection pipeline on the current query
    pub async fn run(&mut self) -> RunReport {
        if !self.processing.is_idle() {
            return RunReport::rejected("Another process is already running.");
        }
        if !self.enablement().run {
            let report = RunReport::rejected(
                "Load the table list and enter columns, a source and an output format before running.",
            );
            log::info!("Run refused: {}", report.message);
            self.set_message(report.message.clone(), Severity::Warning);
            return report;
        }
        self.set_processing(ProcessingState::Running);

        let report = self.pipeline.run_query(&self.state).await;

        let severity = report.severity();
        let text = match report.status {
            RunStatus::Rejected | RunStatus::Error | RunStatus::Cancelled => report.message.clone(),
            _ => report.status.to_string(),
        };
        self.set_processing(ProcessingState::Idle);
        self.set_message(text, severity);
        report
    }
}
