#![allow(dead_code, unused_imports)]
//! Scripted collaborators shared by the integration tests

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use dataselector_configs::DataSelectorConfig;
use dataselector_core::pipeline::PipelineServices;
use dataselector_core::services::{
    DatabaseClient, HostPane, MapService, PathRequest, Prompter, Severity, SqlProbe,
};
use dataselector_core::{DataSelectorError, Result};

pub use tempfile::TempDir;

pub const CONNECTION_FILE: &str = "/gis/nbn.sde";
pub const USER: &str = "jbloggs";

/// Config with the run log under `log_dir`
pub fn test_config(log_dir: &Path) -> DataSelectorConfig {
    let mut config = DataSelectorConfig::default();
    config.database.connection_file = CONNECTION_FILE.to_string();
    config.database.schema = "dbo".to_string();
    config.run_log.dir = log_dir.to_string_lossy().into_owned();
    config.output.default_dir = "/out".to_string();
    config.query.default_dir = log_dir.to_string_lossy().into_owned();
    config
}

/// Source path the exporter reads a server object from
pub fn source(object: &str) -> PathBuf {
    Path::new(CONNECTION_FILE).join(object)
}

/// Database whose result objects appear once the Select command runs
#[derive(Default)]
pub struct FakeDb {
    pub tables: Vec<String>,
    pub columns: HashMap<String, Vec<String>>,
    /// Objects (with row counts) created by a successful Select
    pub created: HashMap<String, u64>,
    pub fail_select: Option<String>,
    pub fail_clear: Option<String>,
    pub commands: Mutex<Vec<String>>,
    selected: Mutex<bool>,
}

impl FakeDb {
    pub fn with_tables(tables: &[&str]) -> Self {
        Self {
            tables: tables.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn columns(mut self, table: &str, columns: &[&str]) -> Self {
        self.columns.insert(
            table.to_string(),
            columns.iter().map(|c| c.to_string()).collect(),
        );
        self
    }

    pub fn creates(mut self, object: &str, rows: u64) -> Self {
        self.created.insert(object.to_string(), rows);
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().clone()
    }

    pub fn clear_calls(&self) -> usize {
        self.commands
            .lock()
            .iter()
            .filter(|c| c.starts_with("EXECUTE Selector_Clear"))
            .count()
    }

    pub fn select_calls(&self) -> usize {
        self.commands
            .lock()
            .iter()
            .filter(|c| c.starts_with("EXECUTE Selector_Select"))
            .count()
    }
}

#[async_trait]
impl DatabaseClient for FakeDb {
    async fn list_table_names(&self, _objects_table: &str) -> Result<Vec<String>> {
        Ok(self.tables.clone())
    }

    async fn list_column_names(&self, table: &str) -> Result<Vec<String>> {
        self.columns
            .get(table)
            .cloned()
            .ok_or_else(|| DataSelectorError::database(format!("Invalid object name '{}'", table)))
    }

    async fn row_count(&self, object: &str) -> Result<u64> {
        self.created
            .get(object)
            .copied()
            .ok_or_else(|| DataSelectorError::database(format!("Invalid object name '{}'", object)))
    }

    async fn object_exists(&self, name: &str) -> Result<bool> {
        Ok(*self.selected.lock() && self.created.contains_key(name))
    }

    async fn execute_command(&self, text: &str) -> Result<()> {
        self.commands.lock().push(text.to_string());
        if text.starts_with("EXECUTE Selector_Select") {
            if let Some(message) = &self.fail_select {
                return Err(DataSelectorError::database(message.clone()));
            }
            *self.selected.lock() = true;
        } else if let Some(message) = &self.fail_clear {
            return Err(DataSelectorError::database(message.clone()));
        }
        Ok(())
    }
}

/// Map service recording every call as one line of text
#[derive(Default)]
pub struct FakeMaps {
    pub active_map: Mutex<Option<String>>,
    pub existing: Mutex<HashSet<PathBuf>>,
    pub fail_add: bool,
    pub fail_export: bool,
    pub calls: Mutex<Vec<String>>,
}

impl FakeMaps {
    pub fn with_active_map(name: &str) -> Self {
        Self {
            active_map: Mutex::new(Some(name.to_string())),
            ..Default::default()
        }
    }

    pub fn existing(self, path: impl Into<PathBuf>) -> Self {
        self.existing.lock().insert(path.into());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }

    fn export_result(&self) -> Result<()> {
        if self.fail_export {
            Err(DataSelectorError::map("The table was not found"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MapService for FakeMaps {
    async fn active_map_name(&self) -> Result<Option<String>> {
        Ok(self.active_map.lock().clone())
    }

    async fn create_map(&self, name: &str) -> Result<()> {
        self.record(format!("create_map {}", name));
        *self.active_map.lock() = Some(name.to_string());
        Ok(())
    }

    async fn add_layer_to_map(&self, path: &Path) -> Result<()> {
        self.record(format!("add_layer {}", path.display()));
        if self.fail_add {
            return Err(DataSelectorError::map("Map is read-only"));
        }
        Ok(())
    }

    async fn add_table_to_map(&self, path: &Path) -> Result<()> {
        self.record(format!("add_table {}", path.display()));
        if self.fail_add {
            return Err(DataSelectorError::map("Map is read-only"));
        }
        Ok(())
    }

    async fn copy_features(&self, source: &Path, destination: &Path, suppress_auto_add: bool) -> Result<()> {
        self.record(format!(
            "copy_features {} -> {} suppress={}",
            source.display(),
            destination.display(),
            suppress_auto_add
        ));
        self.export_result()
    }

    async fn copy_table(&self, source: &Path, destination: &Path, add_to_map: bool) -> Result<()> {
        self.record(format!(
            "copy_table {} -> {} add={}",
            source.display(),
            destination.display(),
            add_to_map
        ));
        self.export_result()
    }

    async fn export_features(&self, source: &Path, destination: &Path, add_to_map: bool) -> Result<()> {
        self.record(format!(
            "export_features {} -> {} add={}",
            source.display(),
            destination.display(),
            add_to_map
        ));
        self.export_result()
    }

    async fn delimited_copy(&self, source: &Path, destination: &Path, is_csv: bool, append: bool) -> Result<()> {
        self.record(format!(
            "delimited_copy {} -> {} csv={} append={}",
            source.display(),
            destination.display(),
            is_csv,
            append
        ));
        self.export_result()
    }

    async fn dataset_exists(&self, path: &Path) -> Result<bool> {
        Ok(self.existing.lock().contains(path))
    }
}

/// Prompter answering from queues; an exhausted path queue cancels
#[derive(Default)]
pub struct ScriptedPrompter {
    pub paths: Mutex<VecDeque<Option<PathBuf>>>,
    pub answers: Mutex<VecDeque<bool>>,
    pub requests: Mutex<Vec<PathRequest>>,
    pub questions: Mutex<Vec<String>>,
    pub messages: Mutex<Vec<(String, Severity)>>,
}

impl ScriptedPrompter {
    pub fn answering_paths(paths: &[&str]) -> Self {
        let prompter = Self::default();
        for path in paths {
            prompter.paths.lock().push_back(Some(PathBuf::from(path)));
        }
        prompter
    }

    pub fn then_yes_no(self, answers: &[bool]) -> Self {
        self.answers.lock().extend(answers.iter().copied());
        self
    }

    pub fn messages(&self) -> Vec<(String, Severity)> {
        self.messages.lock().clone()
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().clone()
    }

    pub fn path_prompts(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn ask_path(&self, request: &PathRequest) -> Option<PathBuf> {
        self.requests.lock().push(request.clone());
        self.paths.lock().pop_front().flatten()
    }

    async fn ask_yes_no(&self, question: &str) -> bool {
        self.questions.lock().push(question.to_string());
        self.answers.lock().pop_front().unwrap_or(false)
    }

    async fn show_message(&self, message: &str, severity: Severity) {
        self.messages.lock().push((message.to_string(), severity));
    }
}

/// Pane recording what the core told it
#[derive(Default)]
pub struct RecordingHost {
    pub running: Mutex<Vec<bool>>,
    pub progress: Mutex<Vec<(String, u32, u32)>>,
    pub notifications: Mutex<Vec<(String, String, Severity)>>,
    pub opened: Mutex<Vec<PathBuf>>,
    pub refreshes: Mutex<usize>,
}

impl RecordingHost {
    pub fn is_running(&self) -> bool {
        self.running.lock().last().copied().unwrap_or(false)
    }

    pub fn notifications(&self) -> Vec<(String, String, Severity)> {
        self.notifications.lock().clone()
    }

    pub fn opened(&self) -> Vec<PathBuf> {
        self.opened.lock().clone()
    }
}

impl HostPane for RecordingHost {
    fn set_running(&self, running: bool) {
        self.running.lock().push(running);
    }

    fn report_progress(&self, message: &str, step: u32, total_steps: u32) {
        self.progress
            .lock()
            .push((message.to_string(), step, total_steps));
    }

    fn refresh_enablement(&self) {
        *self.refreshes.lock() += 1;
    }

    fn notify(&self, title: &str, message: &str, severity: Severity) {
        self.notifications
            .lock()
            .push((title.to_string(), message.to_string(), severity));
    }

    fn open_file(&self, path: &Path) {
        self.opened.lock().push(path.to_path_buf());
    }
}

/// Probe that accepts every statement and records it
#[derive(Default)]
pub struct RecordingProbe {
    pub statements: Mutex<Vec<String>>,
    pub reject_with: Option<String>,
}

#[async_trait]
impl SqlProbe for RecordingProbe {
    async fn execute(&self, sql: &str) -> Result<()> {
        self.statements.lock().push(sql.to_string());
        match &self.reject_with {
            Some(message) => Err(DataSelectorError::Sql(message.clone())),
            None => Ok(()),
        }
    }
}

/// Handles to every fake, plus the services bundle built from them
pub struct Harness {
    pub db: Arc<FakeDb>,
    pub maps: Arc<FakeMaps>,
    pub prompter: Arc<ScriptedPrompter>,
    pub host: Arc<RecordingHost>,
}

impl Harness {
    pub fn new(db: FakeDb, maps: FakeMaps, prompter: ScriptedPrompter) -> Self {
        Self {
            db: Arc::new(db),
            maps: Arc::new(maps),
            prompter: Arc::new(prompter),
            host: Arc::new(RecordingHost::default()),
        }
    }

    pub fn services(&self) -> PipelineServices {
        PipelineServices {
            db: self.db.clone(),
            maps: self.maps.clone(),
            prompter: self.prompter.clone(),
            host: self.host.clone(),
        }
    }
}
