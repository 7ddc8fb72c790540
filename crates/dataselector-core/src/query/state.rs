//! Query state and derived enablement
//!
//! `QueryState` is an immutable snapshot: every edit produces a new value
//! through [`QueryState::apply`]. The pane derives button enablement from a
//! snapshot with the pure [`derive_enablement`] function.

use crate::output::OutputFormat;

/// The user's current query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryState {
    pub columns: String,
    pub where_clause: String,
    pub group_by: String,
    pub order_by: String,
    pub selected_table: Option<String>,
    pub selected_output_format: Option<OutputFormat>,
    pub saved_query_name: Option<String>,
}

/// A single user edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryEdit {
    Columns(String),
    Where(String),
    GroupBy(String),
    OrderBy(String),
    Table(Option<String>),
    OutputFormat(Option<OutputFormat>),
}

/// What the pane is currently busy with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingState {
    #[default]
    Idle,
    RefreshingTables,
    Verifying,
    Saving,
    Loading,
    Running,
}

impl ProcessingState {
    pub fn is_idle(&self) -> bool {
        matches!(self, ProcessingState::Idle)
    }
}

/// Which pane actions are currently available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnablementFlags {
    pub clear: bool,
    pub save: bool,
    pub load: bool,
    pub refresh: bool,
    pub verify: bool,
    pub run: bool,
}

/// True when `text` begins with `from ` (any case), i.e. the where box holds
/// a full FROM clause instead of a predicate.
pub fn starts_with_from(text: &str) -> bool {
    text.trim_start()
        .get(..5)
        .map_or(false, |prefix| prefix.eq_ignore_ascii_case("from "))
}

/// `\r\n` and lone `\r` become `\n`, so a state only ever holds LF breaks
fn normalize_line_breaks(text: String) -> String {
    if text.contains('\r') {
        text.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        text
    }
}

impl QueryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the state with `edit` applied. Text edits have their line
    /// breaks normalized to `\n`.
    pub fn apply(&self, edit: QueryEdit) -> Self {
        let mut next = self.clone();
        match edit {
            QueryEdit::Columns(text) => next.columns = normalize_line_breaks(text),
            QueryEdit::Where(text) => next.where_clause = normalize_line_breaks(text),
            QueryEdit::GroupBy(text) => next.group_by = normalize_line_breaks(text),
            QueryEdit::OrderBy(text) => next.order_by = normalize_line_breaks(text),
            QueryEdit::Table(table) => {
                next.selected_table = table.filter(|t| !t.trim().is_empty())
            }
            QueryEdit::OutputFormat(format) => next.selected_output_format = format,
        }
        next
    }

    /// Empty text fields and no table, keeping the chosen output format
    pub fn cleared(&self) -> Self {
        Self {
            selected_output_format: self.selected_output_format,
            ..Self::default()
        }
    }

    pub fn has_text(&self) -> bool {
        [&self.columns, &self.where_clause, &self.group_by, &self.order_by]
            .iter()
            .any(|text| !text.trim().is_empty())
    }

    /// A source is named either by the table list or by a `from ...` where text
    pub fn has_source(&self) -> bool {
        self.selected_table.is_some() || starts_with_from(&self.where_clause)
    }

    /// Columns, a source and an output format are all present
    pub fn is_runnable(&self) -> bool {
        !self.columns.trim().is_empty()
            && self.has_source()
            && self.selected_output_format.is_some()
    }
}

/// Derive enablement flags; everything is disabled while a process runs.
pub fn derive_enablement(
    state: &QueryState,
    tables_loaded: bool,
    processing: ProcessingState,
) -> EnablementFlags {
    if !processing.is_idle() {
        return EnablementFlags::default();
    }

    let verify = tables_loaded && state.has_source() && !state.columns.trim().is_empty();

    EnablementFlags {
        clear: state.selected_table.is_some() || state.has_text(),
        save: state.has_text(),
        load: true,
        refresh: true,
        verify,
        run: verify && state.selected_output_format.is_some(),
    }
}
