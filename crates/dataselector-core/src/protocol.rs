//! Server selection protocol
//!
//! Two stored procedures do the server-side work:
//!
//! ```text
//! Select(schema, table, columns, where, groupBy, orderBy, userID, isSplit)
//!   isSplit = 1 → <schema>.<table>_point_<userID>, <schema>.<table>_poly_<userID>
//!   isSplit = 0 → <schema>.<table>_<userID>
//! Clear(schema, table, userID)
//!   drops whichever of those objects exist
//! ```
//!
//! Both are sent as raw text commands with every value inlined as a quoted
//! literal. Once Select has been attempted, Clear is owed: [`SelectionAttempt`]
//! carries that obligation until [`SelectionAttempt::finish`] runs it.

use dataselector_configs::ProcedureSettings;

use crate::error::Result;
use crate::query::sql::{collapse_line_breaks, quote_literal};
use crate::services::DatabaseClient;

/// Names of the result objects the Select procedure creates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultObjects {
    pub point: String,
    pub poly: String,
    pub table: String,
}

impl ResultObjects {
    pub fn new(schema: &str, table: &str, user_token: &str) -> Self {
        Self {
            point: format!("{}.{}_point_{}", schema, table, user_token),
            poly: format!("{}.{}_poly_{}", schema, table, user_token),
            table: format!("{}.{}_{}", schema, table, user_token),
        }
    }
}

/// Row counts of the result objects found after Select
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionCounts {
    pub point_count: u64,
    pub poly_count: u64,
    pub table_count: u64,
}

impl SelectionCounts {
    pub fn total(&self) -> u64 {
        self.point_count + self.poly_count + self.table_count
    }
}

/// Arguments of one Select call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectRequest {
    pub table: String,
    pub columns: String,
    pub where_clause: String,
    pub group_by: String,
    pub order_by: String,
    pub user_token: String,
    pub split: bool,
}

/// Builds and issues the Select/Clear commands
#[derive(Debug, Clone)]
pub struct SelectionProtocol {
    schema: String,
    procedures: ProcedureSettings,
}

impl SelectionProtocol {
    pub fn new(schema: impl Into<String>, procedures: ProcedureSettings) -> Self {
        Self {
            schema: schema.into(),
            procedures,
        }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn result_objects(&self, table: &str, user_token: &str) -> ResultObjects {
        ResultObjects::new(&self.schema, table, user_token)
    }

    /// Select command text; clause line breaks collapse to spaces
    pub fn select_command(&self, request: &SelectRequest) -> String {
        let args = [
            quote_literal(&self.schema),
            quote_literal(&request.table),
            quote_literal(&collapse_line_breaks(&request.columns)),
            quote_literal(&collapse_line_breaks(&request.where_clause)),
            quote_literal(&collapse_line_breaks(&request.group_by)),
            quote_literal(&collapse_line_breaks(&request.order_by)),
            quote_literal(&request.user_token),
            quote_literal(if request.split { "1" } else { "0" }),
        ];
        format!("EXECUTE {} {}", self.procedures.select, args.join(", "))
    }

    pub fn clear_command(&self, table: &str, user_token: &str) -> String {
        let args = [
            quote_literal(&self.schema),
            quote_literal(table),
            quote_literal(user_token),
        ];
        format!("EXECUTE {} {}", self.procedures.clear, args.join(", "))
    }

    /// Take on the Clear obligation for `request` before issuing Select
    pub fn begin<'a>(
        &self,
        db: &'a dyn DatabaseClient,
        request: &SelectRequest,
    ) -> SelectionAttempt<'a> {
        SelectionAttempt {
            db,
            select_command: self.select_command(request),
            clear_command: self.clear_command(&request.table, &request.user_token),
            finished: false,
        }
    }
}

/// A started selection that owes one Clear call
#[must_use = "a selection attempt must be finished so the server objects are cleared"]
pub struct SelectionAttempt<'a> {
    db: &'a dyn DatabaseClient,
    select_command: String,
    clear_command: String,
    finished: bool,
}

impl SelectionAttempt<'_> {
    /// Issue the Select procedure
    pub async fn select(&self) -> Result<()> {
        log::debug!("Executing: {}", self.select_command);
        self.db.execute_command(&self.select_command).await
    }

    /// Issue the Clear procedure, releasing the obligation
    pub async fn finish(mut self) -> Result<()> {
        self.finished = true;
        log::debug!("Executing: {}", self.clear_command);
        self.db.execute_command(&self.clear_command).await
    }
}

impl Drop for SelectionAttempt<'_> {
    fn drop(&mut self) {
        if !self.finished {
            log::error!(
                "Selection attempt dropped without clearing; server objects may remain ({})",
                self.clear_command
            );
        }
    }
}
