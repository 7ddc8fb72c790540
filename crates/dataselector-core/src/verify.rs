//! SQL verification
//!
//! Compiles the user's query on the server inside a `SET NOEXEC` bracket, so
//! syntax and name errors come back without any data being read or changed.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{DataSelectorError, Result};
use crate::query::sql::{build_select, probe_statement, strip_probe_markers};
use crate::query::QueryState;
use crate::services::SqlProbe;

/// Result of verifying a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    Valid,
    /// The server rejected the statement; message without probe markers
    Invalid(String),
}

impl VerifyOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerifyOutcome::Valid)
    }
}

pub struct SqlVerifier {
    probe: Arc<dyn SqlProbe>,
    schema: String,
    timeout: Duration,
}

impl SqlVerifier {
    pub fn new(probe: Arc<dyn SqlProbe>, schema: impl Into<String>, timeout: Duration) -> Self {
        Self {
            probe,
            schema: schema.into(),
            timeout,
        }
    }

    /// Probe text for `state`
    pub fn probe_text(&self, state: &QueryState) -> String {
        let select = build_select(
            &self.schema,
            state.selected_table.as_deref(),
            &state.columns,
            &state.where_clause,
            &state.group_by,
            &state.order_by,
        );
        probe_statement(&select)
    }

    /// Verify `state` against the live database.
    ///
    /// Server rejections are `Ok(VerifyOutcome::Invalid)`; connection failures
    /// and timeouts are errors.
    pub async fn verify(&self, state: &QueryState) -> Result<VerifyOutcome> {
        let sql = self.probe_text(state);
        log::debug!("Verifying query: {}", sql);

        match tokio::time::timeout(self.timeout, self.probe.execute(&sql)).await {
            Err(_) => {
                log::warn!("SQL verification timed out after {:?}", self.timeout);
                Err(DataSelectorError::Timeout(self.timeout))
            }
            Ok(Ok(())) => Ok(VerifyOutcome::Valid),
            Ok(Err(DataSelectorError::Sql(message))) => {
                let message = strip_probe_markers(&message);
                log::info!("SQL verification failed: {}", message);
                Ok(VerifyOutcome::Invalid(message))
            }
            Ok(Err(e)) => {
                log::error!("SQL verification could not reach the server: {}", e);
                Err(e)
            }
        }
    }
}
