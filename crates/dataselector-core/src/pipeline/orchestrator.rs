//! Selection pipeline
//!
//! ```text
//! Idle → Validating → ResolvingOutput → Selecting → Counting
//!      → Exporting → MapUpdating → Reporting → Idle
//! ```
//!
//! Any stage may jump straight to Reporting with a failure. Once the Select
//! procedure has been attempted, the Clear procedure runs on every path out of
//! the run. Errors from collaborators never escape `run_query`; they are
//! logged and folded into the returned [`RunReport`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use dataselector_configs::DataSelectorConfig;

use super::run_log::RunLog;
use super::status::{PipelineStage, RunReport, RunStatus};
use super::user_token::{os_user_name, UserToken, FALLBACK_TOKEN};
use crate::error::{DataSelectorError, Result};
use crate::output::{ExportPlan, Exporter, OutputFormat, OutputKind, OutputNegotiator, OutputTarget};
use crate::protocol::{ResultObjects, SelectRequest, SelectionAttempt, SelectionCounts, SelectionProtocol};
use crate::query::sql::table_from_clause;
use crate::query::QueryState;
use crate::services::{DatabaseClient, HostPane, MapService, Prompter, Severity};

/// Title used for desktop notifications
pub const NOTIFICATION_TITLE: &str = "Data Selector";

/// Collaborators the pipeline drives
#[derive(Clone)]
pub struct PipelineServices {
    pub db: Arc<dyn DatabaseClient>,
    pub maps: Arc<dyn MapService>,
    pub prompter: Arc<dyn Prompter>,
    pub host: Arc<dyn HostPane>,
}

/// Mutable state of one run past validation
#[derive(Default)]
struct RunContext {
    counts: SelectionCounts,
    plan: Option<ExportPlan>,
    warnings: Vec<String>,
}

pub struct SelectionPipeline {
    config: Arc<DataSelectorConfig>,
    services: PipelineServices,
    protocol: SelectionProtocol,
    user_name: String,
    counts: SelectionCounts,
}

impl SelectionPipeline {
    pub fn new(config: Arc<DataSelectorConfig>, services: PipelineServices) -> Self {
        let protocol = SelectionProtocol::new(
            config.database.schema.clone(),
            config.procedures.clone(),
        );
        Self {
            config,
            services,
            protocol,
            user_name: os_user_name(),
            counts: SelectionCounts::default(),
        }
    }

    /// Override the OS-reported user name
    pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = user_name.into();
        self
    }

    /// Counts from the latest run
    pub fn counts(&self) -> SelectionCounts {
        self.counts
    }

    fn progress(&self, stage: PipelineStage) {
        self.services
            .host
            .report_progress(stage.description(), stage.step(), PipelineStage::TOTAL_STEPS);
    }

    /// Check the query can run and return its output format
    fn validate(state: &QueryState) -> std::result::Result<OutputFormat, String> {
        if state.columns.trim().is_empty() {
            return Err("Please enter the columns to select.".to_string());
        }
        if !state.has_source() {
            return Err("Please select a table or enter a FROM clause.".to_string());
        }
        state
            .selected_output_format
            .ok_or_else(|| "Please select an output format.".to_string())
    }

    /// Table the result objects are named after
    fn source_table(state: &QueryState) -> Option<String> {
        state
            .selected_table
            .clone()
            .or_else(|| table_from_clause(&state.where_clause))
    }

    /// A result is spatial when a requested column is a geometry column, or
    /// when `*` is requested and the selected table has one.
    pub async fn detect_spatial(&self, state: &QueryState) -> Result<bool> {
        let geometry = &self.config.query.geometry_columns;
        let is_geometry = |column: &str| geometry.iter().any(|g| g.eq_ignore_ascii_case(column));

        let columns: Vec<&str> = state
            .columns
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect();

        if columns.iter().any(|c| is_geometry(*c)) {
            return Ok(true);
        }

        if !columns.contains(&"*") {
            return Ok(false);
        }

        let Some(table) = state.selected_table.as_deref() else {
            return Ok(false);
        };

        let qualified = format!("{}.{}", self.config.database.schema, table);
        let table_columns = self.services.db.list_column_names(&qualified).await?;
        Ok(table_columns.iter().any(|c| is_geometry(c.as_str())))
    }

    /// Run the query end to end. Always returns the pane to idle.
    pub async fn run_query(&mut self, state: &QueryState) -> RunReport {
        let started = Instant::now();
        self.counts = SelectionCounts::default();
        self.progress(PipelineStage::Validating);

        let format = match Self::validate(state) {
            Ok(format) => format,
            Err(message) => {
                log::info!("Run rejected: {}", message);
                self.services
                    .prompter
                    .show_message(&message, Severity::Warning)
                    .await;
                return RunReport::new(RunStatus::Rejected, message);
            }
        };

        let host = Arc::clone(&self.services.host);
        host.set_running(true);

        let user = UserToken::from_user_name(&self.user_name);
        let run_log = RunLog::for_user(&self.config.run_log_dir(), &user.token);

        if let Err(e) = run_log.prepare(self.config.run_log.clear_on_run) {
            log::error!("Run aborted before selection: {}", e);
            self.services
                .prompter
                .show_message(&e.to_string(), Severity::Error)
                .await;
            host.set_running(false);
            host.refresh_enablement();
            let mut report = RunReport::new(RunStatus::Rejected, e.to_string());
            report.log_path = Some(run_log.path().to_path_buf());
            return report;
        }

        run_log.append("Process started");
        let mut ctx = RunContext::default();
        if user.substituted {
            let warning = format!("User name could not be determined; using '{}'", FALLBACK_TOKEN);
            log::warn!("{}", warning);
            run_log.append(&warning);
            ctx.warnings.push(warning);
        }

        let mut report = self.execute(state, format, &user, &run_log, &mut ctx).await;

        self.counts = ctx.counts;
        report.counts = ctx.counts;
        report.warnings.extend(ctx.warnings);
        if let Some(plan) = ctx.plan {
            report.outputs = plan.written;
        }
        if report.status == RunStatus::Success && !report.warnings.is_empty() {
            report.status = RunStatus::SuccessWithWarnings;
        }
        report.elapsed = started.elapsed();
        report.log_path = Some(run_log.path().to_path_buf());

        self.finish(&report, &run_log);
        report
    }

    /// Steps 4 to 10: everything between validation and reporting
    async fn execute(
        &self,
        state: &QueryState,
        format: OutputFormat,
        user: &UserToken,
        run_log: &RunLog,
        ctx: &mut RunContext,
    ) -> RunReport {
        let Some(table) = Self::source_table(state) else {
            let message = "Could not determine the source table from the FROM clause.";
            run_log.append(message);
            return RunReport::new(RunStatus::Error, message);
        };

        let is_spatial = match self.detect_spatial(state).await {
            Ok(is_spatial) => is_spatial,
            Err(e) => {
                let message = format!("Could not read the columns of {}: {}", table, e);
                log::error!("{}", message);
                run_log.append(&message);
                return RunReport::new(RunStatus::Error, message);
            }
        };
        run_log.append(&format!(
            "Selecting from {} ({} result)",
            table,
            if is_spatial { "spatial" } else { "non-spatial" }
        ));

        let kind = format.resolve(is_spatial);
        if kind.label() != format.label() {
            run_log.append(&format!("Output format changed from {} to {}", format, kind));
        }

        self.progress(PipelineStage::ResolvingOutput);
        let target = match self.resolve_output(is_spatial, kind).await {
            Ok(Some(target)) => target,
            Ok(None) => {
                run_log.append("No output selected");
                let mut report = RunReport::new(RunStatus::Cancelled, "No output selected.");
                report.is_spatial = is_spatial;
                report.output_kind = Some(kind);
                return report;
            }
            Err(e) => {
                let message = format!("Could not check the output location: {}", e);
                log::error!("{}", message);
                run_log.append(&message);
                return RunReport::new(RunStatus::Error, message);
            }
        };
        run_log.append(&format!("Output: {} ({})", target.base.display(), kind));

        let map_was_active = match self.services.maps.active_map_name().await {
            Ok(name) => name.is_some(),
            Err(e) => {
                log::warn!("Could not read the active map: {}", e);
                false
            }
        };

        let objects = self.protocol.result_objects(&table, &user.token);
        let request = SelectRequest {
            table,
            columns: state.columns.clone(),
            where_clause: state.where_clause.clone(),
            group_by: state.group_by.clone(),
            order_by: state.order_by.clone(),
            user_token: user.token.clone(),
            split: is_spatial,
        };

        let db = Arc::clone(&self.services.db);
        let attempt = self.protocol.begin(db.as_ref(), &request);
        let outcome = self
            .select_and_export(&attempt, &objects, &target, is_spatial, map_was_active, run_log, ctx)
            .await;

        let clear_result = attempt.finish().await;

        let mut report = match outcome {
            Ok(true) => RunReport::new(RunStatus::Success, ""),
            Ok(false) => {
                run_log.append("No records found");
                RunReport::new(RunStatus::NoOutput, "No records matched the query.")
            }
            Err(e) => {
                log::error!("Selection run failed: {}", e);
                run_log.append(&format!("Error: {}", e));
                RunReport::new(RunStatus::Error, e.to_string())
            }
        };
        report.cleared = true;
        report.is_spatial = is_spatial;
        report.output_kind = Some(kind);

        match clear_result {
            Ok(()) => run_log.append("Temporary server objects cleared"),
            Err(e) => {
                let message = format!("Could not clear temporary server objects: {}", e);
                log::error!("{}", message);
                run_log.append(&message);
                if !report.status.is_failure() {
                    ctx.warnings.push(message);
                }
            }
        }

        report
    }

    async fn resolve_output(&self, is_spatial: bool, kind: OutputKind) -> Result<Option<OutputTarget>> {
        let negotiator = OutputNegotiator::new(
            self.services.prompter.as_ref(),
            self.services.maps.as_ref(),
            PathBuf::from(&self.config.output.default_dir),
        );
        negotiator.resolve_output_target(is_spatial, kind).await
    }

    /// Steps 7 to 9. Returns false when the selection matched nothing.
    #[allow(clippy::too_many_arguments)]
    async fn select_and_export(
        &self,
        attempt: &SelectionAttempt<'_>,
        objects: &ResultObjects,
        target: &OutputTarget,
        is_spatial: bool,
        map_was_active: bool,
        run_log: &RunLog,
        ctx: &mut RunContext,
    ) -> Result<bool> {
        self.progress(PipelineStage::Selecting);
        run_log.append("Executing selection ...");
        attempt.select().await?;

        self.progress(PipelineStage::Counting);
        ctx.counts = self.count_results(objects, is_spatial).await?;
        let counts = ctx.counts;
        if is_spatial {
            run_log.append(&format!(
                "{} point and {} polygon records selected",
                counts.point_count, counts.poly_count
            ));
        } else {
            run_log.append(&format!("{} records selected", counts.table_count));
        }

        if counts.total() == 0 {
            return Ok(false);
        }

        self.progress(PipelineStage::Exporting);
        let exporter = Exporter::new(
            self.services.maps.as_ref(),
            &self.config.database.connection_file,
            &self.config.output.map_name,
        );
        let plan = exporter
            .export(target, objects, counts, is_spatial, map_was_active)
            .await?;
        ctx.warnings.extend(plan.warnings.iter().cloned());
        for path in &plan.written {
            run_log.append(&format!("Exported to {}", path.display()));
        }

        self.progress(PipelineStage::MapUpdating);
        match exporter.update_map(&plan, map_was_active).await {
            Ok(true) => run_log.append("Results added to the map"),
            Ok(false) => {}
            Err(e) => {
                let message = format!("Could not add results to the map: {}", e);
                log::warn!("{}", message);
                run_log.append(&message);
                ctx.warnings.push(message);
            }
        }
        ctx.plan = Some(plan);

        Ok(true)
    }

    /// Count rows in the result objects. Missing objects are an error, which
    /// keeps "nothing was created" apart from "nothing matched".
    async fn count_results(&self, objects: &ResultObjects, is_spatial: bool) -> Result<SelectionCounts> {
        let db = &self.services.db;
        let mut counts = SelectionCounts::default();

        if is_spatial {
            let point_exists = db.object_exists(&objects.point).await?;
            let poly_exists = db.object_exists(&objects.poly).await?;
            if !point_exists && !poly_exists {
                return Err(DataSelectorError::database(format!(
                    "Selection created neither {} nor {}",
                    objects.point, objects.poly
                )));
            }
            if point_exists {
                counts.point_count = db.row_count(&objects.point).await?;
            }
            if poly_exists {
                counts.poly_count = db.row_count(&objects.poly).await?;
            }
        } else {
            if !db.object_exists(&objects.table).await? {
                return Err(DataSelectorError::database(format!(
                    "Selection did not create {}",
                    objects.table
                )));
            }
            counts.table_count = db.row_count(&objects.table).await?;
        }

        log::debug!("Result counts: {:?}", counts);
        Ok(counts)
    }

    /// Step 11 and 12: summary, notification, log, back to idle
    fn finish(&self, report: &RunReport, run_log: &RunLog) {
        let host = &self.services.host;
        self.progress(PipelineStage::Reporting);

        run_log.append_summary(&report.summary_lines());

        let mut message = report.status.to_string();
        if !report.message.is_empty() {
            message.push(' ');
            message.push_str(&report.message);
        }
        host.notify(NOTIFICATION_TITLE, &message, report.severity());
        log::info!("Run finished: {:?} ({})", report.status, report.message);

        if self.config.run_log.open_on_completion || !report.warnings.is_empty() {
            host.open_file(run_log.path());
        }

        host.set_running(false);
        host.refresh_enablement();
    }
}
