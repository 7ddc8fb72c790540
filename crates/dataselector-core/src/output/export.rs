//! Export of counted result objects to the negotiated target, and the map
//! update that follows it.

use std::path::{Path, PathBuf};

use super::format::OutputKind;
use super::negotiate::{OutputPaths, OutputTarget};
use crate::error::{DataSelectorError, Result};
use crate::protocol::{ResultObjects, SelectionCounts};
use crate::services::MapService;

/// Column-type side-car the GIS writes next to delimited text files
pub const SCHEMA_SIDECAR: &str = "schema.ini";

/// Something to add to the map after export
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapAddition {
    Layer(PathBuf),
    Table(PathBuf),
}

/// How exported datasets reach the map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapPolicy {
    /// Create a map when none is active, then add
    CreateIfNone,
    /// Add only to a map that was already active
    OnlyIfActive,
    /// The export already handled the map
    None,
}

/// What an export wrote and what still has to go on the map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPlan {
    pub written: Vec<PathBuf>,
    pub additions: Vec<MapAddition>,
    pub map_policy: MapPolicy,
    pub warnings: Vec<String>,
}

impl ExportPlan {
    fn new(map_policy: MapPolicy) -> Self {
        Self {
            written: Vec::new(),
            additions: Vec::new(),
            map_policy,
            warnings: Vec::new(),
        }
    }
}

pub struct Exporter<'a> {
    maps: &'a dyn MapService,
    /// Container the server result objects are read from
    connection_file: PathBuf,
    map_name: String,
}

impl<'a> Exporter<'a> {
    pub fn new(maps: &'a dyn MapService, connection_file: impl Into<PathBuf>, map_name: impl Into<String>) -> Self {
        Self {
            maps,
            connection_file: connection_file.into(),
            map_name: map_name.into(),
        }
    }

    fn source(&self, object: &str) -> PathBuf {
        self.connection_file.join(object)
    }

    /// Delete a stale `schema.ini` next to `destination`; failure is a warning
    fn remove_schema_sidecar(destination: &Path, plan: &mut ExportPlan) {
        let sidecar = destination
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(SCHEMA_SIDECAR);
        if !sidecar.exists() {
            return;
        }
        match std::fs::remove_file(&sidecar) {
            Ok(()) => log::debug!("Removed {}", sidecar.display()),
            Err(e) => {
                let warning = format!("Could not delete {}: {}", sidecar.display(), e);
                log::warn!("{}", warning);
                plan.warnings.push(warning);
            }
        }
    }

    /// Copy every non-empty result object to the target.
    ///
    /// Stops at the first failure; anything already written stays written.
    pub async fn export(
        &self,
        target: &OutputTarget,
        objects: &ResultObjects,
        counts: SelectionCounts,
        is_spatial: bool,
        map_was_active: bool,
    ) -> Result<ExportPlan> {
        match (&target.paths, is_spatial) {
            (OutputPaths::Split { point, poly }, true) => {
                self.export_split(target.kind, objects, counts, point, poly).await
            }
            (OutputPaths::Single(path), true) if target.kind.is_delimited() => {
                self.export_delimited_spatial(target.kind, objects, counts, path).await
            }
            (OutputPaths::Single(path), false) => {
                self.export_table(target.kind, objects, path, map_was_active).await
            }
            _ => Err(DataSelectorError::InvalidInput(format!(
                "{} output cannot hold {} results",
                target.kind,
                if is_spatial { "spatial" } else { "non-spatial" }
            ))),
        }
    }

    async fn export_split(
        &self,
        kind: OutputKind,
        objects: &ResultObjects,
        counts: SelectionCounts,
        point: &Path,
        poly: &Path,
    ) -> Result<ExportPlan> {
        let mut plan = ExportPlan::new(MapPolicy::CreateIfNone);

        let parts = [
            (counts.point_count, &objects.point, point),
            (counts.poly_count, &objects.poly, poly),
        ];
        for (count, object, destination) in parts {
            if count == 0 {
                continue;
            }
            let source = self.source(object);
            if kind == OutputKind::GeodatabaseFeatureClass {
                self.maps.copy_features(&source, destination, true).await?;
            } else {
                self.maps.export_features(&source, destination, false).await?;
            }
            log::info!("Exported {} rows to {}", count, destination.display());
            plan.written.push(destination.to_path_buf());
            plan.additions.push(MapAddition::Layer(destination.to_path_buf()));
        }

        Ok(plan)
    }

    async fn export_delimited_spatial(
        &self,
        kind: OutputKind,
        objects: &ResultObjects,
        counts: SelectionCounts,
        path: &Path,
    ) -> Result<ExportPlan> {
        let mut plan = ExportPlan::new(MapPolicy::OnlyIfActive);
        let is_csv = kind == OutputKind::Csv;
        Self::remove_schema_sidecar(path, &mut plan);

        let mut append = false;
        for (count, object) in [(counts.point_count, &objects.point), (counts.poly_count, &objects.poly)] {
            if count == 0 {
                continue;
            }
            self.maps
                .delimited_copy(&self.source(object), path, is_csv, append)
                .await?;
            log::info!(
                "{} {} rows to {}",
                if append { "Appended" } else { "Wrote" },
                count,
                path.display()
            );
            append = true;
        }

        plan.written.push(path.to_path_buf());
        plan.additions.push(MapAddition::Table(path.to_path_buf()));
        Ok(plan)
    }

    async fn export_table(
        &self,
        kind: OutputKind,
        objects: &ResultObjects,
        path: &Path,
        map_was_active: bool,
    ) -> Result<ExportPlan> {
        let source = self.source(&objects.table);

        let mut plan = if kind.is_delimited() {
            let mut plan = ExportPlan::new(MapPolicy::OnlyIfActive);
            Self::remove_schema_sidecar(path, &mut plan);
            self.maps
                .delimited_copy(&source, path, kind == OutputKind::Csv, false)
                .await?;
            plan.additions.push(MapAddition::Table(path.to_path_buf()));
            plan
        } else if kind == OutputKind::GeodatabaseTable {
            self.maps.copy_table(&source, path, map_was_active).await?;
            ExportPlan::new(MapPolicy::None)
        } else {
            return Err(DataSelectorError::InvalidInput(format!(
                "{} output cannot hold non-spatial results",
                kind
            )));
        };

        log::info!("Exported table rows to {}", path.display());
        plan.written.push(path.to_path_buf());
        Ok(plan)
    }

    /// Put exported datasets on the map according to the plan's policy.
    ///
    /// Returns true when something was added.
    pub async fn update_map(&self, plan: &ExportPlan, map_was_active: bool) -> Result<bool> {
        if plan.additions.is_empty() {
            return Ok(false);
        }

        match plan.map_policy {
            MapPolicy::None => return Ok(false),
            MapPolicy::OnlyIfActive if !map_was_active => return Ok(false),
            MapPolicy::CreateIfNone if !map_was_active => {
                log::info!("No active map, creating '{}'", self.map_name);
                self.maps.create_map(&self.map_name).await?;
            }
            _ => {}
        }

        for addition in &plan.additions {
            match addition {
                MapAddition::Layer(path) => self.maps.add_layer_to_map(path).await?,
                MapAddition::Table(path) => self.maps.add_table_to_map(path).await?,
            }
        }
        Ok(true)
    }
}
