//! Output negotiation
//!
//! Asks the user for a destination until it is valid for the export kind and
//! either new or confirmed for overwrite. Cancelling the prompt ends the
//! negotiation with no target.

use std::path::{Path, PathBuf};

use super::format::OutputKind;
use crate::error::Result;
use crate::services::{MapService, PathFilter, PathRequest, Prompter, Severity};

/// Where the results will be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputPaths {
    Single(PathBuf),
    /// Spatial results going to geometry-holding datasets
    Split { point: PathBuf, poly: PathBuf },
}

impl OutputPaths {
    pub fn all(&self) -> Vec<&Path> {
        match self {
            OutputPaths::Single(path) => vec![path.as_path()],
            OutputPaths::Split { point, poly } => vec![point.as_path(), poly.as_path()],
        }
    }
}

/// Resolved output for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub kind: OutputKind,
    /// Path the user chose, after extension correction
    pub base: PathBuf,
    pub paths: OutputPaths,
}

/// `<base>_Point[.ext]` and `<base>_Poly[.ext]` next to `base`
pub fn derive_split_paths(base: &Path, extension: Option<&str>) -> (PathBuf, PathBuf) {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let parent = base.parent().unwrap_or_else(|| Path::new(""));

    let name = |suffix: &str| match extension {
        Some(ext) => format!("{}_{}.{}", stem, suffix, ext),
        None => format!("{}_{}", stem, suffix),
    };

    (parent.join(name("Point")), parent.join(name("Poly")))
}

fn is_inside_geodatabase(path: &Path) -> bool {
    path.parent()
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("gdb"))
}

/// Check a chosen path against the export kind.
///
/// Delimited and shapefile outputs get their extension appended when it is
/// missing and are rejected when it differs. Geodatabase outputs must have no
/// extension and sit directly inside a `.gdb` container. The error is the
/// message to show the user.
pub fn validate_output_path(path: &Path, kind: OutputKind) -> std::result::Result<PathBuf, String> {
    let actual = path.extension().and_then(|e| e.to_str());

    match kind.extension() {
        None => {
            if actual.is_some() {
                return Err(format!(
                    "{} outputs must not have a file extension: {}",
                    kind,
                    path.display()
                ));
            }
            if !is_inside_geodatabase(path) {
                return Err(format!(
                    "{} outputs must be saved inside a file geodatabase (.gdb): {}",
                    kind,
                    path.display()
                ));
            }
            Ok(path.to_path_buf())
        }
        Some(expected) => match actual {
            None => {
                let mut file = path.as_os_str().to_owned();
                file.push(".");
                file.push(expected);
                Ok(PathBuf::from(file))
            }
            Some(ext) if ext.eq_ignore_ascii_case(expected) => Ok(path.to_path_buf()),
            Some(ext) => Err(format!(
                "{} outputs must have the .{} extension, not .{}",
                kind, expected, ext
            )),
        },
    }
}

/// Interactive output negotiation
pub struct OutputNegotiator<'a> {
    prompter: &'a dyn Prompter,
    maps: &'a dyn MapService,
    initial_dir: PathBuf,
}

impl<'a> OutputNegotiator<'a> {
    pub fn new(prompter: &'a dyn Prompter, maps: &'a dyn MapService, initial_dir: PathBuf) -> Self {
        Self {
            prompter,
            maps,
            initial_dir,
        }
    }

    fn request(&self, kind: OutputKind) -> PathRequest {
        PathRequest {
            title: format!("Save output as {}", kind),
            filter: PathFilter {
                description: kind.label().to_string(),
                extension: kind.extension().map(str::to_string),
            },
            initial_dir: self.initial_dir.clone(),
            for_save: true,
        }
    }

    /// Prompt until a usable target is chosen or the user cancels.
    ///
    /// Spatial results bound for a feature class or shapefile resolve to a
    /// point/polygon pair; everything else resolves to one path.
    pub async fn resolve_output_target(
        &self,
        is_spatial: bool,
        kind: OutputKind,
    ) -> Result<Option<OutputTarget>> {
        let request = self.request(kind);

        loop {
            let Some(chosen) = self.prompter.ask_path(&request).await else {
                log::info!("Output selection cancelled");
                return Ok(None);
            };

            let base = match validate_output_path(&chosen, kind) {
                Ok(base) => base,
                Err(message) => {
                    log::debug!("Rejected output path: {}", message);
                    self.prompter.show_message(&message, Severity::Warning).await;
                    continue;
                }
            };

            let paths = if is_spatial && kind.holds_geometry() {
                let (point, poly) = derive_split_paths(&base, kind.extension());
                OutputPaths::Split { point, poly }
            } else {
                OutputPaths::Single(base.clone())
            };

            let mut existing = Vec::new();
            for path in paths.all() {
                if self.maps.dataset_exists(path).await? {
                    existing.push(path.display().to_string());
                }
            }

            if !existing.is_empty() {
                let question = format!("{} already exists. Overwrite?", existing.join(" and "));
                if !self.prompter.ask_yes_no(&question).await {
                    continue;
                }
                log::info!("Overwriting existing output: {}", existing.join(", "));
            }

            return Ok(Some(OutputTarget { kind, base, paths }));
        }
    }
}
