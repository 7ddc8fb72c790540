//! Per-user run log
//!
//! Plain text file the user can open after a run. Writes are fire-and-forget;
//! the only checked operation is clearing the previous log before a run.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::{DataSelectorError, Result};

const FRAME: &str = "----------------------------------------------------------------------";

#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    /// `<dir>/DataSelector_<user_token>.log`
    pub fn for_user(dir: &Path, user_token: &str) -> Self {
        Self {
            path: dir.join(format!("DataSelector_{}.log", user_token)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Make sure the log can be written, deleting the previous one when
    /// `clear` is set. A log that cannot be deleted (still open elsewhere)
    /// is a precondition failure.
    pub fn prepare(&self, clear: bool) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        if clear && fs::symlink_metadata(&self.path).is_ok() {
            fs::remove_file(&self.path).map_err(|e| {
                DataSelectorError::Precondition(format!(
                    "Cannot delete log file {}; it may be open in another program ({})",
                    self.path.display(),
                    e
                ))
            })?;
            log::debug!("Cleared run log {}", self.path.display());
        }
        Ok(())
    }

    /// Append a timestamped line
    pub fn append(&self, message: &str) {
        let line = format!("{} - {}", Local::now().format("%d/%m/%Y %H:%M:%S"), message);
        self.write_lines(&[line]);
    }

    /// Append a framed block of lines
    pub fn append_summary(&self, lines: &[String]) {
        let mut block = Vec::with_capacity(lines.len() + 2);
        block.push(FRAME.to_string());
        block.extend(lines.iter().cloned());
        block.push(FRAME.to_string());
        self.write_lines(&block);
    }

    fn write_lines(&self, lines: &[String]) {
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| {
                for line in lines {
                    writeln!(file, "{}", line)?;
                }
                Ok(())
            });

        if let Err(e) = result {
            log::warn!("Could not write run log {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_path_per_user() {
        let log = RunLog::for_user(Path::new("/logs"), "jbloggs");
        assert_eq!(log.path(), Path::new("/logs/DataSelector_jbloggs.log"));
    }

    #[test]
    fn test_append_and_clear() {
        let dir = tempdir().unwrap();
        let log = RunLog::for_user(dir.path(), "jbloggs");
        log.prepare(true).unwrap();
        log.append("Process started");
        log.append_summary(&["Status: Success".to_string()]);

        let contents = fs::read_to_string(log.path()).unwrap();
        assert!(contents.contains(" - Process started"));
        assert!(contents.contains(FRAME));
        assert!(contents.contains("Status: Success"));

        log.prepare(false).unwrap();
        assert!(log.path().exists());

        log.prepare(true).unwrap();
        assert!(!log.path().exists());
    }

    #[test]
    fn test_undeletable_log_is_precondition_failure() {
        let dir = tempdir().unwrap();
        let log = RunLog::for_user(dir.path(), "jbloggs");
        // A directory in place of the log file cannot be removed with remove_file
        fs::create_dir_all(log.path()).unwrap();

        let err = log.prepare(true).unwrap_err();
        assert!(matches!(err, DataSelectorError::Precondition(_)));
    }
}
