use super::types::DataSelectorConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// Expand a leading `~/` to the user's home directory.
pub fn expand_path(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(rest).to_string_lossy().into_owned();
        }
    }
    path.to_string()
}

impl DataSelectorConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text and finalize it
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let mut config: DataSelectorConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;

        config.finalize()?;

        Ok(config)
    }

    fn normalize_paths(&mut self) {
        self.query.default_dir = expand_path(&self.query.default_dir);
        self.output.default_dir = expand_path(&self.output.default_dir);
        self.run_log.dir = expand_path(&self.run_log.dir);
        self.logging.file_path = expand_path(&self.logging.file_path);
        self.query.file_extension = self
            .query
            .file_extension
            .trim_start_matches('.')
            .to_string();
    }

    /// Normalize local filesystem paths and validate configuration.
    pub fn finalize(&mut self) -> anyhow::Result<()> {
        self.normalize_paths();

        self.validate()?;

        Ok(())
    }

    /// Validate configuration settings
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.schema.trim().is_empty() {
            return Err(anyhow::anyhow!("database.schema cannot be empty"));
        }

        if self.database.objects_table.trim().is_empty() {
            return Err(anyhow::anyhow!("database.objects_table cannot be empty"));
        }

        if self.database.probe_timeout_secs == 0 {
            return Err(anyhow::anyhow!("database.probe_timeout_secs cannot be 0"));
        }

        if self.procedures.select.trim().is_empty() || self.procedures.clear.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "procedures.select and procedures.clear must both be set"
            ));
        }

        if self.query.geometry_columns.iter().all(|c| c.trim().is_empty()) {
            return Err(anyhow::anyhow!(
                "query.geometry_columns must name at least one column"
            ));
        }

        if self.query.file_extension.is_empty() {
            return Err(anyhow::anyhow!("query.file_extension cannot be empty"));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            ));
        }

        for (target, level) in &self.logging.targets {
            if !valid_levels.contains(&level.as_str()) {
                return Err(anyhow::anyhow!(
                    "Invalid log level '{}' for target '{}'. Must be one of: {}",
                    level,
                    target,
                    valid_levels.join(", ")
                ));
            }
        }

        let valid_formats = ["compact", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_formats.join(", ")
            ));
        }

        Ok(())
    }

    /// Directory holding the per-user run logs
    pub fn run_log_dir(&self) -> PathBuf {
        PathBuf::from(&self.run_log.dir)
    }
}
