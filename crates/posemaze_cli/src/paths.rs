//! Cross-platform locations for the runner's files.

use std::path::PathBuf;

use crate::error::CliError;

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
}

impl AppPaths {
    pub fn new() -> Result<Self, CliError> {
        let base = dirs::config_dir().ok_or(CliError::NoConfigDir)?;
        Ok(Self {
            config_dir: base.join("posemaze"),
        })
    }

    pub fn config_dir(&self) -> &PathBuf {
        &self.config_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }
}
