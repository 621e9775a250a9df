//! Implementation of the `batchq config` command.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::AppConfig;
use crate::infrastructure::config::ConfigLoader;

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ConfigOutput {
    pub config: AppConfig,
}

impl CommandOutput for ConfigOutput {
    fn to_human(&self) -> String {
        serde_yaml::to_string(&self.config).unwrap_or_default()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub fn execute(file: Option<PathBuf>, json_mode: bool) -> Result<()> {
    let config = match file {
        Some(path) => ConfigLoader::load_from_file(&path)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?,
        None => ConfigLoader::load()?,
    };

    output(&ConfigOutput { config }, json_mode);
    Ok(())
}
