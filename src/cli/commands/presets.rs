//! Implementation of the `batchq presets` command.

use anyhow::Result;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{ProcessorConfig, ProcessorPreset};

#[derive(Debug, Serialize)]
pub struct PresetEntry {
    pub name: ProcessorPreset,
    pub config: ProcessorConfig,
}

#[derive(Debug, Serialize)]
pub struct PresetsOutput {
    pub presets: Vec<PresetEntry>,
}

impl CommandOutput for PresetsOutput {
    fn to_human(&self) -> String {
        TableFormatter::new().format_presets(&ProcessorPreset::ALL)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub fn execute(json_mode: bool) -> Result<()> {
    let presets = ProcessorPreset::ALL
        .iter()
        .map(|preset| PresetEntry {
            name: *preset,
            config: preset.config(),
        })
        .collect();

    output(&PresetsOutput { presets }, json_mode);
    Ok(())
}
