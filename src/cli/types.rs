//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::models::TaskStatus;

#[derive(Parser, Debug)]
#[command(name = "batchq")]
#[command(about = "batchq - Batch media processing queue", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show tasks and statistics from a saved state snapshot
    Status {
        /// Snapshot file (defaults to the configured state_file_path)
        #[arg(short, long)]
        state: Option<PathBuf>,

        /// Only show tasks with this status
        #[arg(long)]
        status: Option<TaskStatus>,
    },

    /// List the built-in processor presets
    Presets,

    /// Show the effective configuration after file and environment layering
    Config {
        /// Load a single YAML file instead of the .batchq/ hierarchy
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
