//! batchq CLI entry point.

use clap::Parser;

use batchq::cli::{Cli, Commands};
use batchq::infrastructure::config::ConfigLoader;
use batchq::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // An invalid config file is reported by the command itself
    let log_config = ConfigLoader::load()
        .map(|config| LogConfig::from(&config.logging))
        .unwrap_or_default();
    let _logger = match LoggerImpl::init(&log_config) {
        Ok(logger) => Some(logger),
        Err(err) => {
            eprintln!("Warning: logging disabled: {err:#}");
            None
        }
    };

    let result = match cli.command {
        Commands::Status { state, status } => {
            batchq::cli::commands::status::execute(state, status, cli.json).await
        }
        Commands::Presets => batchq::cli::commands::presets::execute(cli.json),
        Commands::Config { file } => batchq::cli::commands::config::execute(file, cli.json),
    };

    if let Err(err) = result {
        batchq::cli::handle_error(err, cli.json);
    }
}
