//! CLI argument parsing tests.

use clap::Parser;
use std::path::PathBuf;

use batchq::cli::{Cli, Commands};
use batchq::TaskStatus;

#[test]
fn test_status_command() {
    let cli = Cli::try_parse_from(["batchq", "status", "--state", "snap.json", "--status", "failed"])
        .unwrap();

    assert!(!cli.json);
    match cli.command {
        Commands::Status { state, status } => {
            assert_eq!(state, Some(PathBuf::from("snap.json")));
            assert_eq!(status, Some(TaskStatus::Failed));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_global_json_flag() {
    let cli = Cli::try_parse_from(["batchq", "presets", "--json"]).unwrap();
    assert!(cli.json);
    assert!(matches!(cli.command, Commands::Presets));

    let cli = Cli::try_parse_from(["batchq", "-j", "config"]).unwrap();
    assert!(cli.json);
    assert!(matches!(cli.command, Commands::Config { file: None }));
}

#[test]
fn test_invalid_status_rejected() {
    assert!(Cli::try_parse_from(["batchq", "status", "--status", "sleeping"]).is_err());
}

#[test]
fn test_subcommand_required() {
    assert!(Cli::try_parse_from(["batchq"]).is_err());
}
