// crates/setup-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing, document input and exit codes.
// Purpose: Ensure bounded reads fail closed and invalid drafts exit with 2.
// Dependencies: setup-cli main helpers, tempfile
// ============================================================================

//! ## Overview
//! Drives the command handlers against temp-dir settings with probing off.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::process::ExitCode;

use clap::Parser;
use setup_config::AuditSinkKind;
use setup_config::Config;
use setup_config::WizardSettings;
use setup_config::render_yaml;
use setup_draft::DraftService;
use tempfile::TempDir;

use super::Cli;
use super::Commands;
use super::DraftCommand;
use super::SessionArgs;
use super::ValidateCommand;
use super::check_registry;
use super::command_check;
use super::command_draft;
use super::read_bytes_with_limit;
use super::read_document;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn settings_in(dir: &TempDir) -> WizardSettings {
    let mut settings = WizardSettings::default();
    settings.paths.config_dir = dir.path().to_path_buf();
    settings.audit.sink = AuditSinkKind::None;
    settings.test_mode = true;
    settings
}

fn session(id: &str) -> SessionArgs {
    SessionArgs {
        session: id.to_string(),
    }
}

fn validate(phase: &str) -> DraftCommand {
    DraftCommand::Validate(ValidateCommand {
        phase: phase.to_string(),
        advisories: false,
    })
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

#[test]
fn parses_nested_draft_commands() {
    let cli = Cli::try_parse_from([
        "setup-wizard",
        "--config",
        "wizard.toml",
        "draft",
        "validate",
        "--phase",
        "chains",
    ])
    .unwrap();
    assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("wizard.toml")));
    match cli.command {
        Commands::Draft {
            command: DraftCommand::Validate(command),
        } => assert_eq!(command.phase, "chains"),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn mutating_commands_require_a_session_flag() {
    assert!(Cli::try_parse_from(["setup-wizard", "draft", "apply"]).is_err());
    assert!(Cli::try_parse_from(["setup-wizard", "draft", "apply", "--session", "s1"]).is_ok());
}

// ============================================================================
// SECTION: Input
// ============================================================================

#[test]
fn reads_json_and_yaml_documents() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.general.data_folder = "/srv/data".to_string();

    let json_path = dir.path().join("doc.json");
    fs::write(&json_path, serde_json::to_vec(&config).unwrap()).unwrap();
    assert_eq!(read_document(&json_path).unwrap(), config);

    let yaml_path = dir.path().join("doc.yaml");
    fs::write(&yaml_path, render_yaml(&config).unwrap()).unwrap();
    assert_eq!(read_document(&yaml_path).unwrap(), config);
}

#[test]
fn empty_yaml_document_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("doc.yaml");
    fs::write(&path, "\n").unwrap();
    let err = read_document(&path).unwrap_err();
    assert!(err.to_string().contains("document is empty"), "{err}");
}

#[test]
fn oversized_input_fails_closed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("big.json");
    fs::write(&path, vec![b' '; 65]).unwrap();
    assert_eq!(read_bytes_with_limit(&path, 65).unwrap().len(), 65);
    let err = read_bytes_with_limit(&path, 64).unwrap_err();
    assert!(err.to_string().contains("exceeds size limit"), "{err}");
}

// ============================================================================
// SECTION: Exit Codes
// ============================================================================

#[test]
fn invalid_draft_exits_with_two() {
    let dir = TempDir::new().unwrap();
    let service = DraftService::from_settings(&settings_in(&dir)).unwrap();

    let init = command_draft(&service, DraftCommand::Init(session("s1"))).unwrap();
    assert_eq!(init, ExitCode::SUCCESS);
    assert_eq!(command_draft(&service, validate("chains")).unwrap(), ExitCode::from(2));
    assert_eq!(command_draft(&service, validate("index")).unwrap(), ExitCode::SUCCESS);
    assert!(command_draft(&service, validate("summary")).is_err());
}

#[test]
fn validate_without_a_draft_is_an_error() {
    let dir = TempDir::new().unwrap();
    let service = DraftService::from_settings(&settings_in(&dir)).unwrap();
    let err = command_draft(&service, validate("final")).unwrap_err();
    assert!(err.to_string().contains("no draft"), "{err}");
}

#[test]
fn check_reports_a_missing_live_config() {
    let dir = TempDir::new().unwrap();
    assert_eq!(command_check(&settings_in(&dir)).unwrap(), ExitCode::from(2));
}

#[test]
fn check_passes_a_complete_live_config() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.general.data_folder = dir.path().join("data").display().to_string();
    if let Some(chain) = config.chains.get_mut("mainnet") {
        chain.rpcs = vec!["http://localhost:8545".to_string()];
    }
    fs::write(dir.path().join("config.yaml"), render_yaml(&config).unwrap()).unwrap();

    assert_eq!(command_check(&settings_in(&dir)).unwrap(), ExitCode::SUCCESS);
    assert!(dir.path().join("data").is_dir());
}

#[test]
fn check_registry_carries_every_builtin() {
    let dir = TempDir::new().unwrap();
    let registry = check_registry(&settings_in(&dir)).unwrap();
    for name in ["required", "folder_exists", "ping_one", "strict_url"] {
        assert!(registry.contains(name), "{name} missing");
    }
}
