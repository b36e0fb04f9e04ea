//! Promotion tests for setup-draft.
// crates/setup-draft/tests/promotion.rs
// =============================================================================
// Module: Promotion Tests
// Description: Apply success, refusal and rollback paths.
// Purpose: Ensure the live file is replaced only by a whole, valid draft.
// =============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use std::fs;
use std::sync::Arc;

use setup_config::parse_yaml;
use setup_config::render_yaml;
use setup_draft::ApplyError;
use setup_draft::Draft;
use setup_draft::ServiceError;

use crate::common::DraftPinningWriter;
use crate::common::Fixture;
use crate::common::FixtureOptions;
use crate::common::TruncatingWriter;
use crate::common::fixture;
use crate::common::fixture_with;
use crate::common::valid_config;

/// Opens a draft, gives mainnet an endpoint and saves it.
fn ready_draft(fx: &Fixture, session: &str) -> Draft {
    let mut draft = fx.service.open_draft(session).unwrap();
    if let Some(chain) = draft.config.chains.get_mut("mainnet") {
        chain.rpcs = vec!["http://localhost:8545".to_string()];
    }
    fx.service.save_draft(session, &mut draft).unwrap();
    draft
}

fn apply_error(result: Result<setup_draft::ApplyReport, ServiceError>) -> ApplyError {
    match result {
        Err(ServiceError::Apply(err)) => err,
        other => panic!("expected apply error, got {other:?}"),
    }
}

#[test]
fn valid_draft_becomes_the_live_config() {
    let fx = fixture();
    let draft = ready_draft(&fx, "s1");

    let report = fx.service.apply_draft("s1").unwrap();

    assert_eq!(report.live_path, fx.live_path());
    assert!(report.bytes_written > 0);
    assert!(!report.backup_created);
    assert!(report.data_folder.is_dir());
    let live = parse_yaml(&fs::read(fx.live_path()).unwrap()).unwrap().expect("live config");
    assert_eq!(live, draft.config);
    assert!(!fx.draft_path().exists());
    assert_eq!(fx.service.get_draft().unwrap(), None);
    assert!(fx.audit.names().contains(&"draft_promoted"));
}

#[cfg(unix)]
#[test]
fn created_data_folder_is_closed_to_others() {
    use std::os::unix::fs::PermissionsExt;

    let fx = fixture();
    ready_draft(&fx, "s1");
    let report = fx.service.apply_draft("s1").unwrap();
    let mode = fs::metadata(&report.data_folder).unwrap().permissions().mode();
    assert_eq!(mode & 0o007, 0, "mode {mode:o}");
}

#[test]
fn previous_live_config_is_backed_up() {
    let fx = fixture();
    let previous = render_yaml(&valid_config("/srv/old")).unwrap();
    fs::write(fx.live_path(), &previous).unwrap();
    let mut draft = fx.service.open_draft("s1").unwrap();
    draft.config.general.data_folder = fx.data_folder();
    fx.service.save_draft("s1", &mut draft).unwrap();

    let report = fx.service.apply_draft("s1").unwrap();

    assert!(report.backup_created);
    let backup = fx.root().join("config.prev.yaml");
    assert_eq!(fs::read_to_string(backup).unwrap(), previous);
}

#[test]
fn apply_releases_the_session() {
    let fx = fixture();
    ready_draft(&fx, "s1");
    fx.service.apply_draft("s1").unwrap();
    assert!(fx.service.open_draft("s2").is_ok());
}

#[test]
fn invalid_draft_is_not_promoted() {
    let fx = fixture();
    fx.service.open_draft("s1").unwrap();

    let err = apply_error(fx.service.apply_draft("s1"));

    let ApplyError::Invalid(errors) = err else {
        panic!("expected validation failure");
    };
    assert!(errors.iter().any(|error| error.field == "chains[mainnet].rpcs"));
    assert!(!fx.live_path().exists());
    assert!(fx.draft_path().exists());
}

#[test]
fn missing_draft_cannot_be_applied() {
    let fx = fixture();
    fx.service.enforce_session("s1");
    assert_eq!(apply_error(fx.service.apply_draft("s1")), ApplyError::DraftMissing);
}

#[test]
fn corrupt_draft_cannot_be_applied() {
    let fx = fixture();
    fs::write(fx.draft_path(), b"{").unwrap();
    assert!(matches!(apply_error(fx.service.apply_draft("s1")), ApplyError::DraftUnreadable(_)));
    assert!(!fx.live_path().exists());
}

#[test]
fn data_folder_that_is_a_file_is_refused() {
    let fx = fixture();
    fs::write(fx.root().join("data"), b"not a folder").unwrap();
    ready_draft(&fx, "s1");

    match apply_error(fx.service.apply_draft("s1")) {
        ApplyError::DataFolderNotDirectory(path) => assert_eq!(path, fx.root().join("data")),
        other => panic!("expected data folder error, got {other}"),
    }
    assert!(!fx.live_path().exists());
    assert!(fx.draft_path().exists());
}

#[test]
fn empty_write_restores_the_original_live_file() {
    let fx = fixture_with(FixtureOptions {
        writer: Arc::new(TruncatingWriter),
        ..FixtureOptions::default()
    });
    let original = render_yaml(&valid_config("/srv/old")).unwrap();
    fs::write(fx.live_path(), &original).unwrap();
    let mut draft = fx.service.open_draft("s1").unwrap();
    draft.config.general.data_folder = fx.data_folder();
    fx.service.save_draft("s1", &mut draft).unwrap();

    let err = apply_error(fx.service.apply_draft("s1"));

    assert!(matches!(err, ApplyError::Truncated(_)));
    assert!(err.to_string().contains("unexpected end of file"));
    assert_eq!(fs::read_to_string(fx.live_path()).unwrap(), original);
    assert!(fx.draft_path().exists());
    assert!(!fx.audit.names().contains(&"draft_promoted"));
}

#[test]
fn empty_write_without_an_original_leaves_no_live_file() {
    let fx = fixture_with(FixtureOptions {
        writer: Arc::new(TruncatingWriter),
        ..FixtureOptions::default()
    });
    ready_draft(&fx, "s1");

    assert!(matches!(apply_error(fx.service.apply_draft("s1")), ApplyError::Truncated(_)));
    assert!(!fx.live_path().exists());
    assert!(fx.draft_path().exists());
}

#[test]
fn stuck_draft_still_counts_as_promoted() {
    let fx = fixture_with(FixtureOptions {
        writer: Arc::new(DraftPinningWriter),
        ..FixtureOptions::default()
    });
    let draft = ready_draft(&fx, "s1");

    let err = apply_error(fx.service.apply_draft("s1"));

    assert!(matches!(err, ApplyError::Cleanup(_)), "{err}");
    let live = parse_yaml(&fs::read(fx.live_path()).unwrap()).unwrap().expect("live config");
    assert_eq!(live, draft.config);
    let promoted: Vec<_> = fx
        .audit
        .events()
        .into_iter()
        .filter(|event| event.event == "draft_promoted")
        .collect();
    assert_eq!(promoted.len(), 1);
    assert_eq!(promoted[0].session_id.as_deref(), Some("s1"));
    assert_eq!(fx.service.enforce_session("s2").label(), "accepted");
}
