//! Draft service lifecycle tests for setup-draft.
// crates/setup-draft/tests/draft_lifecycle.rs
// =============================================================================
// Module: Draft Lifecycle Tests
// Description: Seeding, saving, sessions and reset through the service.
// Purpose: Exercise the facade the way an editing surface drives it.
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
use std::thread;
use std::time::Duration;

use setup_config::Config;
use setup_config::render_yaml;
use setup_draft::Phase;
use setup_draft::ServiceError;
use setup_draft::SessionOutcome;
use setup_draft::SessionRejection;
use setup_draft::codes;

use crate::common::FixtureOptions;
use crate::common::ScriptedProbe;
use crate::common::fixture;
use crate::common::fixture_with;
use crate::common::valid_config;

type TestResult = Result<(), String>;

// ============================================================================
// SECTION: Seeding
// ============================================================================

#[test]
fn fresh_install_seeds_defaults_with_the_configured_folder() -> TestResult {
    let fx = fixture();
    assert_eq!(fx.service.get_draft().map_err(|err| err.to_string())?, None);

    let draft = fx.service.open_draft("s1").map_err(|err| err.to_string())?;
    assert_eq!(draft.config.general.data_folder, fx.data_folder());
    assert_eq!(draft.meta.session, "s1");
    assert!(draft.meta.estimates.disk_usage_bytes > 0);
    assert!(fx.draft_path().exists());

    let errors = fx.service.validate_phase(&draft, Phase::Chains);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, codes::RPC_REQUIRED);
    Ok(())
}

#[test]
fn live_config_seeds_the_first_draft() -> TestResult {
    let fx = fixture();
    let mut live = valid_config("/srv/existing");
    live.general.strategy = "scratch".to_string();
    fs::write(fx.live_path(), render_yaml(&live).map_err(|err| err.to_string())?)
        .map_err(|err| err.to_string())?;

    let draft = fx.service.open_draft("s1").map_err(|err| err.to_string())?;
    assert_eq!(draft.config.general.data_folder, "/srv/existing");
    assert_eq!(draft.config.general.strategy, "scratch");
    Ok(())
}

#[test]
fn unreadable_live_config_falls_back_to_defaults() -> TestResult {
    let fx = fixture();
    fs::write(fx.live_path(), "general: [unclosed").map_err(|err| err.to_string())?;
    let draft = fx.service.open_draft("s1").map_err(|err| err.to_string())?;
    assert_eq!(draft.config.chains.len(), Config::default().chains.len());
    assert_eq!(draft.config.general.data_folder, fx.data_folder());
    Ok(())
}

#[test]
fn existing_draft_wins_over_seeding() -> TestResult {
    let fx = fixture();
    let mut draft = fx.service.open_draft("s1").map_err(|err| err.to_string())?;
    draft.config.general.detail = "bloom".to_string();
    fx.service.save_draft("s1", &mut draft).map_err(|err| err.to_string())?;

    let reopened = fx.service.open_draft("s1").map_err(|err| err.to_string())?;
    assert_eq!(reopened.config.general.detail, "bloom");
    assert_eq!(reopened, draft);
    Ok(())
}

#[test]
fn saves_refresh_estimates() -> TestResult {
    let fx = fixture();
    let mut draft = fx.service.open_draft("s1").map_err(|err| err.to_string())?;
    let index_estimate = draft.meta.estimates;
    draft.config.general.detail = "bloom".to_string();
    fx.service.save_draft("s1", &mut draft).map_err(|err| err.to_string())?;
    assert!(draft.meta.estimates.disk_usage_bytes < index_estimate.disk_usage_bytes);
    Ok(())
}

// ============================================================================
// SECTION: Sessions
// ============================================================================

#[test]
fn second_session_is_refused_while_the_first_is_active() {
    let fx = fixture();
    let mut draft = fx.service.open_draft("s1").unwrap();

    match fx.service.save_draft("s2", &mut draft) {
        Err(ServiceError::Session(SessionRejection::Conflict {
            active_id, ..
        })) => assert_eq!(active_id, "s1"),
        other => panic!("expected conflict, got {other:?}"),
    }
    assert!(fx.service.save_draft("s1", &mut draft).is_ok());
}

#[test]
fn blank_session_is_refused() {
    let fx = fixture();
    assert_eq!(
        fx.service.open_draft(" ").unwrap_err(),
        ServiceError::Session(SessionRejection::SessionRequired)
    );
    assert!(!fx.draft_path().exists());
}

#[test]
fn idle_session_is_taken_over_and_audited() {
    let fx = fixture_with(FixtureOptions {
        window: Duration::from_millis(50),
        ..FixtureOptions::default()
    });
    fx.service.open_draft("s1").unwrap();
    thread::sleep(Duration::from_millis(120));

    match fx.service.enforce_session("s2") {
        SessionOutcome::Takeover {
            previous_id, ..
        } => assert_eq!(previous_id, "s1"),
        other => panic!("expected takeover, got {other:?}"),
    }
    assert!(matches!(fx.service.enforce_session("s1"), SessionOutcome::Conflict { .. }));

    let takeovers: Vec<_> =
        fx.audit.events().into_iter().filter(|event| event.event == "session_takeover").collect();
    assert_eq!(takeovers.len(), 1);
    assert_eq!(takeovers[0].session_id.as_deref(), Some("s2"));
    assert_eq!(takeovers[0].previous_session_id.as_deref(), Some("s1"));
}

#[test]
fn reads_do_not_need_a_session() {
    let fx = fixture();
    let mut draft = fx.service.open_draft("s1").unwrap();
    draft.config.general.data_folder = "/srv/data".to_string();
    fx.service.save_draft("s1", &mut draft).unwrap();

    let read = fx.service.get_draft().unwrap().expect("draft");
    assert_eq!(read.config.general.data_folder, "/srv/data");
    assert!(fx.service.validate_phase(&read, Phase::Paths).is_empty());
}

// ============================================================================
// SECTION: Reset and Corruption
// ============================================================================

#[test]
fn reset_discards_the_draft_but_not_the_live_file() {
    let fx = fixture();
    fs::write(fx.live_path(), render_yaml(&valid_config("/srv/live")).unwrap()).unwrap();
    let live_before = fs::read(fx.live_path()).unwrap();
    fx.service.open_draft("s1").unwrap();

    fx.service.reset_draft("s1").unwrap();

    assert_eq!(fx.service.get_draft().unwrap(), None);
    assert_eq!(fs::read(fx.live_path()).unwrap(), live_before);
    assert!(fx.audit.names().contains(&"draft_reset"));
}

#[test]
fn corrupt_draft_reads_as_absent_with_a_one_time_notice() {
    let fx = fixture();
    fs::write(fx.draft_path(), b"\x00\x01garbage").unwrap();

    assert_eq!(fx.service.get_draft().unwrap(), None);
    let notice = fx.service.take_corruption_notice().expect("notice");
    assert!(notice.archived.as_ref().is_some_and(|path| path.exists()));
    assert!(fx.service.take_corruption_notice().is_none());

    let draft = fx.service.open_draft("s1").unwrap();
    assert_eq!(draft.config.general.data_folder, fx.data_folder());
}

// ============================================================================
// SECTION: Advisories
// ============================================================================

#[test]
fn advisories_use_the_injected_probe() {
    let probe = Arc::new(ScriptedProbe::default());
    let fx = fixture_with(FixtureOptions {
        probe: Arc::clone(&probe) as Arc<dyn setup_validate::EndpointProbe>,
        ..FixtureOptions::default()
    });
    let draft = setup_draft::Draft::new(valid_config("/srv/data"));

    let notes = fx.service.advisories(&draft);
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].code, codes::RPC_UNREACHABLE);
    assert_eq!(probe.calls(), vec!["http://localhost:8545"]);
}

#[test]
fn test_mode_skips_probing() {
    let probe = Arc::new(ScriptedProbe::default());
    let fx = fixture_with(FixtureOptions {
        probe: Arc::clone(&probe) as Arc<dyn setup_validate::EndpointProbe>,
        test_mode: true,
        ..FixtureOptions::default()
    });
    let draft = setup_draft::Draft::new(valid_config("/srv/data"));

    assert!(fx.service.advisories(&draft).is_empty());
    assert!(probe.calls().is_empty());
}
