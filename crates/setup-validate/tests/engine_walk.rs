//! Walker behavior tests for setup-validate.
// crates/setup-validate/tests/engine_walk.rs
// =============================================================================
// Module: Engine Walk Tests
// Description: Recursion, dive semantics, paths and aggregation.
// Purpose: Ensure every violation is reported with a stable contextual path.
// =============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use setup_validate::FieldViolation;
use setup_validate::ValidatorRegistry;
use setup_validate::collect;
use setup_validate::validate;

mod common;

type TestResult = Result<(), String>;

/// Returns the violation paths in walk order.
fn paths(violations: &[FieldViolation]) -> Vec<String> {
    violations.iter().map(|violation| violation.path.clone()).collect()
}

// ============================================================================
// SECTION: Aggregation
// ============================================================================

#[test]
fn valid_document_passes() -> TestResult {
    let document = common::valid_document();
    validate(&document, &ValidatorRegistry::offline()).map_err(|err| err.to_string())
}

#[test]
fn every_violation_is_reported_together() -> TestResult {
    let mut document = common::valid_document();
    document.settings.mode = "turbo".to_string();
    document.settings.retries = 9;
    document.tags = vec!["a.txt".to_string()];
    let Err(errors) = validate(&document, &ValidatorRegistry::offline()) else {
        return Err("expected violations".to_string());
    };
    assert_eq!(
        paths(errors.violations()),
        vec!["settings.mode", "settings.retries", "tags[0]"],
        "all three failures should be collected in walk order"
    );
    assert!(errors.to_string().starts_with("validation failed: "));
    Ok(())
}

#[test]
fn validation_is_repeatable() {
    let mut document = common::valid_document();
    document.settings.mode = String::new();
    let registry = ValidatorRegistry::offline();
    let first = collect(&document, "", &registry);
    let second = collect(&document, "", &registry);
    assert_eq!(first, second);
}

// ============================================================================
// SECTION: Containers
// ============================================================================

#[test]
fn map_entries_are_walked_with_keyed_paths() {
    let mut document = common::valid_document();
    let mut broken = common::endpoint("", true);
    broken.urls = vec!["ftp://files.example.invalid".to_string(), "not a url".to_string()];
    document.endpoints.insert("mainnet".to_string(), broken);
    let violations = collect(&document, "", &ValidatorRegistry::offline());
    assert_eq!(
        paths(&violations),
        vec!["endpoints[mainnet].name", "endpoints[mainnet].urls[0]", "endpoints[mainnet].urls[1]"]
    );
    assert!(violations.iter().skip(1).all(|violation| violation.rule == "strict_url"));
}

#[test]
fn container_rules_apply_before_dive() {
    let mut document = common::valid_document();
    document.endpoints.clear();
    document.tags = vec!["a.log".into(), "b.log".into(), "c.log".into(), "d.log".into()];
    let violations = collect(&document, "", &ValidatorRegistry::offline());
    assert_eq!(paths(&violations), vec!["endpoints", "tags"]);
    assert_eq!(violations[0].rule, "required");
    assert_eq!(violations[1].rule, "max");
}

#[test]
fn optional_bounds_only_apply_when_set() {
    let mut document = common::valid_document();
    let registry = ValidatorRegistry::offline();
    if let Some(endpoint) = document.endpoints.get_mut("primary") {
        endpoint.port = None;
    }
    assert!(collect(&document, "", &registry).is_empty());
    if let Some(endpoint) = document.endpoints.get_mut("primary") {
        endpoint.port = Some(80);
    }
    let violations = collect(&document, "", &registry);
    assert_eq!(paths(&violations), vec!["endpoints[primary].port"]);
    assert_eq!(violations[0].rule, "opt_min");
}

// ============================================================================
// SECTION: Conditional Rules
// ============================================================================

#[test]
fn required_if_enabled_consults_the_enclosing_entity() {
    let mut document = common::valid_document();
    let mut idle = common::endpoint("idle", false);
    idle.urls.clear();
    let mut active = common::endpoint("active", true);
    active.urls.clear();
    document.endpoints.insert("idle".to_string(), idle);
    document.endpoints.insert("active".to_string(), active);
    let violations = collect(&document, "", &ValidatorRegistry::offline());
    assert_eq!(paths(&violations), vec!["endpoints[active].urls"]);
    assert_eq!(violations[0].rule, "req_if_enabled");
}

// ============================================================================
// SECTION: Registry
// ============================================================================

#[test]
fn custom_validators_can_be_registered() {
    let mut registry = ValidatorRegistry::offline();
    registry.register("oneof", |_ctx| Err("always fails".to_string()));
    let document = common::valid_document();
    let violations = collect(&document, "", &registry);
    assert_eq!(paths(&violations), vec!["settings.mode"]);
    assert_eq!(violations[0].message, "always fails");
}

#[test]
fn empty_registry_reports_nothing() {
    let mut document = common::valid_document();
    document.settings.mode = "bogus".to_string();
    assert!(collect(&document, "", &ValidatorRegistry::empty()).is_empty());
}

#[test]
fn standard_registry_knows_every_builtin() {
    let registry = ValidatorRegistry::offline();
    for name in [
        "required",
        "req_if_enabled",
        "oneof",
        "min",
        "max",
        "opt_min",
        "opt_max",
        "endswith",
        "strict_url",
        "folder_exists",
        "ping_one",
    ] {
        assert!(registry.contains(name), "missing builtin {name}");
    }
}
