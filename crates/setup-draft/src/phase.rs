// crates/setup-draft/src/phase.rs
// ============================================================================
// Module: Phase Validators
// Description: Step-scoped and final validation of a draft.
// Purpose: Field errors a wizard step can render inline.
// Dependencies: reqwest (Url), setup-config, setup-validate
// ============================================================================

//! ## Overview
//! Each wizard step has a validator that looks only at its slice of the
//! document, so an operator can advance while other steps are incomplete.
//! `final` is exactly the concatenation of every step, in step order. Step
//! validators are pure: they use the offline rule registry and never touch
//! the network or the filesystem. [`advisories`] is the separate, probing
//! path for live feedback and never contributes to a phase.
//!
//! Field constraints declared on the document run through the validation
//! engine; cross-entity checks (primary chain, port claims, chain ids) are
//! coded here.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use serde::Serialize;
use setup_config::Config;
use setup_config::KnownChains;
use setup_config::PRIMARY_CHAIN;
use setup_config::StaticChainTable;
use setup_config::document::LOG_LEVELS;
use setup_config::is_valid_chain_name;
use setup_validate::EndpointProbe;
use setup_validate::FieldViolation;
use setup_validate::Validate;
use setup_validate::ValidatorRegistry;
use setup_validate::collect;

use crate::draft::Draft;

// ============================================================================
// SECTION: Codes
// ============================================================================

/// Machine-readable field error codes.
pub mod codes {
    /// A value that must be set is empty.
    pub const REQUIRED: &str = "required";
    /// A value is outside its enumeration or format.
    pub const INVALID_VALUE: &str = "invalid_value";
    /// A number is outside its bounds.
    pub const OUT_OF_RANGE: &str = "out_of_range";
    /// Chain key uses characters outside `[a-z0-9_-]`.
    pub const INVALID_CHAIN_NAME: &str = "invalid_chain_name";
    /// The primary chain is absent.
    pub const PRIMARY_CHAIN_MISSING: &str = "primary_chain_missing";
    /// The primary chain is disabled.
    pub const PRIMARY_CHAIN_DISABLED: &str = "primary_chain_disabled";
    /// An enabled chain has no RPC endpoint.
    pub const RPC_REQUIRED: &str = "rpc_required";
    /// An RPC endpoint is not an http or https URL.
    pub const RPC_INVALID_SCHEME: &str = "rpc_invalid_scheme";
    /// An enabled chain has no chain id and none is known for its name.
    pub const CHAIN_ID_UNKNOWN: &str = "chain_id_unknown";
    /// Every service is disabled.
    pub const NO_SERVICES_ENABLED: &str = "no_services_enabled";
    /// A port is already claimed by an earlier service.
    pub const PORT_CONFLICT: &str = "port_conflict";
    /// An RPC endpoint did not answer the probe.
    pub const RPC_UNREACHABLE: &str = "rpc_unreachable";
    /// An RPC endpoint reported a different chain id.
    pub const CHAIN_ID_MISMATCH: &str = "chain_id_mismatch";
}

/// Offline registry shared by every step validator.
static STEP_RULES: LazyLock<ValidatorRegistry> = LazyLock::new(ValidatorRegistry::offline);

// ============================================================================
// SECTION: Types
// ============================================================================

/// One field-scoped validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Dotted field path.
    pub field: String,
    /// Machine-readable code (see [`codes`]).
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl FieldError {
    /// Creates a field error.
    #[must_use]
    pub fn new(field: impl Into<String>, code: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.field, self.message, self.code)
    }
}

/// Validation scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Data folder.
    Paths,
    /// Chains and RPC endpoints.
    Chains,
    /// Acquisition strategy and detail.
    Index,
    /// Services and ports.
    Services,
    /// Log output.
    Logging,
    /// Every step, before promotion.
    Final,
}

impl Phase {
    /// Step phases in the order `final` runs them.
    pub const STEPS: [Self; 5] =
        [Self::Paths, Self::Index, Self::Chains, Self::Services, Self::Logging];

    /// Returns the phase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paths => "paths",
            Self::Chains => "chains",
            Self::Index => "index",
            Self::Services => "services",
            Self::Logging => "logging",
            Self::Final => "final",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "paths" => Ok(Self::Paths),
            "chains" => Ok(Self::Chains),
            "index" => Ok(Self::Index),
            "services" => Ok(Self::Services),
            "logging" => Ok(Self::Logging),
            "final" => Ok(Self::Final),
            other => Err(format!("unknown phase: {other}")),
        }
    }
}

// ============================================================================
// SECTION: Entry Points
// ============================================================================

/// Validates `draft` for `phase` against the compiled-in chain table.
#[must_use]
pub fn validate_phase(draft: &Draft, phase: Phase) -> Vec<FieldError> {
    validate_phase_with(draft, phase, &StaticChainTable)
}

/// Validates `draft` for `phase` against `chains`.
#[must_use]
pub fn validate_phase_with(
    draft: &Draft,
    phase: Phase,
    chains: &dyn KnownChains,
) -> Vec<FieldError> {
    let config = &draft.config;
    match phase {
        Phase::Paths => paths(config),
        Phase::Index => index(config),
        Phase::Chains => chain_errors(config, chains),
        Phase::Services => services(config),
        Phase::Logging => logging(config),
        Phase::Final => Phase::STEPS
            .iter()
            .flat_map(|step| validate_phase_with(draft, *step, chains))
            .collect(),
    }
}

/// Probes every RPC of every enabled chain and reports warning-grade notes.
#[must_use]
pub fn advisories(draft: &Draft, probe: &dyn EndpointProbe, timeout: Duration) -> Vec<FieldError> {
    let mut notes = Vec::new();
    for (key, chain) in draft.config.chains.iter().filter(|(_, chain)| chain.enabled) {
        for (index, rpc) in chain.rpcs.iter().enumerate() {
            let field = format!("chains[{key}].rpcs[{index}]");
            let report = probe.probe(rpc.trim(), timeout);
            if !report.reachable {
                let reason = report.error.unwrap_or_else(|| "no answer".to_string());
                notes.push(FieldError::new(
                    field,
                    codes::RPC_UNREACHABLE,
                    format!("endpoint did not answer: {reason}"),
                ));
                continue;
            }
            if let Some(reported) = report.chain_id
                && chain.chain_id != 0
                && reported != chain.chain_id
            {
                notes.push(FieldError::new(
                    field,
                    codes::CHAIN_ID_MISMATCH,
                    format!("endpoint reports chain id {reported}, expected {}", chain.chain_id),
                ));
            }
        }
    }
    notes
}

// ============================================================================
// SECTION: Steps
// ============================================================================

/// `paths`: the data folder must be set.
fn paths(config: &Config) -> Vec<FieldError> {
    engine_errors(&config.general, "general", |path| path == "general.data_folder")
}

/// `index`: strategy and detail must be known values.
fn index(config: &Config) -> Vec<FieldError> {
    engine_errors(&config.general, "general", |path| {
        path == "general.strategy" || path == "general.detail"
    })
}

/// `chains`: names, the primary chain, RPC presence and scheme, chain ids.
fn chain_errors(config: &Config, table: &dyn KnownChains) -> Vec<FieldError> {
    let mut errors = Vec::new();
    match config.chains.get(PRIMARY_CHAIN) {
        None => errors.push(FieldError::new(
            format!("chains.{PRIMARY_CHAIN}"),
            codes::PRIMARY_CHAIN_MISSING,
            format!("the {PRIMARY_CHAIN} chain must be configured"),
        )),
        Some(primary) if !primary.enabled => errors.push(FieldError::new(
            format!("chains[{PRIMARY_CHAIN}].enabled"),
            codes::PRIMARY_CHAIN_DISABLED,
            format!("the {PRIMARY_CHAIN} chain must be enabled"),
        )),
        Some(_) => {}
    }
    for (key, chain) in &config.chains {
        let base = format!("chains[{key}]");
        if !is_valid_chain_name(key) {
            errors.push(FieldError::new(
                base.clone(),
                codes::INVALID_CHAIN_NAME,
                "chain names may only use a-z, 0-9, '_' and '-'",
            ));
        }
        let name = chain.name.trim();
        if !name.is_empty() && name != key {
            errors.push(FieldError::new(
                format!("{base}.name"),
                codes::INVALID_CHAIN_NAME,
                format!("chain name {name} must match its key {key}"),
            ));
        }
        if !chain.enabled {
            continue;
        }
        if chain.rpcs.iter().all(|rpc| rpc.trim().is_empty()) {
            errors.push(FieldError::new(
                format!("{base}.rpcs"),
                codes::RPC_REQUIRED,
                "an enabled chain needs at least one rpc endpoint",
            ));
        } else {
            for (index, rpc) in chain.rpcs.iter().enumerate() {
                if let Err(message) = check_rpc_scheme(rpc) {
                    errors.push(FieldError::new(
                        format!("{base}.rpcs[{index}]"),
                        codes::RPC_INVALID_SCHEME,
                        message,
                    ));
                }
            }
        }
        if chain.chain_id == 0 && table.lookup(key).is_none() {
            errors.push(FieldError::new(
                format!("{base}.chain_id"),
                codes::CHAIN_ID_UNKNOWN,
                format!("no chain id is known for {key}; set one explicitly"),
            ));
        }
    }
    errors
}

/// `services`: one enabled service, bounded values, unique ports.
fn services(config: &Config) -> Vec<FieldError> {
    let enabled: Vec<_> = config
        .services_in_claim_order()
        .into_iter()
        .filter(|(_, service)| service.enabled)
        .collect();
    if enabled.is_empty() {
        return vec![FieldError::new(
            "services",
            codes::NO_SERVICES_ENABLED,
            "at least one service must be enabled",
        )];
    }
    let mut errors = Vec::new();
    let mut claims: BTreeMap<u32, &str> = BTreeMap::new();
    for (key, service) in enabled {
        let base = format!("services[{key}]");
        errors.extend(engine_errors(service, &base, |_| true));
        let Some(port) = service.port.filter(|port| *port != 0) else {
            continue;
        };
        if let Some(owner) = claims.get(&port) {
            errors.push(FieldError::new(
                format!("{base}.port"),
                codes::PORT_CONFLICT,
                format!("port {port} is already used by {owner}"),
            ));
        } else {
            claims.insert(port, key);
        }
    }
    errors
}

/// `logging`: known level, file target complete when logging to a file.
fn logging(config: &Config) -> Vec<FieldError> {
    let mut errors = Vec::new();
    let level = config.logging.level.trim();
    if !level.is_empty() && !LOG_LEVELS.contains(&level) {
        errors.push(FieldError::new(
            "logging.level",
            codes::INVALID_VALUE,
            format!("must be one of [{}], got \"{level}\"", LOG_LEVELS.join(", ")),
        ));
    }
    errors.extend(engine_errors(&config.logging, "logging", |_| true));
    errors
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Runs the offline engine on `entity` and keeps violations whose path passes
/// `keep`.
fn engine_errors(
    entity: &dyn Validate,
    prefix: &str,
    keep: impl Fn(&str) -> bool,
) -> Vec<FieldError> {
    collect(entity, prefix, &STEP_RULES)
        .into_iter()
        .filter(|violation| keep(&violation.path))
        .map(field_error)
        .collect()
}

/// Maps an engine violation onto a field error code.
fn field_error(violation: FieldViolation) -> FieldError {
    let code = match violation.rule.as_str() {
        "required" | "req_if_enabled" => codes::REQUIRED,
        "oneof" | "endswith" | "strict_url" => codes::INVALID_VALUE,
        "min" | "max" | "opt_min" | "opt_max" => codes::OUT_OF_RANGE,
        other => other,
    };
    FieldError::new(violation.path, code, violation.message)
}

/// Accepts absolute http and https URLs with a host.
fn check_rpc_scheme(rpc: &str) -> Result<(), String> {
    let url = Url::parse(rpc.trim()).map_err(|err| format!("is not a valid url: {err}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("must use http or https, got \"{}\"", url.scheme()));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err("url has no host".to_string());
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
