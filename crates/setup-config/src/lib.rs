// crates/setup-config/src/lib.rs
// ============================================================================
// Module: Setup Config Library
// Description: Configuration document, chain table, live I/O and settings.
// Purpose: Shared data model for the draft lifecycle and the operator CLI.
// Dependencies: serde, serde_yaml, setup-validate, thiserror, toml, tracing
// ============================================================================

//! ## Overview
//! `setup-config` owns the daemon [`Config`] document and its declared field
//! rules, the compiled-in [`KNOWN_CHAINS`] table, reading and rendering the
//! live YAML file, and the [`WizardSettings`] that configure the draft
//! lifecycle itself.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod chains;
pub mod document;
pub mod error;
pub mod live;
pub mod settings;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use chains::Estimates;
pub use chains::KNOWN_CHAINS;
pub use chains::KnownChain;
pub use chains::KnownChains;
pub use chains::PRIMARY_CHAIN;
pub use chains::PRIMARY_CHAIN_ID;
pub use chains::StaticChainTable;
pub use chains::estimate;
pub use chains::is_valid_chain_name;
pub use document::Chain;
pub use document::Config;
pub use document::General;
pub use document::Logging;
pub use document::Service;
pub use error::ConfigError;
pub use live::FileLiveConfig;
pub use live::LiveConfigSource;
pub use live::parse_yaml;
pub use live::render_yaml;
pub use settings::AuditSettings;
pub use settings::AuditSinkKind;
pub use settings::WizardSettings;
