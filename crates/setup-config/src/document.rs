// crates/setup-config/src/document.rs
// ============================================================================
// Module: Configuration Document
// Description: The daemon configuration edited by the wizard.
// Purpose: Typed document with defaults and declared field rules.
// Dependencies: serde, setup-validate
// ============================================================================

//! ## Overview
//! [`Config`] is the document both the draft and the live layer hold. Chains
//! and services are keyed maps ordered by name so walks and error lists are
//! deterministic. Every entity implements [`Validate`]; the rule strings here
//! are the single source of field constraints for phase checks and for the
//! full engine run against a live configuration.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use setup_validate::Field;
use setup_validate::FieldValue;
use setup_validate::Validate;

use crate::chains::KnownChains;
use crate::chains::PRIMARY_CHAIN;
use crate::chains::PRIMARY_CHAIN_ID;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Download a published index.
pub const STRATEGY_DOWNLOAD: &str = "download";
/// Build the index from scratch.
pub const STRATEGY_SCRATCH: &str = "scratch";
/// Full appearance index.
pub const DETAIL_INDEX: &str = "index";
/// Bloom filters only.
pub const DETAIL_BLOOM: &str = "bloom";
/// Legacy spelling of [`DETAIL_INDEX`].
pub const DETAIL_LEGACY_INDEX: &str = "entireIndex";

/// Accepted log levels.
pub const LOG_LEVELS: &[&str] = &["debug", "info", "warn", "error"];

/// Services in the order they claim ports.
pub const SERVICE_ORDER: &[&str] = &["scraper", "monitor", "api", "ipfs"];

// ============================================================================
// SECTION: Document
// ============================================================================

/// Daemon configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Data location and indexing mode.
    pub general: General,
    /// Chains keyed by name.
    pub chains: BTreeMap<String, Chain>,
    /// Services keyed by name.
    pub services: BTreeMap<String, Service>,
    /// Log output settings.
    pub logging: Logging,
}

/// Data location and indexing mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct General {
    /// Root folder for index data.
    pub data_folder: String,
    /// `download` or `scratch`.
    pub strategy: String,
    /// `index` or `bloom`.
    pub detail: String,
}

/// One chain entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Chain {
    /// Chain name, back-filled from the map key on save.
    pub name: String,
    /// Chain id, back-filled from the known-chains table when zero.
    pub chain_id: u64,
    /// RPC endpoint URLs.
    pub rpcs: Vec<String>,
    /// Whether the daemon indexes this chain.
    pub enabled: bool,
}

/// One service entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Service {
    /// Service name, back-filled from the map key on save.
    pub name: String,
    /// Whether the daemon runs this service.
    pub enabled: bool,
    /// Listen port; wider than `u16` so out-of-range values reach the
    /// field rules instead of failing the whole document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u32>,
    /// Seconds between passes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep: Option<u32>,
    /// Blocks per batch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    /// Folder for log files.
    pub folder: String,
    /// Log file name.
    pub filename: String,
    /// Write to a file instead of stderr.
    pub to_file: bool,
    /// Minimum level.
    pub level: String,
    /// Rotation size in megabytes.
    pub max_size_mb: u32,
    /// Rotated files to keep.
    pub max_backups: u32,
    /// Days to keep rotated files.
    pub max_age_days: u32,
    /// Compress rotated files.
    pub compress: bool,
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

impl Default for Config {
    fn default() -> Self {
        let mut chains = BTreeMap::new();
        chains.insert(
            PRIMARY_CHAIN.to_string(),
            Chain {
                name: PRIMARY_CHAIN.to_string(),
                chain_id: PRIMARY_CHAIN_ID,
                rpcs: Vec::new(),
                enabled: true,
            },
        );
        let services = [
            service("scraper", true, None, Some(10), Some(500)),
            service("monitor", false, None, Some(12), Some(500)),
            service("api", true, Some(8080), None, None),
            service("ipfs", true, Some(5001), None, None),
        ]
        .into_iter()
        .map(|service| (service.name.clone(), service))
        .collect();
        Self {
            general: General::default(),
            chains,
            services,
            logging: Logging::default(),
        }
    }
}

/// Builds a default service entry.
fn service(
    name: &str,
    enabled: bool,
    port: Option<u32>,
    sleep: Option<u32>,
    batch_size: Option<u32>,
) -> Service {
    Service {
        name: name.to_string(),
        enabled,
        port,
        sleep,
        batch_size,
    }
}

impl Default for General {
    fn default() -> Self {
        Self {
            data_folder: String::new(),
            strategy: STRATEGY_DOWNLOAD.to_string(),
            detail: DETAIL_INDEX.to_string(),
        }
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self {
            name: String::new(),
            chain_id: 0,
            rpcs: Vec::new(),
            enabled: true,
        }
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            folder: String::new(),
            filename: "core.log".to_string(),
            to_file: false,
            level: "info".to_string(),
            max_size_mb: 10,
            max_backups: 3,
            max_age_days: 10,
            compress: true,
        }
    }
}

// ============================================================================
// SECTION: Behavior
// ============================================================================

impl Config {
    /// Fills chain and service names from their keys and zero chain ids from
    /// `table`.
    pub fn backfill(&mut self, table: &dyn KnownChains) {
        for (key, chain) in &mut self.chains {
            if chain.name.is_empty() {
                chain.name.clone_from(key);
            }
            if chain.chain_id == 0 {
                if let Some(chain_id) = table.lookup(key) {
                    chain.chain_id = chain_id;
                }
            }
        }
        for (key, service) in &mut self.services {
            if service.name.is_empty() {
                service.name.clone_from(key);
            }
        }
    }

    /// Returns services in port-claim order: the canonical names first, then
    /// the rest by key.
    #[must_use]
    pub fn services_in_claim_order(&self) -> Vec<(&str, &Service)> {
        let canonical = SERVICE_ORDER
            .iter()
            .filter_map(|name| self.services.get_key_value(*name));
        let others = self
            .services
            .iter()
            .filter(|(key, _)| !SERVICE_ORDER.contains(&key.as_str()));
        canonical.chain(others).map(|(key, service)| (key.as_str(), service)).collect()
    }
}

impl General {
    /// Returns the detail value with the legacy alias resolved.
    #[must_use]
    pub fn normalized_detail(&self) -> &str {
        if self.detail == DETAIL_LEGACY_INDEX { DETAIL_INDEX } else { &self.detail }
    }
}

// ============================================================================
// SECTION: Field Rules
// ============================================================================

impl Validate for Config {
    fn field_rules(&self) -> Vec<Field<'_>> {
        vec![
            Field::new("general", "", FieldValue::nested(&self.general)),
            Field::new(
                "chains",
                "dive",
                FieldValue::map(&self.chains, |chain| FieldValue::nested(chain)),
            ),
            Field::new(
                "services",
                "dive",
                FieldValue::map(&self.services, |service| FieldValue::nested(service)),
            ),
            Field::new("logging", "", FieldValue::nested(&self.logging)),
        ]
    }
}

impl Validate for General {
    fn field_rules(&self) -> Vec<Field<'_>> {
        vec![
            Field::new("data_folder", "required,folder_exists", (&self.data_folder).into()),
            Field::new("strategy", "oneof=download scratch", (&self.strategy).into()),
            Field::new("detail", "oneof=index bloom", self.normalized_detail().into()),
        ]
    }
}

impl Validate for Chain {
    fn field_rules(&self) -> Vec<Field<'_>> {
        vec![Field::new(
            "rpcs",
            "req_if_enabled,ping_one,dive,strict_url",
            FieldValue::seq(&self.rpcs, |rpc| rpc.into()),
        )]
    }

    fn is_enabled(&self) -> Option<bool> {
        Some(self.enabled)
    }
}

impl Validate for Service {
    fn field_rules(&self) -> Vec<Field<'_>> {
        vec![
            Field::new("port", "opt_min=1024,opt_max=65535", self.port.into()),
            Field::new("sleep", "opt_min=1", self.sleep.into()),
            Field::new("batch_size", "opt_min=50,opt_max=10000", self.batch_size.into()),
        ]
    }

    fn is_enabled(&self) -> Option<bool> {
        Some(self.enabled)
    }
}

impl Validate for Logging {
    fn field_rules(&self) -> Vec<Field<'_>> {
        vec![
            Field::new("folder", "req_if_enabled,folder_exists", (&self.folder).into()),
            Field::new("filename", "req_if_enabled,endswith=.log", (&self.filename).into()),
        ]
    }

    fn is_enabled(&self) -> Option<bool> {
        Some(self.to_file)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::StaticChainTable;

    #[test]
    fn claim_order_puts_canonical_services_first() {
        let mut config = Config::default();
        config.services.insert("aardvark".to_string(), Service::default());
        let order: Vec<&str> =
            config.services_in_claim_order().into_iter().map(|(key, _)| key).collect();
        assert_eq!(order, vec!["scraper", "monitor", "api", "ipfs", "aardvark"]);
    }

    #[test]
    fn backfill_fills_names_and_known_ids() {
        let mut config = Config::default();
        config.chains.insert("sepolia".to_string(), Chain::default());
        config.chains.insert("private".to_string(), Chain::default());
        config.backfill(&StaticChainTable);
        assert_eq!(config.chains["sepolia"].name, "sepolia");
        assert_eq!(config.chains["sepolia"].chain_id, 11_155_111);
        assert_eq!(config.chains["private"].chain_id, 0);
    }

    #[test]
    fn legacy_detail_is_normalized() {
        let general = General {
            detail: DETAIL_LEGACY_INDEX.to_string(),
            ..General::default()
        };
        assert_eq!(general.normalized_detail(), DETAIL_INDEX);
    }
}
