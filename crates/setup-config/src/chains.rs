// crates/setup-config/src/chains.rs
// ============================================================================
// Module: Known Chains
// Description: Build-time table of well-known chains and their index costs.
// Purpose: Resolve chain ids by name and estimate disk and time budgets.
// Dependencies: crate::document
// ============================================================================

//! ## Overview
//! The table is a compile-time constant. Callers consume it through
//! [`KnownChains`] so tests and embedders can substitute their own data.
//! Estimates only count enabled chains the table knows; unknown chains add
//! nothing.

use serde::Deserialize;
use serde::Serialize;

use crate::document::Config;
use crate::document::DETAIL_BLOOM;
use crate::document::STRATEGY_SCRATCH;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Name of the primary chain every final configuration must carry.
pub const PRIMARY_CHAIN: &str = "mainnet";
/// Chain id of the primary chain.
pub const PRIMARY_CHAIN_ID: u64 = 1;

/// Bytes per gibibyte, for the table below.
const GIB: u64 = 1024 * 1024 * 1024;

/// Compiled-in chain table.
pub const KNOWN_CHAINS: &[KnownChain] = &[
    KnownChain {
        name: "mainnet",
        chain_id: 1,
        index_bytes: 110 * GIB,
        bloom_bytes: 4 * GIB,
        scratch_hours: 72,
        download_hours: 4,
    },
    KnownChain {
        name: "sepolia",
        chain_id: 11_155_111,
        index_bytes: 18 * GIB,
        bloom_bytes: GIB,
        scratch_hours: 14,
        download_hours: 1,
    },
    KnownChain {
        name: "gnosis",
        chain_id: 100,
        index_bytes: 45 * GIB,
        bloom_bytes: 2 * GIB,
        scratch_hours: 36,
        download_hours: 2,
    },
    KnownChain {
        name: "optimism",
        chain_id: 10,
        index_bytes: 60 * GIB,
        bloom_bytes: 3 * GIB,
        scratch_hours: 48,
        download_hours: 3,
    },
    KnownChain {
        name: "base",
        chain_id: 8453,
        index_bytes: 70 * GIB,
        bloom_bytes: 3 * GIB,
        scratch_hours: 54,
        download_hours: 3,
    },
    KnownChain {
        name: "arbitrum",
        chain_id: 42_161,
        index_bytes: 85 * GIB,
        bloom_bytes: 4 * GIB,
        scratch_hours: 60,
        download_hours: 4,
    },
    KnownChain {
        name: "polygon",
        chain_id: 137,
        index_bytes: 95 * GIB,
        bloom_bytes: 4 * GIB,
        scratch_hours: 66,
        download_hours: 4,
    },
];

// ============================================================================
// SECTION: Types
// ============================================================================

/// One row of the known-chains table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownChain {
    /// Canonical chain name.
    pub name: &'static str,
    /// EIP-155 chain id.
    pub chain_id: u64,
    /// Disk usage of a full index.
    pub index_bytes: u64,
    /// Disk usage of a bloom-only index.
    pub bloom_bytes: u64,
    /// Hours to build the index from scratch.
    pub scratch_hours: u64,
    /// Hours to download a published index.
    pub download_hours: u64,
}

/// Disk and time estimates for a configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Estimates {
    /// Expected disk usage in bytes.
    pub disk_usage_bytes: u64,
    /// Expected initial sync duration in hours.
    pub duration_hours: u64,
}

/// Lookup capability over known chains.
pub trait KnownChains: Send + Sync {
    /// Returns the table row for `name`.
    fn entry(&self, name: &str) -> Option<KnownChain>;

    /// Returns the chain id for `name`.
    fn lookup(&self, name: &str) -> Option<u64> {
        self.entry(name).map(|chain| chain.chain_id)
    }
}

/// [`KnownChains`] backed by [`KNOWN_CHAINS`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticChainTable;

impl KnownChains for StaticChainTable {
    fn entry(&self, name: &str) -> Option<KnownChain> {
        KNOWN_CHAINS.iter().find(|chain| chain.name == name).copied()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns true when `name` uses only `[a-z0-9_-]` and is non-empty.
#[must_use]
pub fn is_valid_chain_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'_' | b'-'))
}

/// Estimates disk and time cost of the enabled chains in `config`.
#[must_use]
pub fn estimate(config: &Config, table: &dyn KnownChains) -> Estimates {
    let bloom_only = config.general.normalized_detail() == DETAIL_BLOOM;
    let scratch = config.general.strategy == STRATEGY_SCRATCH;
    config
        .chains
        .iter()
        .filter(|(_, chain)| chain.enabled)
        .filter_map(|(key, _)| table.entry(key))
        .fold(Estimates::default(), |acc, chain| Estimates {
            disk_usage_bytes: acc
                .disk_usage_bytes
                .saturating_add(if bloom_only { chain.bloom_bytes } else { chain.index_bytes }),
            duration_hours: acc
                .duration_hours
                .saturating_add(if scratch { chain.scratch_hours } else { chain.download_hours }),
        })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
