// crates/setup-validate/src/probe.rs
// ============================================================================
// Module: Endpoint Probe Interface
// Description: Injected liveness capability for endpoint URLs.
// Purpose: Keep network access out of the engine while allowing `ping_one`.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The engine never opens sockets. Callers inject an [`EndpointProbe`] that
//! answers "is this URL reachable" within a caller-supplied timeout.

use std::time::Duration;

use serde::Serialize;

/// Result of probing one endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    /// Whether the endpoint answered.
    pub reachable: bool,
    /// Chain identifier reported by the endpoint, when it answered one.
    pub chain_id: Option<u64>,
    /// Round-trip time in milliseconds.
    pub latency_ms: u64,
    /// Failure description for unreachable endpoints.
    pub error: Option<String>,
}

impl ProbeReport {
    /// Builds a report for an endpoint that answered.
    #[must_use]
    pub fn reachable(latency: Duration, chain_id: Option<u64>) -> Self {
        Self {
            reachable: true,
            chain_id,
            latency_ms: duration_ms(latency),
            error: None,
        }
    }

    /// Builds a report for an endpoint that did not answer.
    #[must_use]
    pub fn unreachable(latency: Duration, error: impl Into<String>) -> Self {
        Self {
            reachable: false,
            chain_id: None,
            latency_ms: duration_ms(latency),
            error: Some(error.into()),
        }
    }
}

/// Liveness capability: "given a URL, is it reachable, and what did it say".
pub trait EndpointProbe: Send + Sync {
    /// Probes `url`, giving up after `timeout`.
    fn probe(&self, url: &str, timeout: Duration) -> ProbeReport;
}

/// Converts a duration into whole milliseconds.
fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
