// crates/setup-draft/src/probe.rs
// ============================================================================
// Module: HTTP RPC Probe
// Description: JSON-RPC liveness probe for chain endpoints.
// Purpose: Answer reachability and chain id for a single RPC URL.
// Dependencies: reqwest, serde_json, setup-validate
// ============================================================================

//! ## Overview
//! The probe posts `eth_chainId` to the endpoint with the caller's timeout,
//! reads a bounded response and parses the hex chain id. Any failure yields
//! an unreachable report with a short reason; the probe never errors.
//! Redirects are not followed and only http and https URLs are probed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::time::Duration;
use std::time::Instant;

use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use serde_json::Value;
use serde_json::json;
use setup_validate::EndpointProbe;
use setup_validate::ProbeReport;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Largest response body read from an endpoint.
const MAX_RESPONSE_BYTES: u64 = 64 * 1024;
/// User agent sent with every probe.
const USER_AGENT: &str = "setup-wizard/0.1";

// ============================================================================
// SECTION: Probe
// ============================================================================

/// [`EndpointProbe`] that calls `eth_chainId` over HTTP.
pub struct HttpRpcProbe {
    /// Shared blocking client.
    client: Client,
}

impl HttpRpcProbe {
    /// Builds a probe whose client gives up after `default_timeout`.
    ///
    /// # Errors
    ///
    /// Returns a message when the HTTP client cannot be built.
    pub fn new(default_timeout: Duration) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(default_timeout)
            .user_agent(USER_AGENT)
            .redirect(Policy::none())
            .build()
            .map_err(|_| "http client build failed".to_string())?;
        Ok(Self {
            client,
        })
    }

    /// Sends the request and extracts the chain id.
    fn call(&self, url: &str, timeout: Duration) -> Result<Option<u64>, String> {
        let url = Url::parse(url).map_err(|_| "invalid url".to_string())?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!("cannot probe \"{}\" endpoints", url.scheme()));
        }
        let body = json!({"jsonrpc": "2.0", "id": 1, "method": "eth_chainId", "params": []});
        let response = self
            .client
            .post(url)
            .timeout(timeout)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .map_err(|err| describe_send_error(&err))?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("http status {}", status.as_u16()));
        }
        let mut buf = Vec::new();
        response
            .take(MAX_RESPONSE_BYTES)
            .read_to_end(&mut buf)
            .map_err(|_| "failed to read response".to_string())?;
        Ok(parse_chain_id(&buf))
    }
}

impl EndpointProbe for HttpRpcProbe {
    fn probe(&self, url: &str, timeout: Duration) -> ProbeReport {
        let started = Instant::now();
        match self.call(url, timeout) {
            Ok(chain_id) => ProbeReport::reachable(started.elapsed(), chain_id),
            Err(error) => ProbeReport::unreachable(started.elapsed(), error),
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Classifies a send failure.
fn describe_send_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "timed out".to_string()
    } else if err.is_connect() {
        "connection failed".to_string()
    } else {
        "http request failed".to_string()
    }
}

/// Parses `{"result": "0x.."}` into a chain id.
fn parse_chain_id(body: &[u8]) -> Option<u64> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let hex = value.get("result")?.as_str()?;
    u64::from_str_radix(hex.trim_start_matches("0x"), 16).ok()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
