// crates/setup-validate/tests/common/mod.rs
// =============================================================================
// Module: Validate Test Helpers
// Description: Sample entities and a scripted probe for engine tests.
// Purpose: Exercise nested, container and conditional rules without a domain.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use setup_validate::EndpointProbe;
use setup_validate::Field;
use setup_validate::FieldValue;
use setup_validate::ProbeReport;
use setup_validate::Validate;

/// Endpoint entry with an enabled switch.
pub struct Endpoint {
    pub name: String,
    pub enabled: bool,
    pub urls: Vec<String>,
    pub port: Option<u16>,
}

impl Validate for Endpoint {
    fn field_rules(&self) -> Vec<Field<'_>> {
        vec![
            Field::new("name", "required", (&self.name).into()),
            Field::new(
                "urls",
                "req_if_enabled,ping_one,dive,strict_url",
                FieldValue::seq(&self.urls, |url| url.into()),
            ),
            Field::new("port", "opt_min=1024,opt_max=65535", self.port.into()),
        ]
    }

    fn is_enabled(&self) -> Option<bool> {
        Some(self.enabled)
    }
}

/// Settings block without an enabled notion.
pub struct Settings {
    pub mode: String,
    pub folder: String,
    pub retries: u32,
}

impl Validate for Settings {
    fn field_rules(&self) -> Vec<Field<'_>> {
        vec![
            Field::new("mode", "oneof=fast safe", (&self.mode).into()),
            Field::new("folder", "required,folder_exists", (&self.folder).into()),
            Field::new("retries", "min=1,max=5", self.retries.into()),
        ]
    }
}

/// Root document with nested and keyed children.
pub struct Document {
    pub settings: Settings,
    pub endpoints: BTreeMap<String, Endpoint>,
    pub tags: Vec<String>,
}

impl Validate for Document {
    fn field_rules(&self) -> Vec<Field<'_>> {
        vec![
            Field::new("settings", "", FieldValue::nested(&self.settings)),
            Field::new("endpoints", "required,dive", FieldValue::map(&self.endpoints, |e| {
                FieldValue::nested(e)
            })),
            Field::new("tags", "max=3,dive,endswith=.log", FieldValue::seq(&self.tags, |t| {
                t.into()
            })),
        ]
    }
}

/// Returns an endpoint with one valid URL.
pub fn endpoint(name: &str, enabled: bool) -> Endpoint {
    Endpoint {
        name: name.to_string(),
        enabled,
        urls: vec!["https://rpc.example.invalid".to_string()],
        port: None,
    }
}

/// Returns a document that passes the offline registry.
pub fn valid_document() -> Document {
    let mut endpoints = BTreeMap::new();
    endpoints.insert("primary".to_string(), endpoint("primary", true));
    Document {
        settings: Settings {
            mode: "fast".to_string(),
            folder: "/tmp".to_string(),
            retries: 2,
        },
        endpoints,
        tags: vec!["a.log".to_string()],
    }
}

/// Probe answering from a fixed reachability table and recording calls.
pub struct ScriptedProbe {
    pub reachable: Vec<String>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedProbe {
    pub fn new(reachable: &[&str]) -> Self {
        Self {
            reachable: reachable.iter().map(ToString::to_string).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or_default()
    }
}

impl EndpointProbe for ScriptedProbe {
    fn probe(&self, url: &str, _timeout: Duration) -> ProbeReport {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(url.to_string());
        }
        if self.reachable.iter().any(|candidate| candidate == url) {
            ProbeReport::reachable(Duration::from_millis(1), Some(1))
        } else {
            ProbeReport::unreachable(Duration::from_millis(1), "connection refused")
        }
    }
}
