// crates/setup-draft/tests/common/mod.rs
// =============================================================================
// Module: Draft Test Helpers
// Description: Temp-dir services, recording sinks and scripted probes.
// Purpose: Build isolated draft lifecycles for integration suites.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use setup_config::Config;
use setup_config::FileLiveConfig;
use setup_config::StaticChainTable;
use setup_draft::DraftAuditEvent;
use setup_draft::DraftAuditSink;
use setup_draft::DraftLayout;
use setup_draft::DraftService;
use setup_draft::DraftServiceParams;
use setup_draft::DraftStore;
use setup_draft::LiveConfigWriter;
use setup_draft::YamlLiveWriter;
use setup_validate::EndpointProbe;
use setup_validate::ProbeReport;
use tempfile::TempDir;

/// Live configuration file name used by every fixture.
pub const LIVE_FILE: &str = "config.yaml";
/// Window long enough that no test reaches it by accident.
pub const LONG_WINDOW: Duration = Duration::from_secs(300);

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Audit sink that keeps every event in memory.
#[derive(Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<DraftAuditEvent>>,
}

impl MemoryAuditSink {
    /// Returns the recorded event names in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|event| event.event).collect()
    }

    /// Returns a copy of every recorded event.
    pub fn events(&self) -> Vec<DraftAuditEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl DraftAuditSink for MemoryAuditSink {
    fn record(&self, event: &DraftAuditEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// ============================================================================
// SECTION: Probe
// ============================================================================

/// Probe answering from a fixed table; unknown URLs are unreachable.
#[derive(Default)]
pub struct ScriptedProbe {
    answers: BTreeMap<String, Option<u64>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProbe {
    /// Makes `url` reachable and report `chain_id`.
    pub fn answer(mut self, url: &str, chain_id: Option<u64>) -> Self {
        self.answers.insert(url.to_string(), chain_id);
        self
    }

    /// Returns the probed URLs in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl EndpointProbe for ScriptedProbe {
    fn probe(&self, url: &str, _timeout: Duration) -> ProbeReport {
        self.calls.lock().unwrap().push(url.to_string());
        match self.answers.get(url) {
            Some(chain_id) => ProbeReport::reachable(Duration::from_millis(1), *chain_id),
            None => ProbeReport::unreachable(Duration::from_millis(1), "connection refused"),
        }
    }
}

// ============================================================================
// SECTION: Writers
// ============================================================================

/// Writer that leaves an empty live file behind.
pub struct TruncatingWriter;

impl LiveConfigWriter for TruncatingWriter {
    fn write_live(&self, path: &Path, _config: &Config) -> io::Result<()> {
        fs::write(path, b"")
    }
}

/// Writer that promotes normally, then turns the draft path into a
/// non-empty directory so the draft cannot be removed.
pub struct DraftPinningWriter;

impl LiveConfigWriter for DraftPinningWriter {
    fn write_live(&self, path: &Path, config: &Config) -> io::Result<()> {
        YamlLiveWriter.write_live(path, config)?;
        let draft = DraftLayout::for_live_path(path).draft_path();
        fs::remove_file(&draft)?;
        fs::create_dir(&draft)?;
        fs::write(draft.join("pinned"), b"x")?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Isolated draft lifecycle rooted in a temp dir.
pub struct Fixture {
    pub dir: TempDir,
    pub audit: Arc<MemoryAuditSink>,
    pub service: DraftService,
}

impl Fixture {
    /// Returns the config directory.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Returns the live configuration path.
    pub fn live_path(&self) -> PathBuf {
        self.dir.path().join(LIVE_FILE)
    }

    /// Returns the draft path.
    pub fn draft_path(&self) -> PathBuf {
        self.service.store().layout().draft_path()
    }

    /// Returns a data folder path inside the temp dir that does not exist yet.
    pub fn data_folder(&self) -> String {
        self.dir.path().join("data").display().to_string()
    }
}

/// Options for [`fixture_with`].
pub struct FixtureOptions {
    pub window: Duration,
    pub writer: Arc<dyn LiveConfigWriter>,
    pub probe: Arc<dyn EndpointProbe>,
    pub test_mode: bool,
    pub seed_data_folder: bool,
}

impl Default for FixtureOptions {
    fn default() -> Self {
        Self {
            window: LONG_WINDOW,
            writer: Arc::new(YamlLiveWriter),
            probe: Arc::new(ScriptedProbe::default()),
            test_mode: false,
            seed_data_folder: true,
        }
    }
}

/// Builds a fixture with default options.
pub fn fixture() -> Fixture {
    fixture_with(FixtureOptions::default())
}

/// Builds a fixture with `options`.
pub fn fixture_with(options: FixtureOptions) -> Fixture {
    let dir = TempDir::new().unwrap();
    let audit = Arc::new(MemoryAuditSink::default());
    let live_path = dir.path().join(LIVE_FILE);
    let default_data_folder =
        options.seed_data_folder.then(|| dir.path().join("data").display().to_string());
    let service = DraftService::new(DraftServiceParams {
        layout: DraftLayout::new(dir.path(), LIVE_FILE),
        live: Arc::new(FileLiveConfig::new(live_path)),
        writer: options.writer,
        probe: options.probe,
        chains: Arc::new(StaticChainTable),
        audit: Arc::clone(&audit) as Arc<dyn DraftAuditSink>,
        inactivity_window: options.window,
        notice_max_age: Duration::from_secs(600),
        probe_timeout: Duration::from_millis(200),
        default_data_folder,
        test_mode: options.test_mode,
    });
    Fixture {
        dir,
        audit,
        service,
    }
}

/// Builds a bare store in `dir`.
pub fn store_in(dir: &Path, audit: Arc<MemoryAuditSink>, notice_max_age: Duration) -> DraftStore {
    DraftStore::new(
        DraftLayout::new(dir, LIVE_FILE),
        Arc::new(StaticChainTable),
        audit,
        notice_max_age,
    )
}

/// Returns a document that passes every phase.
pub fn valid_config(data_folder: &str) -> Config {
    let mut config = Config::default();
    config.general.data_folder = data_folder.to_string();
    if let Some(chain) = config.chains.get_mut("mainnet") {
        chain.rpcs = vec!["http://localhost:8545".to_string()];
    }
    config
}
