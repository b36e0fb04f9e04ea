// crates/setup-draft/src/service.rs
// ============================================================================
// Module: Draft Service
// Description: Facade over store, session guard, phases and promotion.
// Purpose: The operations an editing surface calls, one owned instance.
// Dependencies: setup-config, setup-validate, tracing
// ============================================================================

//! ## Overview
//! [`DraftService`] is constructed once per process and handed to every
//! handler. Mutating operations present a session id first; reads and
//! validation do not. Corrupt drafts read as absent, and the one-time notice
//! is available through [`DraftService::take_corruption_notice`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use setup_config::Config;
use setup_config::ConfigError;
use setup_config::FileLiveConfig;
use setup_config::KnownChains;
use setup_config::LiveConfigSource;
use setup_config::StaticChainTable;
use setup_config::WizardSettings;
use setup_config::estimate;
use setup_validate::EndpointProbe;
use tracing::info;
use tracing::warn;

use crate::apply::ApplyReport;
use crate::apply::LiveConfigWriter;
use crate::apply::Promoter;
use crate::apply::YamlLiveWriter;
use crate::audit::DraftAuditEvent;
use crate::audit::DraftAuditSink;
use crate::audit::sink_from_settings;
use crate::draft::Draft;
use crate::error::ApplyError;
use crate::error::DraftStoreError;
use crate::error::ServiceError;
use crate::error::SessionRejection;
use crate::layout::DraftLayout;
use crate::phase::FieldError;
use crate::phase::Phase;
use crate::phase::advisories;
use crate::phase::validate_phase_with;
use crate::probe::HttpRpcProbe;
use crate::session::SessionGuard;
use crate::session::SessionOutcome;
use crate::store::CorruptionNotice;
use crate::store::DraftStore;

// ============================================================================
// SECTION: Construction
// ============================================================================

/// Collaborators and limits for a [`DraftService`].
pub struct DraftServiceParams {
    /// File names beside the live configuration.
    pub layout: DraftLayout,
    /// Live configuration reader used to seed drafts.
    pub live: Arc<dyn LiveConfigSource>,
    /// Live configuration writer used by promotion.
    pub writer: Arc<dyn LiveConfigWriter>,
    /// Endpoint probe used for advisories.
    pub probe: Arc<dyn EndpointProbe>,
    /// Known-chains table.
    pub chains: Arc<dyn KnownChains>,
    /// Audit sink.
    pub audit: Arc<dyn DraftAuditSink>,
    /// Session inactivity window.
    pub inactivity_window: Duration,
    /// Maximum corruption notice age.
    pub notice_max_age: Duration,
    /// Timeout handed to the probe.
    pub probe_timeout: Duration,
    /// Data folder seeded into fresh drafts.
    pub default_data_folder: Option<String>,
    /// Skip probing entirely.
    pub test_mode: bool,
}

/// Draft lifecycle facade.
pub struct DraftService {
    /// Draft persistence.
    store: DraftStore,
    /// Single editing session.
    session: SessionGuard,
    /// Live configuration reader.
    live: Arc<dyn LiveConfigSource>,
    /// Live configuration writer.
    writer: Arc<dyn LiveConfigWriter>,
    /// Endpoint probe.
    probe: Arc<dyn EndpointProbe>,
    /// Known-chains table.
    chains: Arc<dyn KnownChains>,
    /// Audit sink.
    audit: Arc<dyn DraftAuditSink>,
    /// Session inactivity window.
    inactivity_window: Duration,
    /// Timeout handed to the probe.
    probe_timeout: Duration,
    /// Data folder seeded into fresh drafts.
    default_data_folder: Option<String>,
    /// Skip probing entirely.
    test_mode: bool,
}

impl DraftService {
    /// Creates a service from explicit collaborators.
    #[must_use]
    pub fn new(params: DraftServiceParams) -> Self {
        let store = DraftStore::new(
            params.layout,
            Arc::clone(&params.chains),
            Arc::clone(&params.audit),
            params.notice_max_age,
        );
        Self {
            store,
            session: SessionGuard::new(Arc::clone(&params.audit)),
            live: params.live,
            writer: params.writer,
            probe: params.probe,
            chains: params.chains,
            audit: params.audit,
            inactivity_window: params.inactivity_window,
            probe_timeout: params.probe_timeout,
            default_data_folder: params.default_data_folder,
            test_mode: params.test_mode,
        }
    }

    /// Creates the production service described by `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Config`] when the audit sink or the HTTP probe
    /// cannot be built.
    pub fn from_settings(settings: &WizardSettings) -> Result<Self, ServiceError> {
        let live_path = settings.live_path();
        let audit = sink_from_settings(&settings.audit)
            .map_err(|err| ConfigError::Io(format!("audit sink: {err}")))?;
        let probe = HttpRpcProbe::new(settings.probe_timeout()).map_err(ConfigError::Invalid)?;
        Ok(Self::new(DraftServiceParams {
            layout: DraftLayout::for_live_path(&live_path),
            live: Arc::new(FileLiveConfig::new(live_path)),
            writer: Arc::new(YamlLiveWriter),
            probe: Arc::new(probe),
            chains: Arc::new(StaticChainTable),
            audit,
            inactivity_window: settings.inactivity_window(),
            notice_max_age: settings.notice_max_age(),
            probe_timeout: settings.probe_timeout(),
            default_data_folder: settings.paths.default_data_folder.clone(),
            test_mode: settings.test_mode,
        }))
    }

    /// Returns the draft store.
    #[must_use]
    pub const fn store(&self) -> &DraftStore {
        &self.store
    }

    /// Returns the live configuration path.
    #[must_use]
    pub fn live_path(&self) -> PathBuf {
        self.store.layout().live_path()
    }

    // ========================================================================
    // SECTION: Reads
    // ========================================================================

    /// Returns the current draft; corrupt drafts are archived and read as
    /// absent.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] for I/O failures.
    pub fn get_draft(&self) -> Result<Option<Draft>, ServiceError> {
        match self.store.load() {
            Ok(draft) => Ok(draft),
            Err(DraftStoreError::Corrupt {
                reason, ..
            }) => {
                info!(reason = %reason, "corrupt draft archived; reading as absent");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Validates `draft` for `phase`.
    #[must_use]
    pub fn validate_phase(&self, draft: &Draft, phase: Phase) -> Vec<FieldError> {
        validate_phase_with(draft, phase, self.chains.as_ref())
    }

    /// Probes the enabled chains' endpoints; empty in test mode.
    #[must_use]
    pub fn advisories(&self, draft: &Draft) -> Vec<FieldError> {
        if self.test_mode {
            return Vec::new();
        }
        advisories(draft, self.probe.as_ref(), self.probe_timeout)
    }

    /// Consumes the one-time corruption notice.
    #[must_use]
    pub fn take_corruption_notice(&self) -> Option<CorruptionNotice> {
        self.store.take_corruption_notice()
    }

    /// Presents `session_id` to the guard with the configured window.
    pub fn enforce_session(&self, session_id: &str) -> SessionOutcome {
        self.session.enforce(session_id, self.inactivity_window)
    }

    // ========================================================================
    // SECTION: Writes
    // ========================================================================

    /// Returns the draft, seeding and saving one when none exists.
    ///
    /// Seeds from the live configuration when present, else from defaults
    /// with the configured data folder.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when the session is refused or the save
    /// fails.
    pub fn open_draft(&self, session_id: &str) -> Result<Draft, ServiceError> {
        self.authorize(session_id)?;
        if let Some(draft) = self.get_draft()? {
            return Ok(draft);
        }
        let mut draft = Draft::new(self.seed_config());
        self.stamp(&mut draft, session_id);
        self.store.save(&mut draft)?;
        Ok(draft)
    }

    /// Saves `draft` on behalf of `session_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when the session is refused or the save
    /// fails.
    pub fn save_draft(&self, session_id: &str, draft: &mut Draft) -> Result<(), ServiceError> {
        self.authorize(session_id)?;
        self.stamp(draft, session_id);
        self.store.save(draft)?;
        Ok(())
    }

    /// Promotes the draft and releases the session.
    ///
    /// A draft that cannot be removed after the live file was replaced still
    /// counts as promoted: the event is recorded and the session released
    /// before [`ApplyError::Cleanup`] is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when the session is refused or promotion
    /// fails.
    pub fn apply_draft(&self, session_id: &str) -> Result<ApplyReport, ServiceError> {
        self.authorize(session_id)?;
        let promoter = Promoter::new(&self.store, self.writer.as_ref(), self.chains.as_ref());
        let report = match promoter.apply() {
            Ok(report) => report,
            Err(ApplyError::Cleanup(reason)) => {
                // The live file is already replaced; only the draft lingers.
                warn!(reason = %reason, "draft left behind after promotion");
                self.finish_promotion(session_id, &self.live_path());
                return Err(ApplyError::Cleanup(reason).into());
            }
            Err(err) => return Err(err.into()),
        };
        self.finish_promotion(session_id, &report.live_path);
        Ok(report)
    }

    /// Deletes the draft and clears the corruption flag; the live
    /// configuration is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when the session is refused or a file cannot
    /// be removed.
    pub fn reset_draft(&self, session_id: &str) -> Result<(), ServiceError> {
        self.authorize(session_id)?;
        self.store.remove()?;
        self.store.clear_corruption_flag()?;
        self.audit.record(&DraftAuditEvent::draft_reset(session_id));
        Ok(())
    }

    // ========================================================================
    // SECTION: Helpers
    // ========================================================================

    /// Enforces the session, turning refusals into errors.
    fn authorize(&self, session_id: &str) -> Result<SessionOutcome, SessionRejection> {
        self.enforce_session(session_id).into_result()
    }

    /// Records the promotion and hands the session back.
    fn finish_promotion(&self, session_id: &str, live_path: &Path) {
        self.audit.record(&DraftAuditEvent::draft_promoted(Some(session_id), live_path));
        self.session.release(session_id);
    }

    /// Refreshes the draft's session and estimates.
    fn stamp(&self, draft: &mut Draft, session_id: &str) {
        session_id.trim().clone_into(&mut draft.meta.session);
        draft.meta.estimates = estimate(&draft.config, self.chains.as_ref());
    }

    /// Returns the document a fresh draft starts from.
    fn seed_config(&self) -> Config {
        match self.live.read_live() {
            Ok(Some(config)) => return config,
            Ok(None) => {}
            Err(err) => warn!(error = %err, "live config unreadable; seeding defaults"),
        }
        let mut config = Config::default();
        if let Some(folder) = &self.default_data_folder {
            config.general.data_folder.clone_from(folder);
        }
        config
    }
}

