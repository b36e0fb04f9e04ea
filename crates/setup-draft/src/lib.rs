// crates/setup-draft/src/lib.rs
// ============================================================================
// Module: Setup Draft Library
// Description: Draft configuration lifecycle for the setup wizard.
// Purpose: Persist, guard, validate and promote the working draft.
// Dependencies: reqwest, serde, setup-config, setup-validate, time, tracing
// ============================================================================

//! ## Overview
//! A draft is a full configuration document saved beside the live file while
//! an operator works through the wizard. `setup-draft` keeps that draft
//! durable across crashes ([`DraftStore`]), admits one editing session at a
//! time ([`SessionGuard`]), validates each wizard step ([`validate_phase`])
//! and replaces the live configuration only with a fully valid draft
//! ([`Promoter`]). [`DraftService`] wires these together for a handler.
//!
//! Security posture: draft and live files are local operator input; loads
//! are size-capped and fail closed, endpoint probes never follow redirects.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod apply;
pub mod atomic;
pub mod audit;
pub mod draft;
pub mod error;
pub mod layout;
pub mod phase;
pub mod probe;
pub mod service;
pub mod session;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use apply::ApplyReport;
pub use apply::LiveConfigWriter;
pub use apply::Promoter;
pub use apply::YamlLiveWriter;
pub use atomic::write_atomic;
pub use audit::DraftAuditEvent;
pub use audit::DraftAuditSink;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use audit::sink_from_settings;
pub use draft::DRAFT_SCHEMA_VERSION;
pub use draft::Draft;
pub use draft::DraftMeta;
pub use error::ApplyError;
pub use error::DraftStoreError;
pub use error::ServiceError;
pub use error::SessionRejection;
pub use layout::DraftLayout;
pub use phase::FieldError;
pub use phase::Phase;
pub use phase::advisories;
pub use phase::codes;
pub use phase::validate_phase;
pub use phase::validate_phase_with;
pub use probe::HttpRpcProbe;
pub use service::DraftService;
pub use service::DraftServiceParams;
pub use session::SessionGuard;
pub use session::SessionOutcome;
pub use session::SessionRecord;
pub use store::CorruptionNotice;
pub use store::DraftStore;
