// crates/setup-validate/src/lib.rs
// ============================================================================
// Module: Setup Validate Library
// Description: Declarative field-rule validation for configuration documents.
// Purpose: Reusable constraint checker with no knowledge of drafts or wizards.
// Dependencies: serde, thiserror, tracing, url
// ============================================================================

//! ## Overview
//! `setup-validate` walks any entity that implements [`Validate`], collects the
//! rule directives attached to each field, and runs the named validators from a
//! [`ValidatorRegistry`]. Every violation is returned together so one
//! submission can report every problem at once.
//!
//! Rules are declared as compact strings (`"req_if_enabled,dive,strict_url"`)
//! next to the field values an entity exposes; the `dive` marker separates
//! rules for a container from rules for each of its elements.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod builtins;
pub mod engine;
pub mod error;
pub mod probe;
pub mod registry;
pub mod rules;
pub mod value;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use engine::collect;
pub use engine::validate;
pub use error::FieldViolation;
pub use error::ValidationErrors;
pub use probe::EndpointProbe;
pub use probe::ProbeReport;
pub use registry::RegistryOptions;
pub use registry::RuleContext;
pub use registry::ValidatorFn;
pub use registry::ValidatorRegistry;
pub use rules::Rule;
pub use rules::parse_rules;
pub use rules::split_dive;
pub use value::Field;
pub use value::FieldValue;
pub use value::Validate;
