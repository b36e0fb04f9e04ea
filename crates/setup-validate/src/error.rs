// crates/setup-validate/src/error.rs
// ============================================================================
// Module: Validation Errors
// Description: Field-scoped violations and their aggregate error type.
// Purpose: Report every violated directive at once.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A [`FieldViolation`] records the path, the rule that failed and a human
//! message. [`ValidationErrors`] aggregates them in walk order.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Violation
// ============================================================================

/// One failed rule on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    /// Dotted field path, e.g. `chains[mainnet].rpcs[0]`.
    pub path: String,
    /// Name of the rule that failed.
    pub rule: String,
    /// Human-readable message.
    pub message: String,
}

impl FieldViolation {
    /// Creates a violation.
    #[must_use]
    pub fn new(
        path: impl Into<String>,
        rule: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            rule: rule.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.path, self.message, self.rule)
    }
}

// ============================================================================
// SECTION: Aggregate
// ============================================================================

/// Every violation collected by one walk.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed: {}", render_violations(.violations))]
pub struct ValidationErrors {
    /// Violations in walk order.
    violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    /// Wraps collected violations.
    #[must_use]
    pub const fn new(violations: Vec<FieldViolation>) -> Self {
        Self {
            violations,
        }
    }

    /// Returns the violations in walk order.
    #[must_use]
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Consumes the aggregate and returns its violations.
    #[must_use]
    pub fn into_violations(self) -> Vec<FieldViolation> {
        self.violations
    }

    /// Returns the violations recorded for one path.
    pub fn for_path<'s>(&'s self, path: &'s str) -> impl Iterator<Item = &'s FieldViolation> + 's {
        self.violations.iter().filter(move |violation| violation.path == path)
    }

    /// Returns the number of violations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true when nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Joins violations into one line.
fn render_violations(violations: &[FieldViolation]) -> String {
    violations.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}
