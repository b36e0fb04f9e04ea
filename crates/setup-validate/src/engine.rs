// crates/setup-validate/src/engine.rs
// ============================================================================
// Module: Validation Walker
// Description: Recursive walk over described entities applying field rules.
// Purpose: Produce a flat, ordered list of field-scoped violations.
// Dependencies: crate::registry, crate::rules, crate::value, tracing
// ============================================================================

//! ## Overview
//! The walker visits every described field of an entity in declaration order.
//! Container rules run on the container, element rules (after `dive`) run on
//! each element, and nested entities are always entered. The walk never stops
//! at the first failure.
//!
//! Paths join field names with `.` and index containers with `[key]`, giving
//! paths such as `chains[mainnet].rpcs[0]`.

use tracing::warn;

use crate::error::FieldViolation;
use crate::error::ValidationErrors;
use crate::registry::RuleContext;
use crate::registry::ValidatorRegistry;
use crate::rules::Rule;
use crate::rules::parse_rules;
use crate::rules::split_dive;
use crate::value::FieldValue;
use crate::value::Validate;

// ============================================================================
// SECTION: Entry Points
// ============================================================================

/// Validates `target` against `registry`.
///
/// # Errors
///
/// Returns [`ValidationErrors`] holding every violation when any rule fails.
pub fn validate(
    target: &dyn Validate,
    registry: &ValidatorRegistry,
) -> Result<(), ValidationErrors> {
    let violations = collect(target, "", registry);
    if violations.is_empty() { Ok(()) } else { Err(ValidationErrors::new(violations)) }
}

/// Collects violations for `target`, prefixing every path with `path`.
///
/// `target` is both the root and the first entity visited, so conditional
/// rules see it as their root.
#[must_use]
pub fn collect(
    target: &dyn Validate,
    path: &str,
    registry: &ValidatorRegistry,
) -> Vec<FieldViolation> {
    let mut walker = Walker {
        registry,
        root: target,
        violations: Vec::new(),
    };
    walker.walk_entity(target, path);
    walker.violations
}

// ============================================================================
// SECTION: Walker
// ============================================================================

/// Walk state for one validation pass.
struct Walker<'r, 'a> {
    /// Validators to dispatch to.
    registry: &'r ValidatorRegistry,
    /// Root entity handed to every rule.
    root: &'a dyn Validate,
    /// Violations collected so far.
    violations: Vec<FieldViolation>,
}

impl<'a> Walker<'_, 'a> {
    /// Visits every described field of `entity`.
    fn walk_entity(&mut self, entity: &'a dyn Validate, path: &str) {
        for field in entity.field_rules() {
            let field_path = join_field(path, field.name);
            let rules = parse_rules(field.rules);
            self.check(entity, &field.value, &rules, &field_path);
        }
    }

    /// Applies `rules` to `value`, then descends into it.
    fn check(
        &mut self,
        parent: &'a dyn Validate,
        value: &FieldValue<'a>,
        rules: &[Rule],
        path: &str,
    ) {
        let (container_rules, element_rules) = split_dive(rules);
        self.apply(parent, value, container_rules, path);
        match value {
            FieldValue::Struct(nested) => self.walk_entity(*nested, path),
            FieldValue::Seq(items) => {
                for (index, item) in items.iter().enumerate() {
                    let item_path = format!("{path}[{index}]");
                    self.check_element(parent, item, element_rules, &item_path);
                }
            }
            FieldValue::Map(entries) => {
                for (key, item) in entries {
                    let item_path = format!("{path}[{key}]");
                    self.check_element(parent, item, element_rules, &item_path);
                }
            }
            FieldValue::Absent | FieldValue::Bool(_) | FieldValue::Int(_) | FieldValue::Str(_) => {
                if element_rules.is_some() {
                    warn!(path = %path, kind = value.kind(), "dive rule on a non-container field");
                }
            }
        }
    }

    /// Checks one container element.
    fn check_element(
        &mut self,
        parent: &'a dyn Validate,
        item: &FieldValue<'a>,
        element_rules: Option<&[Rule]>,
        path: &str,
    ) {
        match (element_rules, item) {
            (Some(rules), _) => self.check(parent, item, rules, path),
            (None, FieldValue::Struct(nested)) => self.walk_entity(*nested, path),
            (None, _) => {}
        }
    }

    /// Runs each named rule, recording failures and skipping unknown names.
    fn apply(
        &mut self,
        parent: &'a dyn Validate,
        value: &FieldValue<'a>,
        rules: &[Rule],
        path: &str,
    ) {
        for rule in rules {
            let Some(validator) = self.registry.get(&rule.name) else {
                warn!(rule = %rule.name, path = %path, "unknown validation rule skipped");
                continue;
            };
            let ctx = RuleContext {
                value,
                arg: rule.arg.as_deref(),
                path,
                parent,
                root: self.root,
            };
            if let Err(message) = validator(&ctx) {
                self.violations.push(FieldViolation::new(path, rule.name.as_str(), message));
            }
        }
    }
}

/// Joins a parent path and a field name.
fn join_field(path: &str, name: &str) -> String {
    if path.is_empty() { name.to_string() } else { format!("{path}.{name}") }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
