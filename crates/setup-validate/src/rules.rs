// crates/setup-validate/src/rules.rs
// ============================================================================
// Module: Rule Directives
// Description: Parsing of per-field rule strings into ordered directives.
// Purpose: Turn `"required,oneof=a b,dive,strict_url"` into typed rules.
// Dependencies: none
// ============================================================================

//! ## Overview
//! A rule string is a comma separated list of directives. Each directive is a
//! validator name with an optional `=argument`. The `dive` marker splits the
//! list: directives before it apply to a container field itself, directives
//! after it apply to every element of the container.

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Marker directive separating container rules from element rules.
pub const DIVE: &str = "dive";

// ============================================================================
// SECTION: Types
// ============================================================================

/// A single named rule with an optional argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Validator name looked up in the registry.
    pub name: String,
    /// Declared argument (bound, enumeration, suffix).
    pub arg: Option<String>,
}

impl Rule {
    /// Returns true when this rule is the `dive` marker.
    #[must_use]
    pub fn is_dive(&self) -> bool {
        self.name == DIVE
    }
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

/// Parses a rule string into ordered directives.
///
/// Empty segments are ignored. Whitespace around names is trimmed; arguments
/// keep inner whitespace so enumerations can be space separated.
#[must_use]
pub fn parse_rules(text: &str) -> Vec<Rule> {
    text.split(',')
        .filter_map(|segment| {
            let segment = segment.trim();
            if segment.is_empty() {
                return None;
            }
            let (name, arg) = match segment.split_once('=') {
                Some((name, arg)) => (name.trim(), Some(arg.trim().to_string())),
                None => (segment, None),
            };
            if name.is_empty() {
                return None;
            }
            Some(Rule {
                name: name.to_string(),
                arg,
            })
        })
        .collect()
}

/// Splits directives at the first `dive` marker.
///
/// Returns the container rules and, when a marker is present, the element
/// rules. Element rules may contain further `dive` markers for nested
/// containers.
#[must_use]
pub fn split_dive(rules: &[Rule]) -> (&[Rule], Option<&[Rule]>) {
    match rules.iter().position(Rule::is_dive) {
        Some(index) => (&rules[..index], Some(&rules[index + 1..])),
        None => (rules, None),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
