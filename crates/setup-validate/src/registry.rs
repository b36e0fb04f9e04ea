// crates/setup-validate/src/registry.rs
// ============================================================================
// Module: Validator Registry
// Description: Maps rule names to validator functions.
// Purpose: Explicit dispatch table replacing reflection-driven lookup.
// Dependencies: crate::builtins, crate::probe
// ============================================================================

//! ## Overview
//! A [`ValidatorRegistry`] owns the table of named validators. The standard
//! table registers every built-in rule; options decide whether rules that
//! touch the filesystem or the network are live or inert. An inert rule is
//! still *known*, so it never triggers the unknown-rule diagnostic.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::builtins;
use crate::probe::EndpointProbe;
use crate::value::FieldValue;
use crate::value::Validate;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default timeout handed to the probe by `ping_one`.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

// ============================================================================
// SECTION: Rule Context
// ============================================================================

/// Everything a validator sees for one rule on one field.
pub struct RuleContext<'a> {
    /// Field value under test.
    pub value: &'a FieldValue<'a>,
    /// Declared rule argument.
    pub arg: Option<&'a str>,
    /// Contextual path of the field.
    pub path: &'a str,
    /// Entity that declared the field.
    pub parent: &'a dyn Validate,
    /// Root of the walk.
    pub root: &'a dyn Validate,
}

impl RuleContext<'_> {
    /// Returns the argument or an error naming the rule that needs one.
    ///
    /// # Errors
    ///
    /// Returns a message when the rule was declared without an argument.
    pub fn require_arg(&self, rule: &str) -> Result<&str, String> {
        self.arg
            .filter(|arg| !arg.is_empty())
            .ok_or_else(|| format!("rule {rule} declared without an argument"))
    }
}

/// Signature of a registered validator.
pub type ValidatorFn = Box<dyn Fn(&RuleContext<'_>) -> Result<(), String> + Send + Sync>;

// ============================================================================
// SECTION: Options
// ============================================================================

/// Switches for the built-in rules with side effects.
#[derive(Clone)]
pub struct RegistryOptions {
    /// Skip liveness probing entirely (automated test runs).
    pub test_mode: bool,
    /// Allow `folder_exists` to inspect and create directories.
    pub filesystem: bool,
    /// Probe used by `ping_one`; `None` leaves the rule inert.
    pub probe: Option<Arc<dyn EndpointProbe>>,
    /// Timeout handed to the probe.
    pub probe_timeout: Duration,
}

impl RegistryOptions {
    /// Options with every side-effecting rule inert.
    #[must_use]
    pub const fn offline() -> Self {
        Self {
            test_mode: false,
            filesystem: false,
            probe: None,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            filesystem: true,
            ..Self::offline()
        }
    }
}

impl fmt::Debug for RegistryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryOptions")
            .field("test_mode", &self.test_mode)
            .field("filesystem", &self.filesystem)
            .field("probe", &self.probe.is_some())
            .field("probe_timeout", &self.probe_timeout)
            .finish()
    }
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Table of named validators.
pub struct ValidatorRegistry {
    /// Validators keyed by rule name.
    validators: BTreeMap<String, ValidatorFn>,
}

impl ValidatorRegistry {
    /// Creates a registry with no validators.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            validators: BTreeMap::new(),
        }
    }

    /// Creates the standard registry with every built-in rule.
    #[must_use]
    pub fn standard(options: RegistryOptions) -> Self {
        let mut registry = Self::empty();
        registry.register("required", builtins::required);
        registry.register("req_if_enabled", builtins::req_if_enabled);
        registry.register("oneof", builtins::oneof);
        registry.register("min", builtins::min);
        registry.register("max", builtins::max);
        registry.register("opt_min", builtins::opt_min);
        registry.register("opt_max", builtins::opt_max);
        registry.register("endswith", builtins::endswith);
        registry.register("strict_url", builtins::strict_url);

        let filesystem = options.filesystem;
        registry.register("folder_exists", move |ctx| {
            if filesystem { builtins::folder_exists(ctx) } else { Ok(()) }
        });

        let probe = if options.test_mode { None } else { options.probe };
        let timeout = options.probe_timeout;
        registry.register("ping_one", move |ctx| match &probe {
            Some(probe) => builtins::ping_one(ctx, probe.as_ref(), timeout),
            None => Ok(()),
        });
        registry
    }

    /// Creates the standard registry with filesystem and network rules inert.
    #[must_use]
    pub fn offline() -> Self {
        Self::standard(RegistryOptions::offline())
    }

    /// Registers (or replaces) a validator under `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, validator: F)
    where
        F: Fn(&RuleContext<'_>) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validators.insert(name.into(), Box::new(validator));
    }

    /// Returns true when `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.validators.contains_key(name)
    }

    /// Returns the registered rule names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.validators.keys().map(String::as_str)
    }

    /// Looks up a validator.
    pub(crate) fn get(&self, name: &str) -> Option<&ValidatorFn> {
        self.validators.get(name)
    }
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::standard(RegistryOptions::default())
    }
}

impl fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.validators.keys()).finish()
    }
}
