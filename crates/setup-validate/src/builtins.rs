// crates/setup-validate/src/builtins.rs
// ============================================================================
// Module: Built-in Validators
// Description: Standard rule implementations registered by name.
// Purpose: Membership, bounds, suffix, conditional, URL, folder and liveness.
// Dependencies: crate::registry, crate::probe, url
// ============================================================================

//! ## Overview
//! Each validator returns `Ok(())` or a human message; the walker attaches the
//! path and rule name. Rules treat an unset value as "nothing to check" unless
//! their whole purpose is presence (`required`, `req_if_enabled`).

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::probe::EndpointProbe;
use crate::registry::RuleContext;
use crate::value::FieldValue;

/// URL schemes accepted by `strict_url`.
const STRICT_URL_SCHEMES: &[&str] = &["http", "https", "ws", "wss"];

// ============================================================================
// SECTION: Presence
// ============================================================================

/// `required`: the value must be set and non-blank.
///
/// # Errors
///
/// Returns a message when the value is empty.
pub fn required(ctx: &RuleContext<'_>) -> Result<(), String> {
    if ctx.value.is_empty() { Err("is required".to_string()) } else { Ok(()) }
}

/// `req_if_enabled`: `required`, but only while the declaring entity reports
/// itself enabled.
///
/// # Errors
///
/// Returns a message when the entity is enabled and the value is empty.
pub fn req_if_enabled(ctx: &RuleContext<'_>) -> Result<(), String> {
    if ctx.parent.is_enabled() == Some(false) {
        return Ok(());
    }
    if ctx.value.is_empty() { Err("is required when enabled".to_string()) } else { Ok(()) }
}

// ============================================================================
// SECTION: Membership & Bounds
// ============================================================================

/// `oneof=a b c`: the value must be one of the space separated choices.
///
/// # Errors
///
/// Returns a message listing the choices when the value is not one of them.
pub fn oneof(ctx: &RuleContext<'_>) -> Result<(), String> {
    let arg = ctx.require_arg("oneof")?;
    let actual = match ctx.value {
        FieldValue::Str(text) => (*text).to_string(),
        FieldValue::Int(value) => value.to_string(),
        FieldValue::Absent => String::new(),
        other => return Err(format!("oneof does not apply to {}", other.kind())),
    };
    if arg.split_whitespace().any(|choice| choice == actual) {
        return Ok(());
    }
    let choices = arg.split_whitespace().collect::<Vec<_>>().join(", ");
    Err(format!("must be one of [{choices}], got \"{actual}\""))
}

/// `min=N`: integers, text length and container length must be at least N.
///
/// # Errors
///
/// Returns a message when the measure is below the bound.
pub fn min(ctx: &RuleContext<'_>) -> Result<(), String> {
    let bound = parse_bound(ctx.require_arg("min")?)?;
    let measure = ctx.value.measure().unwrap_or(0);
    if measure < bound { Err(format!("must be at least {bound}, got {measure}")) } else { Ok(()) }
}

/// `max=N`: integers, text length and container length must be at most N.
///
/// # Errors
///
/// Returns a message when the measure is above the bound.
pub fn max(ctx: &RuleContext<'_>) -> Result<(), String> {
    let bound = parse_bound(ctx.require_arg("max")?)?;
    let measure = ctx.value.measure().unwrap_or(0);
    if measure > bound { Err(format!("must be at most {bound}, got {measure}")) } else { Ok(()) }
}

/// `opt_min=N`: like `min`, but only enforced when the value is set.
///
/// # Errors
///
/// Returns a message when a set value is below the bound.
pub fn opt_min(ctx: &RuleContext<'_>) -> Result<(), String> {
    if ctx.value.is_empty() { Ok(()) } else { min(ctx) }
}

/// `opt_max=N`: like `max`, but only enforced when the value is set.
///
/// # Errors
///
/// Returns a message when a set value is above the bound.
pub fn opt_max(ctx: &RuleContext<'_>) -> Result<(), String> {
    if ctx.value.is_empty() { Ok(()) } else { max(ctx) }
}

/// `endswith=suffix`: non-blank text must end with the suffix.
///
/// # Errors
///
/// Returns a message when the text does not end with the suffix.
pub fn endswith(ctx: &RuleContext<'_>) -> Result<(), String> {
    let suffix = ctx.require_arg("endswith")?;
    match ctx.value.as_str() {
        Some(text) if !text.trim().is_empty() && !text.ends_with(suffix) => {
            Err(format!("must end with \"{suffix}\""))
        }
        _ => Ok(()),
    }
}

// ============================================================================
// SECTION: URLs
// ============================================================================

/// `strict_url`: the value must be an absolute URL with a host and a known
/// scheme.
///
/// # Errors
///
/// Returns a message describing why the URL was rejected.
pub fn strict_url(ctx: &RuleContext<'_>) -> Result<(), String> {
    let Some(text) = ctx.value.as_str() else {
        return Err(format!("strict_url does not apply to {}", ctx.value.kind()));
    };
    let text = text.trim();
    let url = Url::parse(text).map_err(|err| format!("is not a valid url: {err}"))?;
    if !STRICT_URL_SCHEMES.contains(&url.scheme()) {
        return Err(format!("has unsupported scheme \"{}\"", url.scheme()));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err("url has no host".to_string());
    }
    Ok(())
}

// ============================================================================
// SECTION: Filesystem
// ============================================================================

/// `folder_exists`: the path must be a directory, or be creatable.
///
/// A leading `~/` expands to `$HOME`. Missing folders are created when the
/// process can write their parent.
///
/// # Errors
///
/// Returns a message when the path names a file or cannot be created.
pub fn folder_exists(ctx: &RuleContext<'_>) -> Result<(), String> {
    let Some(text) = ctx.value.as_str() else {
        return Ok(());
    };
    if text.trim().is_empty() {
        return Ok(());
    }
    let path = expand_home(text.trim());
    if path.is_dir() {
        return Ok(());
    }
    if path.exists() {
        return Err(format!("{} is not a folder", path.display()));
    }
    fs::create_dir_all(&path).map_err(|err| {
        format!("folder {} does not exist and cannot be created: {err}", path.display())
    })
}

/// Expands a leading `~/` using `$HOME`.
#[must_use]
pub fn expand_home(text: &str) -> PathBuf {
    if let Some(rest) = text.strip_prefix("~/")
        && let Ok(home) = env::var("HOME")
    {
        return Path::new(&home).join(rest);
    }
    PathBuf::from(text)
}

// ============================================================================
// SECTION: Liveness
// ============================================================================

/// `ping_one`: at least one of the endpoint URLs must answer the probe.
///
/// Empty lists pass; presence is the job of `required`.
///
/// # Errors
///
/// Returns a message when no endpoint answered.
pub fn ping_one(
    ctx: &RuleContext<'_>,
    probe: &dyn EndpointProbe,
    timeout: Duration,
) -> Result<(), String> {
    let urls: Vec<&str> = match ctx.value {
        FieldValue::Str(text) => vec![*text],
        FieldValue::Seq(items) => items.iter().filter_map(FieldValue::as_str).collect(),
        _ => Vec::new(),
    };
    if urls.is_empty() {
        return Ok(());
    }
    let mut last_error = None;
    for url in &urls {
        let report = probe.probe(url, timeout);
        if report.reachable {
            return Ok(());
        }
        last_error = report.error;
    }
    Err(format!(
        "none of {} endpoint(s) answered{}",
        urls.len(),
        last_error.map(|error| format!(": {error}")).unwrap_or_default()
    ))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses a numeric rule bound.
fn parse_bound(arg: &str) -> Result<i64, String> {
    arg.parse::<i64>().map_err(|_| format!("rule bound \"{arg}\" is not an integer"))
}
