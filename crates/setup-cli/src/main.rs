// crates/setup-cli/src/main.rs
// ============================================================================
// Module: Setup Wizard CLI Entry Point
// Description: Operator commands over the draft configuration lifecycle.
// Purpose: Inspect, edit, validate and promote drafts without the web wizard.
// Dependencies: clap, serde_json, setup-config, setup-draft, tracing-subscriber
// ============================================================================

//! ## Overview
//! `setup-wizard` loads [`WizardSettings`], builds one [`DraftService`] and
//! runs a single command. Results are JSON on stdout, diagnostics go to
//! stderr, and failures exit non-zero. `draft validate` and `check` exit with
//! code 2 when the document has errors. Security posture: input files are
//! operator supplied and read with a hard size limit.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use serde::Serialize;
use setup_config::Config;
use setup_config::FileLiveConfig;
use setup_config::LiveConfigSource;
use setup_config::WizardSettings;
use setup_config::parse_yaml;
use setup_draft::CorruptionNotice;
use setup_draft::Draft;
use setup_draft::DraftService;
use setup_draft::FieldError;
use setup_draft::HttpRpcProbe;
use setup_draft::Phase;
use setup_validate::EndpointProbe;
use setup_validate::FieldViolation;
use setup_validate::RegistryOptions;
use setup_validate::ValidatorRegistry;
use setup_validate::collect;
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a document passed to `draft save`.
const MAX_INPUT_BYTES: usize = 4 * 1024 * 1024;
/// Environment variable holding the log filter.
const LOG_ENV: &str = "SETUP_WIZARD_LOG";
/// Exit code for documents that fail validation.
const EXIT_INVALID: u8 = 2;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "setup-wizard", version, disable_help_subcommand = true)]
struct Cli {
    /// Settings file (overrides `SETUP_WIZARD_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Draft lifecycle operations.
    Draft {
        /// Selected draft subcommand.
        #[command(subcommand)]
        command: DraftCommand,
    },
    /// Probe one RPC endpoint.
    Probe(ProbeCommand),
    /// Validate the live configuration with filesystem and liveness rules.
    Check,
}

/// Draft subcommands.
#[derive(Subcommand, Debug)]
enum DraftCommand {
    /// Print the current draft, or null.
    Show,
    /// Load the draft, seeding one when none exists.
    Init(SessionArgs),
    /// Replace the draft document with a JSON or YAML file.
    Save(SaveCommand),
    /// Validate the draft for one phase.
    Validate(ValidateCommand),
    /// Promote the draft to the live configuration.
    Apply(SessionArgs),
    /// Discard the draft.
    Reset(SessionArgs),
    /// Print and clear the corruption notice, or null.
    Notice,
}

/// Session identifier for mutating commands.
#[derive(Args, Debug)]
struct SessionArgs {
    /// Editing session identifier.
    #[arg(long, value_name = "ID")]
    session: String,
}

/// Arguments for `draft save`.
#[derive(Args, Debug)]
struct SaveCommand {
    /// Session arguments.
    #[command(flatten)]
    session: SessionArgs,
    /// Configuration document (`.json`, otherwise YAML).
    #[arg(long, value_name = "FILE")]
    input: PathBuf,
}

/// Arguments for `draft validate`.
#[derive(Args, Debug)]
struct ValidateCommand {
    /// Phase to validate.
    #[arg(long, value_name = "PHASE", default_value = "final")]
    phase: String,
    /// Also probe the enabled chains' endpoints.
    #[arg(long)]
    advisories: bool,
}

/// Arguments for `probe`.
#[derive(Args, Debug)]
struct ProbeCommand {
    /// Endpoint URL.
    url: String,
    /// Probe timeout in milliseconds (defaults to the settings value).
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,
}

// ============================================================================
// SECTION: Outputs
// ============================================================================

/// Output of `draft validate`.
#[derive(Debug, Serialize)]
struct ValidateOutput {
    /// Validated phase.
    phase: Phase,
    /// Blocking field errors.
    errors: Vec<FieldError>,
    /// Warning-grade probe notes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    advisories: Vec<FieldError>,
}

/// Output of `check`.
#[derive(Debug, Serialize)]
struct CheckOutput {
    /// Live configuration path.
    live_path: PathBuf,
    /// Whether a live configuration exists.
    present: bool,
    /// Rule violations found.
    violations: Vec<FieldViolation>,
}

/// Output of `draft notice`.
#[derive(Debug, Serialize)]
struct NoticeOutput {
    /// Pending notice, if any.
    notice: Option<CorruptionNotice>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying a display message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    init_tracing();
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the command dispatcher.
fn run(cli: Cli) -> CliResult<ExitCode> {
    let settings = WizardSettings::load(cli.config.as_deref())
        .map_err(|err| CliError::new(err.to_string()))?;
    let live_path = settings.live_path();
    debug!(live = %live_path.display(), test_mode = settings.test_mode, "settings loaded");
    match cli.command {
        Commands::Draft {
            command,
        } => {
            let service = DraftService::from_settings(&settings)
                .map_err(|err| CliError::new(err.to_string()))?;
            command_draft(&service, command)
        }
        Commands::Probe(command) => command_probe(&settings, &command),
        Commands::Check => command_check(&settings),
    }
}

/// Installs the stderr log subscriber.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

// ============================================================================
// SECTION: Draft Commands
// ============================================================================

/// Executes a `draft` subcommand.
fn command_draft(service: &DraftService, command: DraftCommand) -> CliResult<ExitCode> {
    match command {
        DraftCommand::Show => {
            let draft = service.get_draft().map_err(|err| CliError::new(err.to_string()))?;
            write_json(&draft)?;
            Ok(ExitCode::SUCCESS)
        }
        DraftCommand::Init(args) => {
            let draft =
                service.open_draft(&args.session).map_err(|err| CliError::new(err.to_string()))?;
            write_json(&draft)?;
            Ok(ExitCode::SUCCESS)
        }
        DraftCommand::Save(command) => command_draft_save(service, &command),
        DraftCommand::Validate(command) => command_draft_validate(service, &command),
        DraftCommand::Apply(args) => {
            let report = service
                .apply_draft(&args.session)
                .map_err(|err| CliError::new(err.to_string()))?;
            write_json(&report)?;
            Ok(ExitCode::SUCCESS)
        }
        DraftCommand::Reset(args) => {
            service.reset_draft(&args.session).map_err(|err| CliError::new(err.to_string()))?;
            write_json(&serde_json::json!({"reset": true}))?;
            Ok(ExitCode::SUCCESS)
        }
        DraftCommand::Notice => {
            write_json(&NoticeOutput {
                notice: service.take_corruption_notice(),
            })?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Executes `draft save`.
fn command_draft_save(service: &DraftService, command: &SaveCommand) -> CliResult<ExitCode> {
    let config = read_document(&command.input)?;
    let session = &command.session.session;
    let mut draft = match service.get_draft().map_err(|err| CliError::new(err.to_string()))? {
        Some(mut draft) => {
            draft.config = config;
            draft
        }
        None => Draft::new(config),
    };
    service.save_draft(session, &mut draft).map_err(|err| CliError::new(err.to_string()))?;
    write_json(&draft)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `draft validate`.
fn command_draft_validate(
    service: &DraftService,
    command: &ValidateCommand,
) -> CliResult<ExitCode> {
    let phase: Phase = command.phase.parse().map_err(CliError::new)?;
    let draft = service
        .get_draft()
        .map_err(|err| CliError::new(err.to_string()))?
        .ok_or_else(|| CliError::new("no draft to validate".to_string()))?;
    let errors = service.validate_phase(&draft, phase);
    let advisories = if command.advisories { service.advisories(&draft) } else { Vec::new() };
    let failed = !errors.is_empty();
    write_json(&ValidateOutput {
        phase,
        errors,
        advisories,
    })?;
    Ok(if failed { ExitCode::from(EXIT_INVALID) } else { ExitCode::SUCCESS })
}

// ============================================================================
// SECTION: Probe & Check Commands
// ============================================================================

/// Executes `probe`.
fn command_probe(settings: &WizardSettings, command: &ProbeCommand) -> CliResult<ExitCode> {
    let timeout =
        command.timeout_ms.map_or_else(|| settings.probe_timeout(), Duration::from_millis);
    let probe = HttpRpcProbe::new(timeout).map_err(CliError::new)?;
    let report = probe.probe(&command.url, timeout);
    let reachable = report.reachable;
    write_json(&report)?;
    Ok(if reachable { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Executes `check` against the live configuration.
fn command_check(settings: &WizardSettings) -> CliResult<ExitCode> {
    let live_path = settings.live_path();
    let live = FileLiveConfig::new(live_path.clone())
        .read_live()
        .map_err(|err| CliError::new(err.to_string()))?;
    let Some(config) = live else {
        write_json(&CheckOutput {
            live_path,
            present: false,
            violations: Vec::new(),
        })?;
        return Ok(ExitCode::from(EXIT_INVALID));
    };
    let registry = check_registry(settings)?;
    let violations = collect(&config, "", &registry);
    let failed = !violations.is_empty();
    write_json(&CheckOutput {
        live_path,
        present: true,
        violations,
    })?;
    Ok(if failed { ExitCode::from(EXIT_INVALID) } else { ExitCode::SUCCESS })
}

/// Builds the full rule registry used by `check`.
fn check_registry(settings: &WizardSettings) -> CliResult<ValidatorRegistry> {
    let probe: Option<Arc<dyn EndpointProbe>> = if settings.test_mode {
        None
    } else {
        Some(Arc::new(HttpRpcProbe::new(settings.probe_timeout()).map_err(CliError::new)?))
    };
    Ok(ValidatorRegistry::standard(RegistryOptions {
        test_mode: settings.test_mode,
        filesystem: true,
        probe,
        probe_timeout: settings.probe_timeout(),
    }))
}

// ============================================================================
// SECTION: Input Helpers
// ============================================================================

/// Reads a configuration document, choosing the format by extension.
fn read_document(path: &Path) -> CliResult<Config> {
    let bytes = read_bytes_with_limit(path, MAX_INPUT_BYTES)?;
    let is_json = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        return serde_json::from_slice(&bytes).map_err(|err| {
            CliError::new(format!("{}: invalid json document: {err}", path.display()))
        });
    }
    parse_yaml(&bytes)
        .map_err(|err| CliError::new(format!("{}: {err}", path.display())))?
        .ok_or_else(|| CliError::new(format!("{}: document is empty", path.display())))
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> CliResult<Vec<u8>> {
    let file = File::open(path)
        .map_err(|err| CliError::new(format!("{}: cannot open: {err}", path.display())))?;
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX);
    let mut bytes = Vec::new();
    file.take(limit.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|err| CliError::new(format!("{}: cannot read: {err}", path.display())))?;
    if bytes.len() > max_bytes {
        return Err(CliError::new(format!(
            "{}: file exceeds size limit of {max_bytes} bytes",
            path.display()
        )));
    }
    Ok(bytes)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes `value` to stdout as pretty JSON.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("failed to serialize output: {err}")))?;
    write_stdout_line(&text).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
