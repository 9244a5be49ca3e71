//! crio - Command-line tool for cRIO controller webservers
//!
//! Reads process data and writes setpoints through the controller's
//! webserver, or against a replay snapshot when no controller is at hand.

mod commands;
mod config;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use crio_client::{
    BackendConfig, CancellationToken, ControllerBackend, CrioClient, CrioError, ReplayBackend,
    Severity,
};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{ArgOverrides, Config, MergedConfig};
use crate::output::{OutputContext, OutputFormat};

/// Exit code for usage and configuration errors
const EXIT_USAGE: u8 = 1;
/// Exit code when the controller rejected the command
const EXIT_REJECTED: u8 = 2;
/// Exit code when the controller broke its response contract
const EXIT_CONTRACT_VIOLATION: u8 = 3;
/// Exit code when no response was obtained
const EXIT_TRANSPORT: u8 = 4;

#[derive(Parser)]
#[command(name = "crio")]
#[command(author, version, about = "cRIO controller webserver CLI")]
#[command(propagate_version = true)]
struct Cli {
    /// Controller webserver URL
    #[arg(short, long, env = "CRIO_ENDPOINT", global = true)]
    endpoint: Option<String>,

    /// Serve reads from a CSV snapshot instead of a controller
    #[arg(long, value_name = "CSV", global = true)]
    replay: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, env = "CRIO_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds (0 disables it)
    #[arg(short, long, value_name = "SECS", global = true)]
    timeout: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, global = true)]
    output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show current values and units of all tags
    Current,

    /// Show alarm information
    Alarms,

    /// Show system information
    System,

    /// Write a single setpoint
    Set {
        /// Process tag
        tag: String,

        /// Numeric setpoint value
        #[arg(allow_negative_numbers = true)]
        value: String,
    },

    /// Write several setpoints in one request
    SetMany {
        /// Assignments in TAG=VALUE form, applied in the given order
        #[arg(required = true, value_name = "TAG=VALUE")]
        assignments: Vec<String>,
    },

    /// Switch controller data logging
    Logging {
        #[arg(value_enum)]
        state: Switch,
    },

    /// Configure a PID controller
    Pid {
        /// Controller name, without the class suffix
        controller: String,

        /// Process value tag
        pv: String,

        /// Control value tag
        cv: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Switch {
    On,
    Off,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging; RUST_LOG overrides the default level
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Until the config file is merged, errors are printed with CLI settings only
    let early = OutputContext::new(cli.output.unwrap_or_default(), cli.no_color, cli.quiet);
    let merged = match load_config(&cli) {
        Ok(merged) => merged,
        Err(err) => return report(&early, &err),
    };
    let ctx = OutputContext::new(merged.output, merged.no_color, cli.quiet);

    match run(&cli, &merged, &ctx).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&ctx, &err),
    }
}

/// Load the config file and merge the command line over it
fn load_config(cli: &Cli) -> Result<MergedConfig> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    Ok(config.merge_with_args(&ArgOverrides {
        endpoint: cli.endpoint.clone(),
        replay: cli.replay.clone(),
        timeout_secs: cli.timeout,
        output: cli.output,
        no_color: cli.no_color,
    }))
}

async fn run(cli: &Cli, merged: &MergedConfig, ctx: &OutputContext) -> Result<()> {
    let cancel = CancellationToken::new();
    let backend = create_backend(&merged.backend, cancel.clone())?;
    debug!(backend = %backend.describe(), "Using backend");

    // Ctrl-C cancels the in-flight request
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let backend = backend.as_ref();
    match &cli.command {
        Commands::Current => commands::current(backend, ctx).await,
        Commands::Alarms => commands::alarms(backend, ctx).await,
        Commands::System => commands::system(backend, ctx).await,
        Commands::Set { tag, value } => commands::set(backend, tag, value, ctx).await,
        Commands::SetMany { assignments } => commands::set_many(backend, assignments, ctx).await,
        Commands::Logging { state } => commands::logging(backend, *state == Switch::On, ctx).await,
        Commands::Pid { controller, pv, cv } => {
            commands::pid(backend, controller, pv, cv, ctx).await
        }
    }
}

/// Build the selected backend; live clients honour the cancellation token
fn create_backend(
    config: &BackendConfig,
    cancel: CancellationToken,
) -> Result<Arc<dyn ControllerBackend>> {
    let backend: Arc<dyn ControllerBackend> = match config {
        BackendConfig::Http(client) => Arc::new(
            CrioClient::from_config(client)
                .context("Failed to create controller client")?
                .with_cancellation(cancel),
        ),
        BackendConfig::Replay(replay) => Arc::new(ReplayBackend::new(&replay.file)),
    };
    Ok(backend)
}

/// Print the error and pick the exit code
fn report(ctx: &OutputContext, err: &anyhow::Error) -> ExitCode {
    let message = format!("Error: {err:#}");
    let code = exit_code(err);
    if code == EXIT_CONTRACT_VIOLATION {
        ctx.violation(&message);
    } else {
        ctx.error(&message);
    }
    ExitCode::from(code)
}

fn exit_code(err: &anyhow::Error) -> u8 {
    let Some(crio) = err.chain().find_map(|e| e.downcast_ref::<CrioError>()) else {
        return EXIT_USAGE;
    };
    match crio.severity() {
        Severity::ContractViolation => EXIT_CONTRACT_VIOLATION,
        Severity::Operational => EXIT_REJECTED,
        Severity::Transport => EXIT_TRANSPORT,
        Severity::Configuration => EXIT_USAGE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crio_client::{OutcomeKind, StructuredError, TransportFailure};

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_set_many() {
        let cli = Cli::parse_from([
            "crio",
            "--endpoint",
            "http://crio:8001",
            "set-many",
            "T1=1",
            "T2=2.5",
        ]);
        assert_eq!(cli.endpoint.as_deref(), Some("http://crio:8001"));
        match cli.command {
            Commands::SetMany { assignments } => assert_eq!(assignments, ["T1=1", "T2=2.5"]),
            _ => panic!("expected set-many"),
        }
    }

    #[test]
    fn test_parse_negative_setpoint_and_global_flags() {
        let cli = Cli::parse_from(["crio", "set", "TIC-101", "-5", "--output", "json", "-q"]);
        assert_eq!(cli.output, Some(OutputFormat::Json));
        assert!(cli.quiet);
        match cli.command {
            Commands::Set { tag, value } => {
                assert_eq!(tag, "TIC-101");
                assert_eq!(value, "-5");
            }
            _ => panic!("expected set"),
        }
    }

    #[test]
    fn test_parse_logging_switch() {
        let cli = Cli::parse_from(["crio", "logging", "off"]);
        assert!(matches!(cli.command, Commands::Logging { state: Switch::Off }));
        assert!(Cli::try_parse_from(["crio", "logging", "maybe"]).is_err());
    }

    #[test]
    fn test_config_file_settings_reach_error_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "output = \"csv\"\nno_color = true\n").unwrap();

        let cli = Cli::parse_from(["crio", "--config", path.to_str().unwrap(), "current"]);
        let merged = load_config(&cli).unwrap();

        assert_eq!(merged.output, OutputFormat::Csv);
        assert!(merged.no_color);
    }

    #[test]
    fn test_unreadable_config_is_usage_error() {
        let cli = Cli::parse_from(["crio", "--config", "/nonexistent/crio.toml", "current"]);
        let err = load_config(&cli).unwrap_err();
        assert_eq!(exit_code(&err), EXIT_USAGE);
    }

    #[test]
    fn test_exit_codes() {
        let rejected = anyhow::Error::new(CrioError::BadRequest(StructuredError::new(
            OutcomeKind::BadRequest,
            400,
            "bad tag",
            None,
        )))
        .context("Failed to set T1");
        assert_eq!(exit_code(&rejected), EXIT_REJECTED);

        let violation = anyhow::Error::new(CrioError::malformed("no CurrentData"));
        assert_eq!(exit_code(&violation), EXIT_CONTRACT_VIOLATION);

        let transport = anyhow::Error::new(CrioError::transport(TransportFailure::Timeout, "slow"));
        assert_eq!(exit_code(&transport), EXIT_TRANSPORT);

        assert_eq!(exit_code(&anyhow::anyhow!("Expected TAG=VALUE")), EXIT_USAGE);
    }
}
