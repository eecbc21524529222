//! Tether - bulk delegation onboarding
//!
//! Usage:
//!   tether onboard --template <path|url> --target <id>   # Onboard subscriptions
//!   tether onboard -i --what-if                          # Pick interactively, preview only
//!   tether subscriptions                                 # List accessible subscriptions
//!   tether config                                        # Show effective configuration

mod interactive;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tether_core::cloud::{AzCli, SubscriptionDirectory};
use tether_core::commands::{OnboardCommand, OnboardOptions, OnboardReport, TargetSelection};
use tether_core::config::{ConfigStore, TetherConfig};
use tether_core::deploy::TargetingPolicy;
use tether_core::error::{ExportError, SetupError};
use tether_core::orchestration::RunObserver;
use tether_core::poll::SystemClock;
use tether_core::report::ResultRecord;
use tether_core::template::TemplateLocation;
use tether_core::types::{Outcome, Target};

use crate::interactive::InteractiveSelection;

/// Exit code for a run whose overall status is Failed.
const EXIT_RUN_FAILED: u8 = 1;

/// Exit code for errors that stop a run before any subscription is entered.
const EXIT_SETUP_FAILED: u8 = 2;

/// Exit code for a run whose results could not be exported.
const EXIT_EXPORT_FAILED: u8 = 3;

#[derive(Parser)]
#[command(name = "tether")]
#[command(about = "Bulk delegation onboarding across subscriptions", long_about = None)]
struct Cli {
    /// Path to tether.toml (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply the delegation template to selected subscriptions
    Onboard(Box<OnboardArgs>),

    /// List subscriptions accessible under the current credentials
    #[command(alias = "subs")]
    Subscriptions {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show the effective configuration
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
    /// No output beyond the exit code
    Quiet,
}

#[derive(Args)]
struct OnboardArgs {
    /// Template path or http(s) URL (overrides [template].source)
    #[arg(long, short)]
    template: Option<String>,
    /// ARM parameters file (overrides [template].parameters)
    #[arg(long, short)]
    parameters: Option<PathBuf>,
    /// Deployment region
    #[arg(long, short)]
    region: Option<String>,
    /// Result export path (defaults to a timestamped CSV)
    #[arg(long, short)]
    output: Option<PathBuf>,
    /// Keep going after a subscription fails
    #[arg(long)]
    continue_on_error: bool,
    /// Preview only; no changes are applied
    #[arg(long = "what-if", alias = "simulate")]
    what_if: bool,
    /// Subscriptions to onboard (whitelist)
    #[arg(long = "target", value_name = "SUBSCRIPTION")]
    targets: Vec<String>,
    /// Subscriptions to skip (blacklist)
    #[arg(long = "ignore-target", value_name = "SUBSCRIPTION")]
    ignore_targets: Vec<String>,
    /// Onboard every accessible subscription
    #[arg(long, conflicts_with = "interactive")]
    all: bool,
    /// Pick subscriptions interactively
    #[arg(short, long)]
    interactive: bool,
    /// Skip confirmation prompts
    #[arg(short = 'y', long)]
    yes: bool,
    /// Output format
    #[arg(short = 'f', long, default_value = "table")]
    format: OutputFormat,
}

fn main() -> ExitCode {
    // Logs go to stderr so stdout stays clean for JSON output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tether=info,tether_core=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run_cli(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {:#}", style("error:").red().bold(), err);
            ExitCode::from(exit_code_for(&err))
        }
    }
}

/// Exit code for an error that ended the command.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    if err.chain().any(|cause| cause.is::<SetupError>()) {
        EXIT_SETUP_FAILED
    } else if err.chain().any(|cause| cause.is::<ExportError>()) {
        EXIT_EXPORT_FAILED
    } else {
        EXIT_RUN_FAILED
    }
}

fn run_cli(cli: Cli) -> Result<ExitCode> {
    let store = match &cli.config {
        Some(path) => ConfigStore::from_path(path),
        None => ConfigStore::from_default_location()?,
    };
    tracing::debug!(path = %store.config_path().display(), "using config file");

    match cli.command {
        Commands::Onboard(args) => {
            let config = store.load()?;
            run_onboard(&config, *args)
        }
        Commands::Subscriptions { format } => {
            let config = store.load()?;
            run_subscriptions(&config, format)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config { init } => {
            run_config(&store, init)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_onboard(config: &TetherConfig, args: OnboardArgs) -> Result<ExitCode> {
    let az = AzCli::new(config.az.program.clone());
    let clock = SystemClock;

    let location = resolve_template_location(
        args.template.as_deref().or(config.template.source.as_deref()),
    )?;
    let parameters = args
        .parameters
        .clone()
        .or_else(|| config.template.parameters.clone());
    let templates = location.into_source(parameters);

    let observer = ConsoleObserver {
        format: args.format,
    };
    let command = OnboardCommand::new(&az, templates.as_ref(), &clock).with_observer(&observer);

    let selection = if args.interactive && args.targets.is_empty() {
        let candidates = command.candidates()?;
        let result = InteractiveSelection::new(candidates, args.what_if, args.yes).collect()?;
        if result.ids.is_empty() {
            return Err(SetupError::NoTargetsSelected.into());
        }
        if !result.confirmed {
            println!("Aborted.");
            return Ok(ExitCode::SUCCESS);
        }
        TargetSelection::Explicit(result.ids)
    } else if args.all || !args.targets.is_empty() || !args.ignore_targets.is_empty() {
        let targets = (!args.targets.is_empty()).then(|| args.targets.clone());
        let ignore = (!args.ignore_targets.is_empty()).then(|| args.ignore_targets.clone());
        TargetSelection::Policy(TargetingPolicy::new(targets, ignore))
    } else {
        eprintln!("Pass --target, --all, or -i to choose subscriptions.");
        return Err(SetupError::NoTargetsSelected.into());
    };

    let mut options = OnboardOptions::from_config(config)
        .with_continue_on_error(args.continue_on_error)
        .with_simulate(args.what_if)
        .with_selection(selection);
    if let Some(region) = &args.region {
        options = options.with_region(region);
    }
    if let Some(output) = args.output.clone().or_else(|| default_output_in(config)) {
        options = options.with_output_path(output);
    }

    let report = command.execute(&options)?;
    print_onboard_result(&report, args.format)?;

    if report.summary.status.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_RUN_FAILED))
    }
}

fn resolve_template_location(source: Option<&str>) -> Result<TemplateLocation, SetupError> {
    let Some(source) = source else {
        return Err(SetupError::TemplateUnavailable {
            location: "(none)".to_string(),
            message: "pass --template or set [template].source".to_string(),
        });
    };
    TemplateLocation::parse(source).map_err(|err| SetupError::TemplateUnavailable {
        location: source.to_string(),
        message: format!("{:#}", err),
    })
}

/// Timestamped export inside the configured output directory.
fn default_output_in(config: &TetherConfig) -> Option<PathBuf> {
    let dir = config.output_dir.as_ref()?;
    let file = tether_core::report::default_output_path(chrono::Utc::now());
    Some(dir.join(file))
}

/// Prints per-subscription progress as the run proceeds.
struct ConsoleObserver {
    format: OutputFormat,
}

impl RunObserver for ConsoleObserver {
    fn target_started(&self, index: usize, total: usize, target: &Target) {
        if let OutputFormat::Table = self.format {
            println!("[{}/{}] {}", index + 1, total, target);
        }
    }

    fn target_finished(&self, _target: &Target, record: &ResultRecord) {
        match (self.format, record.outcome) {
            // Failures are always surfaced immediately, even in quiet/JSON mode.
            (_, Outcome::Failed) => {
                eprintln!("  {} {}", style("✗").red(), record.message);
            }
            (OutputFormat::Table, Outcome::Simulated) => {
                println!("  {} {}", style("~").yellow(), record.message);
            }
            (OutputFormat::Table, _) => {
                println!("  {} {}", style("✓").green(), record.message);
            }
            _ => {}
        }
    }
}

fn print_onboard_result(report: &OnboardReport, format: OutputFormat) -> Result<()> {
    let summary = &report.summary;
    match format {
        OutputFormat::Table => {
            println!();
            println!(
                "{} subscription(s): {} succeeded, {} simulated, {} failed",
                summary.len(),
                summary.count(Outcome::Succeeded),
                summary.count(Outcome::Simulated),
                summary.count(Outcome::Failed),
            );
            for record in summary.failures() {
                println!("  ✗ {}: {}", record.target_id, record.message);
            }
            let status = if summary.status.is_success() {
                style(summary.status.to_string()).green().bold()
            } else {
                style(summary.status.to_string()).red().bold()
            };
            println!("Overall: {}", status);
            println!("Results written to {}", report.output_path.display());
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "status": summary.status,
                "output": report.output_path,
                "records": summary.records,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Quiet => {}
    }
    Ok(())
}

fn run_subscriptions(config: &TetherConfig, format: OutputFormat) -> Result<()> {
    let az = AzCli::new(config.az.program.clone());
    let subscriptions = az.list_subscriptions()?;

    match format {
        OutputFormat::Table => {
            if subscriptions.is_empty() {
                println!("No subscriptions available");
            }
            for target in &subscriptions {
                println!("{:<38} {}", target.id, target.name);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&subscriptions)?);
        }
        OutputFormat::Quiet => {}
    }
    Ok(())
}

fn run_config(store: &ConfigStore, init: bool) -> Result<()> {
    if init && !store.config_path().exists() {
        store.save(&TetherConfig::new())?;
        println!("✓ Wrote {}", store.config_path().display());
    }

    let config = store.load()?;
    println!("# {}", store.config_path().display());
    println!("{}", tether_core::config::to_toml(&config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_errors_exit_with_setup_code() {
        let err = anyhow::Error::from(SetupError::NoTargetsSelected);
        assert_eq!(exit_code_for(&err), EXIT_SETUP_FAILED);

        let wrapped = anyhow::Error::from(SetupError::NoTargetsAvailable).context("listing");
        assert_eq!(exit_code_for(&wrapped), EXIT_SETUP_FAILED);
    }

    #[test]
    fn export_errors_have_their_own_code() {
        let err = anyhow::Error::from(ExportError {
            path: PathBuf::from("out/r.csv"),
            message: "permission denied".to_string(),
        });
        assert_eq!(exit_code_for(&err), EXIT_EXPORT_FAILED);
    }

    #[test]
    fn other_errors_exit_with_failure() {
        assert_eq!(exit_code_for(&anyhow::anyhow!("az not found")), EXIT_RUN_FAILED);
    }

    #[test]
    fn missing_or_bad_template_is_a_setup_error() {
        assert!(matches!(
            resolve_template_location(None),
            Err(SetupError::TemplateUnavailable { .. })
        ));
        assert!(matches!(
            resolve_template_location(Some("  ")),
            Err(SetupError::TemplateUnavailable { .. })
        ));
        assert!(matches!(
            resolve_template_location(Some("./delegation.json")),
            Ok(TemplateLocation::File(_))
        ));
    }
}
