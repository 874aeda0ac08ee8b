use std::path::{Path, PathBuf};

use clap::{Args, CommandFactory, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hotlint_core::{Cancellation, HotlintConfig, Hotspot, OutputFormat, MAX_HOTSPOTS};
use hotlint_gitpulse::hotspots::HotspotOptions;
use hotlint_runner::phase::{
    aggregate_exit_code, hotspot_outcome, lint_phase, HotspotPhase, HotspotReport, PhaseOutcome,
    PhaseStatus, HOTSPOT_PHASE,
};
use hotlint_runner::tool::ToolSpec;

const CONFIG_FILE: &str = ".hotlint.toml";

#[derive(Parser)]
#[command(
    name = "hotlint",
    version,
    about = "Lint orchestrator with git-history hotspot ranking",
    long_about = "hotlint runs your lint tool, then ranks the files most likely to hide\n\
                   problems by combining git churn with a cheap complexity estimate.\n\
                   The ranking is written as a SARIF v2.1.0 report.\n\n\
                   Examples:\n  \
                     hotlint run                          Lint, then write .hotlint/hotspots.sarif\n  \
                     hotlint run -- ./...                 Pass extra arguments to the lint tool\n  \
                     hotlint run --base-ref origin/main   Bias files changed since origin/main\n  \
                     hotlint hotspots --since 30 --top 10 Show the top hotspots of the last 30 days\n  \
                     hotlint init                         Create a .hotlint.toml config file"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (default: .hotlint.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text  Human-readable summaries (default)\n  \
                         json  Machine-readable JSON with camelCase keys"
    )]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,
}

/// Flags shared by `run` and `hotspots`. Unset flags fall back to the config file.
#[derive(Args, Clone)]
struct HotspotArgs {
    /// Repository path (default: current directory)
    #[arg(long, default_value = ".")]
    path: PathBuf,

    /// Base ref for the changed-file bias (default: previous commit)
    #[arg(long)]
    base_ref: Option<String>,

    /// Churn window in days
    #[arg(long)]
    since: Option<u64>,

    /// Report destination, relative to the repository root
    #[arg(long)]
    output: Option<PathBuf>,

    /// Deadline for the hotspot phase in seconds (0 = none)
    #[arg(long)]
    hotspot_timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the lint tool, then rank hotspots
    #[command(long_about = "Run the lint tool, then rank hotspots.\n\n\
        The lint tool's exit status becomes hotlint's exit status. Hotspot ranking\n\
        is advisory: if it fails, a warning is printed and the exit status is unchanged.\n\n\
        Examples:\n  hotlint run\n  hotlint run --no-hotspots -- --fix\n  hotlint run --output /tmp/hotspots.sarif")]
    Run {
        #[command(flatten)]
        hotspots: HotspotArgs,

        /// Skip the hotspot phase
        #[arg(long)]
        no_hotspots: bool,

        /// Extra arguments passed to the lint tool after its configured args
        #[arg(last = true)]
        tool_args: Vec<String>,
    },
    /// Rank hotspots and write the SARIF report without linting
    #[command(long_about = "Rank hotspots and write the SARIF report without linting.\n\n\
        Scores every churned file as ln(1 + churn) x (1 + z), where z is the file's\n\
        complexity z-score within the run. Files changed against the base ref get a\n\
        1.15x bias. At most 500 files are ranked.\n\n\
        Examples:\n  hotlint hotspots\n  hotlint hotspots --base-ref main --top 5\n  hotlint hotspots --format json")]
    Hotspots {
        #[command(flatten)]
        hotspots: HotspotArgs,

        /// Number of hotspots to print (the report always holds the full ranking)
        #[arg(long, default_value = "20")]
        top: usize,
    },
    /// Create a default .hotlint.toml configuration file
    #[command(long_about = "Create a default .hotlint.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .hotlint.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

const DEFAULT_CONFIG: &str = r#"# hotlint configuration
# See: https://github.com/hotlint/hotlint

[tool]
# Lint tool and its arguments; extra arguments after `--` are appended.
# command = "golangci-lint"
# args = ["run"]
# timeout_secs = 0

[hotspots]
# enabled = true
# base_ref = "origin/main"
# since_days = 90
# output = ".hotlint/hotspots.sarif"
# timeout_secs = 120
# limit = 500

[report]
# tool_name = "hotlint"
# information_uri = "https://github.com/hotlint/hotlint"
"#;

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn load_config(explicit: Option<&Path>) -> Result<HotlintConfig> {
    let config = match explicit {
        Some(path) => HotlintConfig::from_file(path)?,
        None => {
            let default_path = Path::new(CONFIG_FILE);
            if default_path.exists() {
                HotlintConfig::from_file(default_path)?
            } else {
                HotlintConfig::default()
            }
        }
    };
    Ok(config)
}

/// CLI flags over config values.
fn hotspot_phase(args: &HotspotArgs, config: &HotlintConfig) -> HotspotPhase {
    HotspotPhase {
        repo_path: args.path.clone(),
        options: HotspotOptions {
            base_ref: args
                .base_ref
                .clone()
                .unwrap_or_else(|| config.hotspots.base_ref.clone()),
            since_days: args.since.unwrap_or(config.hotspots.since_days),
            limit: config.hotspots.limit.min(MAX_HOTSPOTS),
        },
        output: args
            .output
            .clone()
            .unwrap_or_else(|| config.hotspots.output.clone()),
        report: config.report.clone(),
    }
}

fn hotspot_cancellation(args: &HotspotArgs, config: &HotlintConfig) -> Cancellation {
    Cancellation::from_secs(args.hotspot_timeout.unwrap_or(config.hotspots.timeout_secs))
}

/// Notices for degraded history and redirected reports.
fn report_notices(report: &HotspotReport) {
    let run = &report.run;
    if run.churn_degraded {
        eprintln!("note: no commit history yet; the hotspot report is empty");
    } else if run.changes_degraded {
        eprintln!("note: no earlier commit to compare against; changed-file bias skipped");
    }
    if report.emitted.redirected {
        eprintln!(
            "note: report destination not writable; wrote {} instead",
            report.emitted.path.display()
        );
    }
}

fn print_hotspots(hotspots: &[Hotspot], top: usize) {
    if hotspots.is_empty() {
        println!("No hotspots detected.");
        return;
    }
    let shown = top.min(hotspots.len());
    println!("Hotspots (top {shown} of {}):", hotspots.len());
    println!("{:-<72}", "");
    for (i, h) in hotspots.iter().take(shown).enumerate() {
        println!(
            "{:>3}. {:<40} score={:.2}  churn={}  complexity={:.2}",
            i + 1,
            h.file,
            h.score,
            h.churn,
            h.complexity,
        );
    }
}

fn phase_json(outcome: &PhaseOutcome) -> serde_json::Value {
    let (status, exit_code, message) = match &outcome.status {
        PhaseStatus::Passed => ("passed", None, None),
        PhaseStatus::Failed { exit_code, message } => {
            ("failed", Some(*exit_code), Some(message.as_str()))
        }
        PhaseStatus::Warned { message } => ("warned", None, Some(message.as_str())),
        PhaseStatus::Skipped => ("skipped", None, None),
    };
    serde_json::json!({
        "name": outcome.name,
        "status": status,
        "exitCode": exit_code,
        "message": message,
    })
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Run {
            ref hotspots,
            no_hotspots,
            ref tool_args,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let spec = ToolSpec::from_config(&config.tool, tool_args);
            if cli.verbose {
                eprintln!("Running {}", spec.display());
            }

            let tool_cancel = Cancellation::from_secs(config.tool.timeout_secs);
            let mut outcomes = vec![lint_phase(&spec, &hotspots.path, &tool_cancel)];
            if let PhaseStatus::Failed { message, .. } = &outcomes[0].status {
                eprintln!("lint: {message}");
            }

            let mut report = None;
            if no_hotspots || !config.hotspots.enabled {
                outcomes.push(PhaseOutcome::skipped(HOTSPOT_PHASE));
            } else {
                let result = hotspot_phase(hotspots, &config)
                    .run(&hotspot_cancellation(hotspots, &config));
                let outcome = hotspot_outcome(&result);
                match &result {
                    Ok(r) => report_notices(r),
                    Err(e) => eprintln!("warning: hotspot ranking skipped: {e}"),
                }
                outcomes.push(outcome);
                report = result.ok();
            }

            let exit_code = aggregate_exit_code(&outcomes);
            match cli.format {
                OutputFormat::Json => {
                    let json = serde_json::json!({
                        "exitCode": exit_code,
                        "phases": outcomes.iter().map(phase_json).collect::<Vec<_>>(),
                        "report": report.as_ref().map(|r| r.emitted.path.display().to_string()),
                        "hotspots": report.as_ref().map(|r| r.run.hotspots.len()),
                    });
                    println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
                }
                OutputFormat::Text => {
                    if let Some(r) = &report {
                        println!(
                            "Ranked {} hotspots; report written to {}",
                            r.run.hotspots.len(),
                            r.emitted.path.display()
                        );
                    }
                }
            }

            if exit_code != 0 {
                std::process::exit(exit_code);
            }
        }
        Command::Hotspots { ref hotspots, top } => {
            let config = load_config(cli.config.as_deref())?;
            let phase = hotspot_phase(hotspots, &config);
            if cli.verbose {
                eprintln!(
                    "Ranking hotspots at {} (last {} days)...",
                    phase.repo_path.display(),
                    phase.options.since_days
                );
            }
            let report = phase.run(&hotspot_cancellation(hotspots, &config))?;
            report_notices(&report);

            match cli.format {
                OutputFormat::Json => {
                    let json = serde_json::json!({
                        "report": report.emitted.path.display().to_string(),
                        "redirected": report.emitted.redirected,
                        "degraded": report.run.degraded(),
                        "churnedFiles": report.run.churned_files,
                        "hotspots": report.run.hotspots.iter().take(top).collect::<Vec<_>>(),
                    });
                    println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
                }
                OutputFormat::Text => {
                    print_hotspots(&report.run.hotspots, top);
                    eprintln!("Report written to {}", report.emitted.path.display());
                }
            }
        }
        Command::Init => {
            let path = Path::new(CONFIG_FILE);
            if path.exists() {
                miette::bail!("{CONFIG_FILE} already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created {CONFIG_FILE} with default configuration");
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "hotlint", &mut std::io::stdout());
        }
    }

    Ok(())
}
