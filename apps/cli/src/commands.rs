//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use toolvault_core::pipeline::{
    self, FailedFile, PendingReport, ProcessedFile, ProgressReporter, RunOutcome, RunSummary,
    SilentProgress,
};
use toolvault_shared::{
    AppConfig, ArchiveConfig, PathOverrides, config_file_path, init_config, init_config_at,
    load_config, load_config_from,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// toolvault — archive scripts and keep a note for each one.
#[derive(Parser)]
#[command(
    name = "toolvault",
    version,
    about = "Archive new scripts and generate a documentation note for each in a note vault.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file to use instead of ~/.toolvault/toolvault.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Directory overrides shared by `run` and `pending`.
#[derive(Args, Debug, Clone)]
pub(crate) struct PathArgs {
    /// Directory scanned for new scripts.
    #[arg(long, env = "TOOLVAULT_SOURCE")]
    pub source: Option<PathBuf>,

    /// Archive directory receiving the copies.
    #[arg(long, env = "TOOLVAULT_ARCHIVE")]
    pub archive: Option<PathBuf>,

    /// Root of the note vault.
    #[arg(long, env = "TOOLVAULT_VAULT")]
    pub vault: Option<PathBuf>,
}

impl From<PathArgs> for PathOverrides {
    fn from(args: PathArgs) -> Self {
        Self {
            source_dir: args.source,
            archive_dir: args.archive,
            vault_dir: args.vault,
        }
    }
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Archive new scripts and write their notes.
    Run {
        #[command(flatten)]
        paths: PathArgs,

        /// Print the run summary as JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// List scripts that the next run would archive, without changing anything.
    Pending {
        #[command(flatten)]
        paths: PathArgs,

        /// Print the report as JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show the loaded configuration.
    Show,
    /// Print the config file location.
    Path,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so stdout only
/// carries command output.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = ["toolvault", "toolvault_core", "toolvault_shared", "toolvault_markdown"]
        .map(|target| format!("{target}={level}"))
        .join(",");

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Command::Run { paths, json } => cmd_run(config_path.as_deref(), paths, json),
        Command::Pending { paths, json } => cmd_pending(config_path.as_deref(), paths, json),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(config_path.as_deref()),
            ConfigAction::Show => cmd_config_show(config_path.as_deref()),
            ConfigAction::Path => cmd_config_path(config_path.as_deref()),
        },
    }
}

fn load_app_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    })
}

fn resolve(path: Option<&Path>, paths: PathArgs) -> Result<ArchiveConfig> {
    let app = load_app_config(path)?;
    let config = ArchiveConfig::resolve(&app, &paths.into())?;

    // Checked before setup so a mistyped path does not create an empty vault layout
    if !config.source_dir.is_dir() {
        return Err(eyre!(
            "source directory '{}' does not exist or is not a directory",
            config.source_dir.display()
        ));
    }
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_run(config_path: Option<&Path>, paths: PathArgs, json: bool) -> Result<()> {
    let config = resolve(config_path, paths)?;

    info!(
        source = %config.source_dir.display(),
        archive = %config.archive_dir.display(),
        resources = %config.resources_dir.display(),
        "starting archive run"
    );

    let outcome = if json {
        pipeline::run(&config, &SilentProgress)?
    } else {
        let reporter = CliProgress::new();
        let outcome = pipeline::run(&config, &reporter);
        reporter.finish();
        outcome?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    let ext = &config.profile.extension;
    match outcome {
        RunOutcome::NoSourceFiles => {
            println!("No .{ext} files found in {}!", config.source_dir.display());
        }
        RunOutcome::NothingNew { discovered } => {
            println!("No new .{ext} files to process! ({discovered} already archived)");
        }
        RunOutcome::Completed(summary) => print_summary(&summary),
    }

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("  Archive run complete.");
    println!("  Found:     {}", summary.discovered);
    println!("  Skipped:   {} (already archived)", summary.already_archived);
    println!("  Processed: {}", summary.processed.len());
    println!("  Failed:    {}", summary.failed.len());
    println!("  Time:      {:.1}s", summary.elapsed_ms as f64 / 1000.0);
    println!();
}

fn cmd_pending(config_path: Option<&Path>, paths: PathArgs, json: bool) -> Result<()> {
    let config = resolve(config_path, paths)?;
    let report: PendingReport = pipeline::pending(&config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.pending.is_empty() {
        println!(
            "Nothing to archive ({} found, {} already archived).",
            report.discovered, report.already_archived
        );
        return Ok(());
    }

    println!("Pending ({} of {}):", report.pending.len(), report.discovered);
    for file in &report.pending {
        println!("  {:<40} → {}", file.file_name, file.category);
    }
    Ok(())
}

fn cmd_config_init(config_path: Option<&Path>) -> Result<()> {
    let path = match config_path {
        Some(p) => {
            init_config_at(p)?;
            p.to_path_buf()
        }
        None => init_config()?,
    };
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = load_app_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

fn cmd_config_path(config_path: Option<&Path>) -> Result<()> {
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => config_file_path()?,
    };
    let state = if path.exists() { "" } else { " (not created yet)" };
    println!("{}{state}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter: spinner for phases, one printed line per event.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    /// Print above the spinner; works when stdout is not a terminal too.
    fn line(&self, text: String) {
        self.spinner.suspend(|| println!("{text}"));
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn directory_ready(&self, path: &Path) {
        self.line(directory_line(path));
    }

    fn file_processed(&self, file: &ProcessedFile) {
        self.line(processed_line(file));
    }

    fn file_failed(&self, file: &FailedFile) {
        self.line(failed_line(file));
    }
}

fn directory_line(path: &Path) -> String {
    format!("Created/confirmed directory: {}", path.display())
}

fn processed_line(file: &ProcessedFile) -> String {
    format!(
        "Processed: {} → {}",
        file.file_name,
        file.document_path.display()
    )
}

fn failed_line(file: &FailedFile) -> String {
    format!("Error processing {}: {}", file.file_name, file.error)
}
