//! # paddock
//!
//! Command-line front end for `paddock-engine`: where are we in the season,
//! is anything live, what's next.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use paddock_engine::formatter::describe_minutes;
use paddock_engine::schedule::parse_rfc3339;
use paddock_engine::settings::LoggingSettings;
use paddock_engine::{
    analyze, format_prompt, format_report, load_settings, load_settings_from_path, to_structured,
    CacheRecord, SeasonSchedule, Settings, TemporalCache, TemporalContextManager,
    TemporalSnapshot, Verbosity,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "paddock", version, about = "Season, weekend and session context for motorsport calendars")]
struct Cli {
    /// Settings file (default: ~/.paddock/settings.json).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Override the cache record location.
    #[arg(long, global = true)]
    cache_file: Option<PathBuf>,

    /// Override the directory holding <season>.json schedules.
    #[arg(long, global = true)]
    schedule_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Current temporal context, served from cache when valid.
    Context {
        /// Evaluate at this instant instead of the system clock (RFC 3339).
        #[arg(long, value_parser = parse_now)]
        now: Option<DateTime<Utc>>,

        /// Ignore the cached record and recompute.
        #[arg(long)]
        refresh: bool,

        #[arg(long, value_enum, default_value_t = OutputFormat::Prompt)]
        output: OutputFormat,

        #[arg(long, default_value = "normal", value_parser = parse_verbosity)]
        verbosity: Verbosity,
    },

    /// Analyze a schedule file directly. No cache, no provider.
    Analyze {
        #[arg(long)]
        schedule: PathBuf,

        #[arg(long, value_parser = parse_now)]
        now: Option<DateTime<Utc>>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Prompt)]
        output: OutputFormat,

        #[arg(long, default_value = "normal", value_parser = parse_verbosity)]
        verbosity: Verbosity,
    },

    /// Inspect or clear the cache record.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    /// Print the cached record and whether it is still valid.
    Show {
        #[arg(long, value_parser = parse_now)]
        now: Option<DateTime<Utc>>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Report)]
        output: OutputFormat,
    },
    /// Delete the cached record.
    Clear,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Prompt,
    Report,
}

fn parse_now(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    parse_rfc3339(s)
}

fn parse_verbosity(s: &str) -> std::result::Result<Verbosity, String> {
    s.parse().map_err(|e: paddock_engine::EngineError| e.to_string())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = resolve_settings(&cli)?;
    init_tracing(&settings.logging);

    match cli.command {
        Command::Context {
            now,
            refresh,
            output,
            verbosity,
        } => {
            let manager = TemporalContextManager::from_settings(&settings);
            let now = now.unwrap_or_else(Utc::now);
            let resolved = manager.resolve(now, refresh)?;
            tracing::debug!(source = %resolved.source, "context resolved");
            print_snapshot(&resolved.snapshot, Some(&resolved.record), output, verbosity)
        }
        Command::Analyze {
            schedule,
            now,
            output,
            verbosity,
        } => {
            let schedule = SeasonSchedule::load(&schedule)
                .with_context(|| format!("Failed to load schedule {}", schedule.display()))?;
            let snapshot = analyze(now.unwrap_or_else(Utc::now), &schedule, &settings.analyzer)?;
            print_snapshot(&snapshot, None, output, verbosity)
        }
        Command::Cache { action } => {
            let cache = TemporalCache::from_settings(&settings.cache);
            match action {
                CacheAction::Show { now, output } => {
                    show_cache(&cache, now.unwrap_or_else(Utc::now), output)
                }
                CacheAction::Clear => clear_cache(&cache, &settings.cache.path),
            }
        }
    }
}

/// Settings file (explicit or default), then env, then command-line overrides.
fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.settings {
        Some(path) => load_settings_from_path(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => load_settings().context("Failed to load settings")?,
    };
    if let Some(path) = &cli.cache_file {
        settings.cache.path = path.clone();
    }
    if let Some(dir) = &cli.schedule_dir {
        settings.provider.schedule_dir = dir.clone();
    }
    Ok(settings)
}

/// Logs go to stderr so stdout stays clean for prompt text and JSON.
fn init_tracing(logging: &LoggingSettings) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_snapshot(
    snapshot: &TemporalSnapshot,
    record: Option<&CacheRecord>,
    output: OutputFormat,
    verbosity: Verbosity,
) -> Result<()> {
    match output {
        OutputFormat::Json => {
            let value = to_structured(snapshot).context("Failed to serialize snapshot")?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Prompt => println!("{}", format_prompt(snapshot, verbosity)),
        OutputFormat::Report => println!("{}", format_report(snapshot, record)),
    }
    Ok(())
}

fn show_cache(cache: &TemporalCache, now: DateTime<Utc>, output: OutputFormat) -> Result<()> {
    let Some(record) = cache.get_stale() else {
        println!("No cache record.");
        return Ok(());
    };

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
        OutputFormat::Prompt => println!("{}", format_prompt(&record.snapshot, Verbosity::Normal)),
        OutputFormat::Report => {
            println!(
                "Cached {} ago",
                describe_minutes(record.age(now).num_minutes())
            );
            match record.remaining(now) {
                Some(left) => println!(
                    "Status: valid, expires in {}",
                    describe_minutes(left.num_minutes())
                ),
                None => println!(
                    "Status: expired {} ago",
                    describe_minutes((now - record.expires_at).num_minutes())
                ),
            }
            println!("{}", format_report(&record.snapshot, Some(&record)));
        }
    }
    Ok(())
}

fn clear_cache(cache: &TemporalCache, path: &Path) -> Result<()> {
    if cache.invalidate()? {
        println!("Removed cache record at {}", path.display());
    } else {
        println!("No cache record at {}", path.display());
    }
    Ok(())
}
