//! cradlewatch CLI
//!
//! Replays sensor snapshot batches from disk through the derivation core.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand, ValueEnum};
use cradlewatch::{
    config::Config,
    core::{analyze, Aggregate, Analysis, ReportBuilder, RangeStats, TimelineSummary},
    snapshot::{normalize_batch, parse_records, read_records, NormalizeOptions, Snapshot},
    ActivityEvent, ASSESSMENT_DISCLAIMER, VERSION,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cradlewatch")]
#[command(version = VERSION)]
#[command(about = "Event derivation and health insights for baby-monitor snapshots", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a batch of snapshot records
    Analyze {
        /// JSON array or JSON Lines file of raw records
        #[arg(long, short)]
        input: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Report missing aggregates as unavailable instead of a placeholder wave
        #[arg(long)]
        no_placeholder: bool,
    },

    /// Print only the derived activity timeline
    Events {
        /// JSON array or JSON Lines file of raw records
        #[arg(long, short)]
        input: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Re-read a batch file periodically and report each new batch
    Watch {
        /// JSON array or JSON Lines file of raw records
        #[arg(long, short)]
        input: PathBuf,

        /// Seconds between reads
        #[arg(long, default_value = "5")]
        interval: u64,
    },

    /// Show configuration
    Config {
        /// Print only the configuration file path
        #[arg(long)]
        path: bool,

        /// Write the default configuration if no file exists yet
        #[arg(long, conflicts_with = "path")]
        init: bool,
    },

    /// Display the assessment disclaimer
    Disclaimer,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cradlewatch=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze {
            input,
            format,
            no_placeholder,
        } => {
            let mut config = config;
            if no_placeholder {
                config.placeholder_fallback = false;
            }
            cmd_analyze(&input, format, &config)
        }
        Commands::Events { input, format } => cmd_events(&input, format, &config),
        Commands::Watch { input, interval } => cmd_watch(input, interval, config),
        Commands::Config { path, init } => cmd_config(cli.config.as_deref(), path, init, &config),
        Commands::Disclaimer => {
            println!("{ASSESSMENT_DISCLAIMER}");
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Config::load().context("loading configuration"),
    }
}

fn normalize(records: &[cradlewatch::RawRecord], config: &Config) -> Vec<Snapshot> {
    let options = NormalizeOptions::new(config.default_confidence, Utc::now());
    normalize_batch(records, &options)
}

fn load_batch(input: &Path, config: &Config) -> Result<Vec<Snapshot>> {
    let records =
        read_records(input).with_context(|| format!("reading records from {}", input.display()))?;
    Ok(normalize(&records, config))
}

fn cmd_analyze(input: &Path, format: OutputFormat, config: &Config) -> Result<()> {
    let snapshots = load_batch(input, config)?;
    let now = Utc::now();
    let analysis = analyze(&snapshots, config, now);

    match format {
        OutputFormat::Json => {
            let builder = ReportBuilder::new();
            let report = builder.build(analysis, now);
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("serializing report")?
            );
        }
        OutputFormat::Text => {
            let tz = config.timezone()?;
            print_analysis(&analysis, tz);
        }
    }
    Ok(())
}

fn cmd_events(input: &Path, format: OutputFormat, config: &Config) -> Result<()> {
    let snapshots = load_batch(input, config)?;
    let analysis = analyze(&snapshots, config, Utc::now());

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&analysis.events).context("serializing events")?
        ),
        OutputFormat::Text => {
            let tz = config.timezone()?;
            print_timeline(&analysis.timeline, &analysis.events, tz);
        }
    }
    Ok(())
}

fn cmd_watch(input: PathBuf, interval: u64, config: Config) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;
    runtime.block_on(watch_loop(input, interval, config))
}

async fn watch_loop(input: PathBuf, interval: u64, config: Config) -> Result<()> {
    let tz = config.timezone()?;
    let mut ticker = tokio::time::interval(Duration::from_secs(interval.max(1)));
    let mut last_content: Option<String> = None;

    tracing::info!(input = %input.display(), interval, "watching batch file, press Ctrl+C to stop");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let content = match tokio::fs::read_to_string(&input).await {
                    Ok(content) => content,
                    Err(e) => {
                        tracing::warn!(error = %e, "could not read batch file");
                        continue;
                    }
                };
                if last_content.as_deref() == Some(content.as_str()) {
                    continue;
                }

                match parse_records(&content) {
                    Ok(records) => {
                        let snapshots = normalize(&records, &config);
                        let analysis = analyze(&snapshots, &config, Utc::now());
                        tracing::info!(
                            snapshots = analysis.snapshot_count,
                            events = analysis.timeline.total_events,
                            status = ?analysis.insight.status,
                            "analyzed new batch"
                        );
                        print_status_line(&analysis, tz);
                    }
                    Err(e) => tracing::warn!(error = %e, "skipping malformed batch"),
                }
                last_content = Some(content);
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("stopping watch");
                break;
            }
        }
    }
    Ok(())
}

fn cmd_config(
    explicit: Option<&Path>,
    path_only: bool,
    init: bool,
    config: &Config,
) -> Result<()> {
    let path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::config_path);
    if init {
        Config::init_at(&path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }
    if path_only {
        println!("{}", path.display());
        return Ok(());
    }

    println!("Configuration file: {}", path.display());
    println!(
        "{}",
        serde_json::to_string_pretty(config).context("serializing configuration")?
    );
    Ok(())
}

fn local_time(at: DateTime<Utc>, tz: Tz) -> String {
    at.with_timezone(&tz).format("%Y-%m-%d %H:%M:%S %Z").to_string()
}

fn aggregate_text(aggregate: &Aggregate, unit: &str) -> String {
    match aggregate {
        Aggregate::Measured(v) => format!("{v}{unit}"),
        Aggregate::Placeholder(v) => format!("{v}{unit} (placeholder)"),
        Aggregate::Unavailable => "n/a".to_string(),
    }
}

fn range_text(stats: Option<&RangeStats>) -> String {
    match stats {
        Some(s) => format!(
            "{}% within normal range ({} of {} readings)",
            s.normal_pct, s.within, s.total
        ),
        None => "no readings".to_string(),
    }
}

fn print_status_line(analysis: &Analysis, tz: Tz) {
    let latest = analysis
        .latest_at
        .map(|at| local_time(at, tz))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "[{latest}] {} | {} snapshots | {} events ({} high) | {}",
        analysis.insight.status.label(),
        analysis.snapshot_count,
        analysis.timeline.total_events,
        analysis.timeline.high_severity,
        analysis.timeline.state.label(),
    );
}

fn print_analysis(analysis: &Analysis, tz: Tz) {
    println!("cradlewatch v{VERSION}");
    println!();
    println!("Snapshots analyzed: {}", analysis.snapshot_count);
    if let Some(at) = analysis.latest_at {
        println!("Latest reading: {}", local_time(at, tz));
    }
    if let Some(status) = analysis.live_status {
        println!("Baby status: {}", status.label());
    }
    println!();

    let insight = &analysis.insight;
    println!("System Assessment: {}", insight.status.label());
    println!(
        "  Avg Temperature: {}",
        aggregate_text(&insight.avg_temperature, "°C")
    );
    println!(
        "  Avg Heart Rate: {}",
        aggregate_text(&insight.avg_heart_rate, " bpm")
    );
    println!("  Avg Humidity: {}", aggregate_text(&insight.avg_humidity, "%"));
    println!("  Crying Events: {}", insight.crying_count);
    println!("  Unsafe Postures: {}", insight.unsafe_posture_count);
    println!();
    println!("Interpretation:");
    println!("  {}", insight.narrative);
    println!();

    match &analysis.vitals {
        Some(vitals) => {
            println!("Vitals Monitor:");
            println!("  Temperature trend: {}", vitals.temperature_trend.label());
            println!("  Heart rate trend: {}", vitals.heart_rate_trend.label());
            println!("  Humidity trend: {}", vitals.humidity_trend.label());
            println!("  Comfort score: {}/100", vitals.comfort);
        }
        None => println!("Vitals Monitor: waiting for vitals data"),
    }
    println!();

    println!("Health Trends:");
    println!(
        "  Temperature: {}",
        range_text(analysis.trends.temperature.as_ref())
    );
    println!(
        "  Heart rate: {}",
        range_text(analysis.trends.heart_rate.as_ref())
    );
    println!();

    let moods = &analysis.moods;
    println!(
        "Moods: sleeping {}, crying {}, unsafe posture {}, unknown {}",
        moods.sleeping, moods.crying, moods.distress, moods.unknown
    );
    println!();

    print_timeline(&analysis.timeline, &analysis.events, tz);
    println!();
    println!("{ASSESSMENT_DISCLAIMER}");
}

fn print_timeline(timeline: &TimelineSummary, events: &[ActivityEvent], tz: Tz) {
    println!(
        "Activity Timeline: {} events, {} high severity, {}",
        timeline.total_events,
        timeline.high_severity,
        timeline.state.label()
    );
    for event in events {
        println!(
            "  [{}] {:<6} {} - {} ({} subsystem)",
            local_time(event.timestamp, tz),
            event.severity.label(),
            event.title,
            event.description,
            event.source.label()
        );
    }
}
