//! CLI entry point for the report generator session.

use anyhow::{Context, Result, anyhow};
use clap::{Args as ClapArgs, Parser, Subcommand};
use dotenv::dotenv;
use report_session::{
    FilterKind, GenerationStatus, ProgressUpdate, ReportSession, SessionConfig, SessionDriver,
    SessionSnapshot, templates,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "report-session",
    version,
    about = "Simulated report generator with cancellable progress and expiring history",
    after_help = "ENVIRONMENT VARIABLES:\n  \
                  REPORT_TICK_INTERVAL_MS   Interval between progress ticks\n  \
                  REPORT_PROGRESS_STEP      Percent added per tick\n  \
                  REPORT_RETENTION_DAYS     Days a generated report stays active\n  \
                  REPORT_DOWNLOAD_BASE      Prefix for download references\n\n\
                  EXAMPLES:\n  \
                  # List available report templates\n  \
                  report-session templates\n\n  \
                  # Generate a sales report\n  \
                  report-session generate -t sales -f dateRange=2024-01 -f region=North -f productCategory=Electronics\n\n  \
                  # Cancel after three ticks\n  \
                  report-session generate -t sales -f dateRange=2024-01 -f region=North -f productCategory=Books --cancel-after-ticks 3"
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Suppress progress output (only show warnings and the final result)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable text
    ///
    /// Disables all logging so stdout carries only JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the report templates and their filters
    Templates,
    /// Run one generation and print the resulting history
    Generate(GenerateArgs),
}

#[derive(ClapArgs, Debug)]
struct GenerateArgs {
    /// Template id (see `templates`)
    #[arg(short, long)]
    template: String,

    /// Filter value as key=value; repeat for each filter
    #[arg(short, long = "filter", value_parser = parse_filter)]
    filters: Vec<(String, String)>,

    /// Interval between progress ticks in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Percent added per tick
    #[arg(long)]
    progress_step: Option<u8>,

    /// Days a generated report stays active
    #[arg(long)]
    retention_days: Option<u32>,

    /// Cancel the generation after this many ticks
    #[arg(long)]
    cancel_after_ticks: Option<u32>,
}

fn parse_filter(raw: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing filter name in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.quiet, cli.json);

    // Load environment variables from .env file
    dotenv().ok();

    match &cli.command {
        Command::Templates => print_templates(cli.json),
        Command::Generate(args) => run_generate(args, cli.json).await,
    }
}

/// Note: uses `println!` for user-facing output that must show regardless of
/// log level.
fn print_templates(json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(templates())?);
        return Ok(());
    }

    for template in templates() {
        println!("{} ({})", template.name, template.id);
        println!("  {}", template.description);
        for filter in &template.filters {
            match &filter.kind {
                FilterKind::Text => println!("    {:<18} {}", filter.id, filter.label),
                FilterKind::Enumerated { options } => println!(
                    "    {:<18} {} [{}]",
                    filter.id,
                    filter.label,
                    options.join(", ")
                ),
            }
        }
        println!();
    }
    Ok(())
}

fn build_config(args: &GenerateArgs) -> Result<SessionConfig> {
    let base = SessionConfig::from_env().context("Reading configuration from environment")?;

    let mut builder = SessionConfig::builder().base(base);
    if let Some(ms) = args.tick_ms {
        builder = builder.tick_interval_ms(ms);
    }
    if let Some(step) = args.progress_step {
        builder = builder.progress_step(step);
    }
    if let Some(days) = args.retention_days {
        builder = builder.retention_days(days);
    }

    Ok(builder.build()?)
}

async fn run_generate(args: &GenerateArgs, json: bool) -> Result<()> {
    let config = build_config(args)?;
    debug!(?config, "Session configuration");
    info!(
        "Generation takes {} ticks of {} ms",
        config.ticks_to_complete(),
        config.tick_interval_ms
    );

    let (tx, mut rx) = mpsc::unbounded_channel::<ProgressUpdate>();
    let session = ReportSession::builder()
        .config(config)
        .on_progress(move |update| {
            // receiver only goes away once we stop listening
            let _ = tx.send(update);
        })
        .build()?;

    let driver = SessionDriver::new(session);
    driver.select_report_template(&args.template)?;
    for (key, value) in &args.filters {
        driver.set_filter_value(key, value.as_str())?;
    }

    let attempt = driver.start_generation()?;
    let mut ticks = 0_u32;

    while let Some(update) = rx.recv().await {
        if update.attempt != attempt {
            continue;
        }

        match update.status {
            GenerationStatus::Completed => info!("{}", update.message),
            GenerationStatus::Cancelled => warn!("{}", update.message),
            GenerationStatus::Generating if update.progress > 0 => {
                ticks += 1;
                info!("[{:>3}%] {}", update.progress, update.message);
                if args.cancel_after_ticks == Some(ticks) {
                    info!("Cancelling after {} ticks", ticks);
                    driver.cancel_generation();
                }
            }
            _ => info!("{}", update.message),
        }

        if update.status.is_terminal() {
            break;
        }
    }

    let unsettled = driver.state().is_generating();
    let snapshot = driver.snapshot();
    driver.shutdown();

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_snapshot(&snapshot);
    }

    if unsettled {
        return Err(anyhow!("generation did not settle"));
    }
    Ok(())
}

fn print_snapshot(snapshot: &SessionSnapshot) {
    println!();
    println!(
        "Template: {}",
        snapshot.template_name.as_deref().unwrap_or("-")
    );
    println!("Status:   {}", snapshot.status.label);
    println!();
    println!("GENERATED REPORTS");
    println!("{}", "-".repeat(40));

    if snapshot.active_reports.is_empty() {
        println!("  (none)");
        return;
    }

    for report in &snapshot.active_reports {
        println!("  {} ({})", report.report_type, report.id);
        println!("    Filters:   {}", report.filters);
        println!("    Generated: {}", report.generated_at);
        println!("    Expires:   {}", report.expires_at);
        println!("    Download:  {}", report.download_url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter() {
        assert_eq!(
            parse_filter("region=North").unwrap(),
            ("region".to_string(), "North".to_string())
        );
        assert_eq!(
            parse_filter("dateRange=").unwrap(),
            ("dateRange".to_string(), String::new())
        );
        assert_eq!(
            parse_filter("note=a=b").unwrap(),
            ("note".to_string(), "a=b".to_string())
        );
        assert!(parse_filter("region").is_err());
        assert!(parse_filter("=North").is_err());
    }

    #[test]
    fn test_cli_parses_generate() {
        let cli = Cli::try_parse_from([
            "report-session",
            "generate",
            "-t",
            "sales",
            "-f",
            "region=North",
            "--filter",
            "dateRange=2024-01",
            "--cancel-after-ticks",
            "3",
            "--json",
        ])
        .unwrap();

        assert!(cli.json);
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.template, "sales");
        assert_eq!(args.filters.len(), 2);
        assert_eq!(args.cancel_after_ticks, Some(3));
    }
}
