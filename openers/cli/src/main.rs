use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use openers_insights::{read_document, AnalysisConfig, AnalysisPipeline, PipelineTelemetry};
use serde_json::{json, Value};
use shared_logging::LogLevel;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "openers", version, about = "Talk opener analysis")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs the full analysis and writes the insights document.
    Run(RunArgs),
    /// Loads the corpus and reports data quality without testing anything.
    Validate {
        #[arg(long)]
        corpus: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Prints the findings of an existing insights document.
    Summary {
        #[arg(long)]
        insights: PathBuf,
    },
}

#[derive(Parser, Debug)]
struct RunArgs {
    #[arg(long)]
    corpus: PathBuf,
    #[arg(long, default_value = "insights.json")]
    out: PathBuf,
    #[arg(long)]
    config: Option<PathBuf>,
    /// JSON-lines run log.
    #[arg(long)]
    log: Option<PathBuf>,
    /// RFC 3339 timestamp stamped into the document; defaults to now.
    #[arg(long, value_parser = parse_timestamp)]
    generated_at: Option<DateTime<Utc>>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => handle_run(args),
        Commands::Validate { corpus, config } => {
            let pipeline = AnalysisPipeline::new(load_config(config.as_ref())?);
            let quality = pipeline.validate(&corpus)?;
            println!("{}", serde_json::to_string_pretty(&quality)?);
            Ok(())
        }
        Commands::Summary { insights } => {
            let document = read_document(&insights)?;
            println!(
                "{} talks | generated {} | schema {}",
                document.provenance.corpus_size,
                document.provenance.generated_at,
                document.provenance.schema_version
            );
            for finding in &document.findings {
                let p_value = finding
                    .p_value
                    .map_or_else(|| "-".to_string(), |p| format!("{p:.3e}"));
                println!("{:<28} | {:<17} | {p_value}", finding.name, finding.verdict.label());
            }
            Ok(())
        }
    }
}

fn handle_run(args: RunArgs) -> Result<()> {
    let config = load_config(args.config.as_ref())?;
    let mut pipeline = AnalysisPipeline::new(config);
    if let Some(log) = &args.log {
        let telemetry = PipelineTelemetry::builder("openers").log_path(log).build()?;
        log_or_warn(
            &telemetry,
            "run.started",
            json!({
                "corpus": args.corpus.display().to_string(),
                "out": args.out.display().to_string(),
            }),
        );
        pipeline = pipeline.with_telemetry(telemetry);
    }
    let generated_at = args.generated_at.unwrap_or_else(Utc::now);
    let summary = pipeline.run(&args.corpus, &args.out, generated_at)?;
    info!(
        strong = summary.battery.strong,
        moderate = summary.battery.moderate,
        insufficient = summary.battery.insufficient_data,
        "battery summary"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Writes one run-log record; a failed write is reported and otherwise ignored.
fn log_or_warn(telemetry: &PipelineTelemetry, message: &str, metadata: Value) -> bool {
    match telemetry.log(LogLevel::Info, message, metadata) {
        Ok(()) => true,
        Err(err) => {
            warn!(error = %err, message, "telemetry write failed");
            false
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<AnalysisConfig> {
    path.map_or_else(|| Ok(AnalysisConfig::default()), AnalysisConfig::load)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|stamp| stamp.with_timezone(&Utc))
        .with_context(|| format!("invalid timestamp {raw:?}"))
}

#[cfg(test)]
mod tests {
    use shared_logging::read_log;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn run_log_records_are_written() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.jsonl");
        let telemetry = PipelineTelemetry::builder("openers").log_path(&path).build().unwrap();
        assert!(log_or_warn(&telemetry, "run.started", json!({ "corpus": "talks.csv" })));
        let records = read_log(&path).unwrap();
        assert_eq!(records[0].message, "run.started");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn failed_run_log_write_is_reported_not_fatal() {
        let telemetry = PipelineTelemetry::builder("openers")
            .log_path("/dev/full")
            .build()
            .unwrap();
        assert!(!log_or_warn(&telemetry, "run.started", json!({})));
    }

    #[test]
    fn parses_rfc3339_timestamps() {
        let stamp = parse_timestamp("2025-06-01T12:00:00+02:00").unwrap();
        assert_eq!(stamp.to_rfc3339(), "2025-06-01T10:00:00+00:00");
        assert!(parse_timestamp("yesterday").is_err());
    }
}
