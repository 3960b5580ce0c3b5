//! CLI entry point for the rehabilitation feature pipeline.

use anyhow::{Result, anyhow};
use clap::Parser;
use dotenv::dotenv;
use rehab_features::{DryRunReport, FeaturePipeline, PipelineConfig, RunReport, io};
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    name = "rehab-features",
    version,
    about = "Build a model-ready feature table from raw rehabilitation treatment records",
    after_help = "EXAMPLES:\n  \
                  # Fit on a dataset and write all artifacts\n  \
                  rehab-features -i data/treatments.csv -o outputs\n\n  \
                  # Transform new data with a saved state\n  \
                  rehab-features -i data/new.csv --state outputs/preprocess_state.json\n\n  \
                  # Preview without writing anything\n  \
                  rehab-features -i data/treatments.csv --dry-run"
)]
struct Args {
    /// Path to the CSV or Parquet file to process
    #[arg(short, long)]
    input: String,

    /// Output directory for artifacts
    #[arg(short, long, default_value = "outputs")]
    output: String,

    /// Output file stem for the feature table
    #[arg(long, default_value = "dataset_model_ready")]
    output_name: String,

    /// Fitted state to transform with instead of fitting
    #[arg(long)]
    state: Option<PathBuf>,

    /// Exact number of rows the input must have
    #[arg(long)]
    expected_rows: Option<usize>,

    /// Validate and preview without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Only show warnings and errors
    #[arg(short, long)]
    quiet: bool,

    /// Print the run report as JSON to stdout; disables logging
    #[arg(long)]
    json: bool,

    /// Write the run report to <output>/<input_name>_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,
}

/// Initialize the tracing subscriber.
///
/// With `json_output` no subscriber is installed so stdout carries only JSON.
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

fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    let input = Path::new(&args.input);
    if !input.exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    let mut builder = PipelineConfig::builder()
        .output_dir(&args.output)
        .output_name(&args.output_name)
        .save_to_disk(!args.dry_run);
    if let Some(rows) = args.expected_rows {
        builder = builder.expected_rows(rows);
    }
    let config = builder.build()?;

    let mut pipeline = FeaturePipeline::new(config)?;
    if let Some(ref state_path) = args.state {
        info!("Loading fitted state from: {}", state_path.display());
        pipeline = pipeline.with_state(io::load_state(state_path)?);
    }

    info!("Loading dataset from: {}", args.input);
    let raw = io::load_table(input)?;

    if args.dry_run {
        let preview = pipeline.dry_run(&raw)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&preview)?);
        } else {
            print_dry_run(&args, &preview);
        }
        return Ok(());
    }

    let output = match pipeline.run(&raw) {
        Ok(output) => output,
        Err(e) => {
            error!("Feature pipeline failed [{}]: {}", e.error_code(), e);
            return Err(anyhow!("Feature pipeline failed: {}", e));
        }
    };

    let mut report = output.report;
    report.input_file = Some(args.input.clone());

    if args.emit_report {
        let path = report.write_to_file(Path::new(&args.output), &extract_file_stem(&args.input))?;
        info!("Report written to: {}", path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_summary(&report);
    Ok(())
}

fn extract_file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string()
}

/// Print the dry-run preview.
///
/// Uses `println!` on purpose: this is the command's output, not logging.
fn print_dry_run(args: &Args, preview: &DryRunReport) {
    let validation = &preview.validation;

    println!("\n{}", "=".repeat(80));
    println!("DRY RUN - Preview of the feature table");
    println!("{}\n", "=".repeat(80));

    println!("DATASET");
    println!("{}", "-".repeat(40));
    println!("  File: {}", args.input);
    println!("  Rows: {}", validation.rows);
    println!("  Columns: {}", validation.columns);
    println!("  Column order as expected: {}", validation.column_order_ok);
    println!("  Duplicate rows: {}", validation.duplicate_rows);
    if let Some(dups) = validation.id_duplicates {
        println!("  Repeated '{}': {}", validation.id_column, dups);
    }

    println!("\nDERIVED COLUMNS");
    println!("{}", "-".repeat(40));
    for summary in [&preview.derived.sessions, &preview.derived.duration] {
        println!(
            "  {} <- {}: {}/{} non-null",
            summary.column, summary.source, summary.non_null, summary.total
        );
    }

    println!("\nFEATURES");
    println!("{}", "-".repeat(40));
    println!(
        "  Rows after dedup: {} (of {})",
        preview.dedup.rows_after, preview.dedup.rows_before
    );
    println!("  Numeric: {}", preview.block_widths.numeric);
    println!("  Categorical: {}", preview.block_widths.categorical);
    println!("  Multi-label: {}", preview.block_widths.multilabel);
    for vocabulary in &preview.vocabulary_sizes {
        println!("    {}: {} tokens", vocabulary.column, vocabulary.tokens);
    }
    println!("  Total: {}", preview.block_widths.total());

    if !validation.warnings.is_empty() {
        println!("\nWARNINGS");
        println!("{}", "-".repeat(40));
        for warning in &validation.warnings {
            println!("  - {}", warning);
        }
    }

    println!("\n{}", "=".repeat(80));
    println!("No files were written");
    println!("{}", "=".repeat(80));
}

fn print_summary(report: &RunReport) {
    println!("\n{}", "=".repeat(80));
    println!("FEATURE TABLE READY");
    println!("{}", "=".repeat(80));
    println!("  Mode: {:?}", report.mode);
    println!(
        "  Rows: {} -> {} after dedup",
        report.dedup.rows_before, report.dedup.rows_after
    );
    println!("  Features: {}", report.feature_count);
    println!(
        "  Target non-null: {}/{}",
        report.derived.sessions.non_null, report.derived.sessions.total
    );
    if !report.dropped_collisions.is_empty() {
        println!(
            "  Dropped colliding features: {}",
            report.dropped_collisions.join(", ")
        );
    }
    if let Some(ref artifacts) = report.artifacts {
        println!("  Saved: {}", artifacts.parquet.display());
        println!("  Saved: {}", artifacts.csv.display());
        println!("  Feature names: {}", artifacts.feature_names.display());
        if let Some(ref state) = artifacts.state {
            println!("  Fitted state: {}", state.display());
        }
    }
    println!("  Completed in {}ms", report.duration_ms);
    println!("{}", "=".repeat(80));
}
