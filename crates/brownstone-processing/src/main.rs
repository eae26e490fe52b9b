//! CLI entry point for the sales analysis pipeline.

use anyhow::{Result, anyhow};
use brownstone_processing::{AnalysisRun, Pipeline, PipelineConfig, ReportGenerator};
use clap::Parser;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Batch statistical analysis of NYC property sales",
    long_about = "Cleans a property-sales extract, computes global and \
                  neighborhood-level z-scores plus per-unit metrics, and \
                  renders a presentation-ready row set.\n\n\
                  EXAMPLES:\n  \
                  # Basic usage\n  \
                  brownstone-processing -i nyc_sales.csv\n\n  \
                  # Custom output location and report file\n  \
                  brownstone-processing -i nyc_sales.csv -o results/ --emit-report\n\n  \
                  # Machine-readable summary\n  \
                  brownstone-processing -i nyc_sales.csv --json | jq .summary"
)]
struct Args {
    /// Path to the sales CSV file to analyze
    #[arg(short, long)]
    input: String,

    /// Output directory for results
    #[arg(short, long, default_value = "./outputs")]
    output: String,

    /// Custom output file name (without extension)
    ///
    /// If not specified, uses "<input_name>_enriched"
    #[arg(long)]
    output_name: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and the final summary)
    #[arg(short, long)]
    quiet: bool,

    /// Output the report as JSON to stdout instead of a human-readable summary
    ///
    /// Disables all logs; only the final JSON report is written to stdout.
    #[arg(long)]
    json: bool,

    /// Write a detailed JSON report to the output directory
    ///
    /// The report will be saved as <input_name>_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,

    /// Strict lower bound on segment size; smaller (neighborhood, building
    /// class) segments fall back to global statistics
    #[arg(long, default_value = "5")]
    segment_min_count: usize,

    /// Number of neighborhoods ranked by transaction count in the summary
    #[arg(long, default_value = "10")]
    top: usize,
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

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    info!("Loading sales table from: {}", args.input);
    let data = load_csv_with_fallbacks(&args.input)?;
    info!("Sales table loaded: {:?}", data.shape());

    let input_stem = extract_file_stem(&args.input);

    // Report output is handled here via --emit-report, so the pipeline's
    // internal report generation stays off.
    let mut config_builder = PipelineConfig::builder()
        .output_dir(&args.output)
        .segment_min_count(args.segment_min_count)
        .top_neighborhoods(args.top)
        .generate_report(false)
        .output_name(
            args.output_name
                .clone()
                .unwrap_or_else(|| format!("{}_enriched", input_stem)),
        );

    if args.json {
        // JSON mode is a pure stdout contract; skip disk output
        config_builder = config_builder.save_to_disk(false);
    }

    let config = config_builder.build()?;
    let pipeline = Pipeline::builder().config(config).build()?;

    let run = match pipeline.run(data) {
        Ok(run) => run,
        Err(e) => {
            error!("Pipeline failed: {}", e);
            return Err(anyhow!("Pipeline failed: {}", e));
        }
    };

    let report = ReportGenerator::build_report(&args.input, &run);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if args.emit_report {
        let generator = ReportGenerator::new(std::path::PathBuf::from(&args.output), None);
        let report_path = generator.write_report_json(&report, &input_stem)?;
        info!("Report written to: {}", report_path.display());
    }

    print_human_readable_summary(&run, &args);

    Ok(())
}

/// Extract the file stem (name without extension) from a path.
fn extract_file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("sales")
        .to_string()
}

/// Print a human-readable summary of the analysis results.
///
/// This uses `println!` intentionally for user-facing CLI output; unlike
/// logging it should always be visible regardless of log level settings.
fn print_human_readable_summary(run: &AnalysisRun, args: &Args) {
    let summary = &run.summary;

    println!();
    println!("{}", "=".repeat(80));
    println!("SALES ANALYSIS COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} rows)",
        args.input, summary.rows_loaded
    );
    if let Some(ref path) = run.output_path {
        println!(
            "Output: {} ({} rows x {} columns)",
            path.display(),
            run.presentation.height(),
            run.presentation.width()
        );
    }
    println!();

    println!("Cleaning:");
    println!(
        "  Rows: {} -> {} ({} dropped)",
        summary.rows_loaded, summary.rows_kept, summary.rows_dropped
    );
    if !summary.drops.is_empty() {
        println!(
            "  Invalid fields: sale_price {}, total_units {}, gross_square_feet {}",
            summary.drops.invalid_sale_price,
            summary.drops.invalid_total_units,
            summary.drops.invalid_gross_square_feet
        );
    }
    println!();

    println!("Statistics:");
    println!(
        "  Mean sale price: {}",
        brownstone_processing::format_currency(summary.global_mean_sale_price)
    );
    if let Some(stddev) = summary.global_stddev_sale_price {
        println!(
            "  Stddev (sample): {}",
            brownstone_processing::format_currency(stddev)
        );
    }
    println!("  Qualifying segments: {}", summary.qualifying_segments);
    println!(
        "  Log-price distribution: {}",
        summary.log_sale_price.shape
    );
    if let Some(ref range) = summary.sale_date_range {
        println!("  Sale dates: {} to {}", range.earliest, range.latest);
    }
    println!();

    if !summary.top_neighborhoods.is_empty() {
        println!("Top neighborhoods by transaction count:");
        for entry in &summary.top_neighborhoods {
            println!("  {:<30} {}", entry.neighborhood, entry.transactions);
        }
        println!();
    }

    println!("Duration: {}ms", run.duration_ms);
    println!();
    println!("Use --json for machine-readable output");
    println!("Use --emit-report to save a detailed JSON report");
    println!("{}", "=".repeat(80));
}

/// Load CSV with multiple fallback strategies.
///
/// Every column is read as text so each field passes through the cleaner's
/// fallible casts.
fn load_csv_with_fallbacks(path: &str) -> Result<DataFrame> {
    use std::path::PathBuf;

    // Strategy 1: standard loading with quote handling
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(0))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => {
            debug!("Standard loading failed: {}", e);
        }
    }

    // Strategy 2: without quote handling
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(0))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => {
            debug!("Loading without quotes failed: {}", e);
        }
    }

    // Strategy 3: pre-clean content
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cleaned = clean_csv_content(&content);
            use std::io::Cursor;
            let cursor = Cursor::new(cleaned);

            CsvReadOptions::default()
                .with_infer_schema_length(Some(0))
                .with_has_header(true)
                .into_reader_with_file_handle(cursor)
                .finish()
                .map_err(|e| e.into())
        }
        Err(e) => {
            error!("Could not read file: {}", e);
            Err(e.into())
        }
    }
}

/// Strip quote artifacts and blank lines from malformed CSV content.
fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
