//! CLI entry point for the event graph ETL tool.
//!
//! Provides subcommands for building the network graph JSON consumed by the
//! visualization and for filtering raw datasets against the country
//! allow-list.

use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand};
use event_graph_etl::{allowlist, graph, output, parser};
use tracing::{debug, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "event_graph_etl")]
#[command(about = "ETL for country-level event datasets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate the event table into a node/link graph JSON document
    BuildGraph {
        /// Semicolon-delimited event table to aggregate
        #[arg(
            short,
            long,
            default_value = "raw_datasets/middle_east_aggregated_data.csv"
        )]
        input: String,

        /// Path of the JSON document to write
        #[arg(short, long, default_value = "datasets/network_data.json")]
        output: String,

        /// Aggregate all years instead of only the last ten
        #[arg(long, default_value_t = false)]
        all_years: bool,
    },
    /// Filter raw datasets against the country allow-list
    FilterCountries {
        /// Directory containing the raw CSV datasets
        #[arg(short, long, default_value = "raw_datasets")]
        raw_dir: String,

        /// Reference file listing permitted countries (column `Country`)
        #[arg(short, long, default_value = "raw_datasets/mea_country.csv")]
        allow_list: String,

        /// Directory to write filtered copies into
        #[arg(short, long, default_value = "datasets")]
        output_dir: String,

        /// Filename prefix for filtered copies
        #[arg(short, long, default_value = "mea_")]
        prefix: String,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/event_graph_etl.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("event_graph_etl.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::BuildGraph {
            input,
            output,
            all_years,
        } => build_graph(&input, &output, !all_years)?,
        Commands::FilterCountries {
            raw_dir,
            allow_list,
            output_dir,
            prefix,
        } => filter_countries(&raw_dir, &allow_list, &output_dir, &prefix)?,
    }

    Ok(())
}

/// Reads the event table, aggregates it, and writes the graph document.
#[tracing::instrument(fields(input, output, last_ten_years))]
fn build_graph(input: &str, output: &str, last_ten_years: bool) -> Result<()> {
    let records = parser::read_records(Path::new(input))?;
    debug!(rows = records.len(), "Event table read");

    let (doc, range) = graph::build_graph(&records, last_ten_years)?;
    output::write_graph(Path::new(output), &doc)?;

    info!(
        path = output,
        nodes = doc.nodes.len(),
        links = doc.links.len(),
        "Network data created"
    );
    if let Some(range) = range {
        info!(
            min_year = range.min,
            max_year = range.max,
            "Data range (last {} years)",
            graph::WINDOW_YEARS
        );
    }

    Ok(())
}

/// Filters every CSV in the raw directory (except the allow-list itself)
/// and writes prefixed copies into the output directory.
#[tracing::instrument(fields(raw_dir, allow_list, output_dir, prefix))]
fn filter_countries(raw_dir: &str, allow_list: &str, output_dir: &str, prefix: &str) -> Result<()> {
    let allowed = allowlist::load_allow_list(Path::new(allow_list))?;
    info!(countries = allowed.len(), "Allow-list loaded");

    fs::create_dir_all(output_dir)?;
    let allow_list_name = Path::new(allow_list).file_name().map(OsStr::to_os_string);

    let mut filtered_files = 0usize;
    for entry in fs::read_dir(raw_dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        if Some(entry.file_name()) == allow_list_name {
            continue;
        }

        let (headers, rows) = allowlist::filter_dataset(&path, &allowed)?;
        let out_path =
            Path::new(output_dir).join(format!("{}{}", prefix, entry.file_name().to_string_lossy()));
        output::write_filtered(&out_path, &headers, &rows)?;

        info!(
            input = %path.display(),
            output = %out_path.display(),
            kept = rows.len(),
            "Dataset filtered"
        );
        filtered_files += 1;
    }

    info!(filtered_files, "Country filtering complete");
    Ok(())
}
