//! CLI entry point for the quarterly report tool.
//!
//! Provides subcommands for turning a gradebook export into a quarterly
//! report workbook and for inspecting the structure of an export.

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use quarterly_report::engine::analyzer::inspect_sheet;
use quarterly_report::output::{RunSummary, append_stats, print_pretty, write_summary_json};
use quarterly_report::parser::InputWorkbook;
use quarterly_report::{ProcessOptions, ReportConfig, process_workbook};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "quarterly_report")]
#[command(about = "Builds per-quarter grade reports from gradebook exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform a gradebook workbook into a quarterly report
    Process {
        /// Input .xlsx workbook
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output workbook file name
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory to place the output workbook in
        #[arg(short = 'd', long)]
        output_dir: Option<PathBuf>,

        /// Name the output file after this class instead
        #[arg(short, long)]
        class_name: Option<String>,

        /// JSON file overriding the label rules
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write a JSON run summary to this path
        #[arg(long)]
        summary_json: Option<PathBuf>,

        /// CSV file to append per-subject statistics to
        #[arg(long)]
        stats_csv: Option<PathBuf>,
    },
    /// Log the structure of a workbook's sheets
    Inspect {
        /// Input .xlsx workbook
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Only inspect this sheet
        #[arg(short, long)]
        sheet: Option<String>,

        /// Number of data rows to show per sheet
        #[arg(short, long, default_value_t = 5)]
        rows: usize,

        /// JSON file overriding the label rules
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/quarterly_report.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("quarterly_report.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            output,
            output_dir,
            class_name,
            config,
            summary_json,
            stats_csv,
        } => {
            let config = ReportConfig::load_or_default(config.as_deref())?;
            let options = ProcessOptions {
                output_file: output.unwrap_or_else(|| PathBuf::from(&config.default_output_file)),
                output_dir,
                class_name,
                config,
            };

            let outcome = process_workbook(&input, &options)?;

            for skipped in &outcome.skipped {
                warn!(sheet = %skipped.sheet, reason = %skipped.reason, "Sheet skipped");
            }

            let summary = RunSummary::from_outcome(&input, &outcome);
            print_pretty(&summary);

            if let Some(path) = summary_json {
                write_summary_json(&path, &summary)?;
            }
            if let Some(path) = stats_csv {
                let records = summary.records();
                if let Err(e) = append_stats(&path, &records) {
                    error!(path = %path.display(), error = %e, "Failed to append statistics");
                }
            }

            if !outcome.success() {
                bail!("no sheet in {} produced a report", input.display());
            }
        }
        Commands::Inspect {
            input,
            sheet,
            rows,
            config,
        } => {
            let config = ReportConfig::load_or_default(config.as_deref())?;
            inspect(&input, sheet.as_deref(), rows, &config)?;
        }
    }

    Ok(())
}

/// Logs dimensions, merged regions, header rows and column classification
/// for each selected sheet.
#[tracing::instrument(skip(config), fields(input = %input.display()))]
fn inspect(input: &Path, only: Option<&str>, rows: usize, config: &ReportConfig) -> Result<()> {
    let mut workbook = InputWorkbook::open(input)?;
    let names: Vec<String> = match only {
        Some(name) if workbook.sheet_names().iter().any(|s| s == name) => vec![name.to_string()],
        Some(name) => bail!("sheet {name:?} not found in {}", input.display()),
        None => workbook.sheet_names().to_vec(),
    };

    info!(sheets = ?workbook.sheet_names(), "Workbook opened");

    for name in names {
        let table = match workbook.read_sheet(&name) {
            Ok(t) => t,
            Err(e) => {
                error!(sheet = %name, error = %e, "Failed to read sheet");
                continue;
            }
        };
        let report = inspect_sheet(&table, config, rows);

        info!(
            sheet = %report.sheet,
            rows = report.rows,
            columns = report.columns,
            merged = ?report.merged_regions,
            "Sheet structure"
        );
        for (i, header) in report.header_rows.iter().enumerate() {
            info!(row = i + 1, values = ?header, "Header row");
        }
        for (i, data) in report.data_rows.iter().enumerate() {
            info!(row = i + 3, values = ?data, "Data row");
        }
        for d in &report.descriptors {
            info!(
                column = d.ordinal,
                role = ?d.role,
                subject = d.subject.as_deref().unwrap_or(""),
                quarter = d.quarter.as_ref().map(|q| q.to_string()).unwrap_or_default(),
                "Column"
            );
        }
    }

    Ok(())
}
