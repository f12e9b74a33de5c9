use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::config::ReportConfig;
use crate::engine::aggregate::aggregate_quarter;
use crate::engine::header::classify_headers;
use crate::engine::layout::{QuarterBlock, build_block};
use crate::engine::merge::merge_columns;
use crate::engine::rows::{select_name_column, validate_rows};
use crate::engine::types::{ColumnDescriptor, Quarter, ServiceKind};
use crate::engine::utility::{class_file_name, column_letter, sanitize_sheet_name, unique_sheet_name};
use crate::output::write_report;
use crate::parser::InputWorkbook;
use crate::table::RawTable;

/// Report for one input sheet.
#[derive(Debug, Clone)]
pub struct SheetReport {
    pub source_name: String,
    /// Sanitized, workbook-unique output sheet name.
    pub sheet_name: String,
    pub students: usize,
    /// One block per quarter with data, in canonical order.
    pub blocks: Vec<QuarterBlock>,
}

/// An input sheet that produced no output sheet.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedSheet {
    pub sheet: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub output_file: PathBuf,
    pub output_dir: Option<PathBuf>,
    /// When set, the output file is named after the class instead of `output_file`.
    pub class_name: Option<String>,
    pub config: ReportConfig,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        let config = ReportConfig::default();
        Self {
            output_file: PathBuf::from(&config.default_output_file),
            output_dir: None,
            class_name: None,
            config,
        }
    }
}

impl ProcessOptions {
    pub fn output_path(&self) -> PathBuf {
        let file = match &self.class_name {
            Some(class) => PathBuf::from(class_file_name(class)),
            None => self.output_file.clone(),
        };
        match &self.output_dir {
            Some(dir) => dir.join(file),
            None => file,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    /// Where the report was written; `None` when no sheet had data.
    pub output: Option<PathBuf>,
    pub sheets: Vec<SheetReport>,
    pub skipped: Vec<SkippedSheet>,
}

impl ProcessOutcome {
    pub fn success(&self) -> bool {
        self.output.is_some()
    }
}

/// Builds the report for one sheet, or `None` when no quarter has data.
#[tracing::instrument(skip_all, fields(sheet = %table.name))]
pub fn analyze_sheet(table: &RawTable, config: &ReportConfig) -> Option<SheetReport> {
    let descriptors = classify_headers(table, config);
    let name_header = descriptors
        .iter()
        .find(|d| d.service_kind() == Some(ServiceKind::Name))
        .and_then(|d| d.subject.clone())
        .unwrap_or_else(|| config.name_header.clone());

    let students = validate_rows(table.data_rows(), &descriptors);
    if students.is_empty() {
        warn!("No student rows after filtering");
        return None;
    }
    debug!(
        students = students.len(),
        name_column = select_name_column(&descriptors),
        "Rows validated"
    );

    let merged = merge_columns(&students, &descriptors);
    debug!(columns = merged.columns.len(), "Columns merged");

    let blocks: Vec<QuarterBlock> = Quarter::ORDER
        .iter()
        .filter_map(|&quarter| {
            let aggregate = aggregate_quarter(quarter, &merged);
            if aggregate.is_none() {
                debug!(quarter = %quarter, "No grades, quarter skipped");
            }
            aggregate
        })
        .map(|aggregate| build_block(aggregate, &merged.names, &name_header))
        .collect();

    if blocks.is_empty() {
        warn!("No quarter has grades");
        return None;
    }

    info!(
        students = students.len(),
        quarters = blocks.len(),
        "Sheet analyzed"
    );
    Some(SheetReport {
        source_name: table.name.clone(),
        sheet_name: sanitize_sheet_name(&table.name, config.sheet_name_max_len),
        students: students.len(),
        blocks,
    })
}

/// Reads and analyzes every sheet, one at a time. Sheet failures are logged
/// and recorded, never propagated.
pub fn analyze_workbook(
    workbook: &mut InputWorkbook,
    config: &ReportConfig,
) -> (Vec<SheetReport>, Vec<SkippedSheet>) {
    let names = workbook.sheet_names().to_vec();
    info!(sheets = names.len(), "Processing workbook");

    let tables = names.into_iter().map(|name| {
        let table = workbook.read_sheet(&name);
        (name, table)
    });
    analyze_tables(tables, config)
}

/// Analyzes `(sheet name, read result)` pairs in order, giving each report
/// a workbook-unique sheet name.
pub fn analyze_tables<I>(tables: I, config: &ReportConfig) -> (Vec<SheetReport>, Vec<SkippedSheet>)
where
    I: IntoIterator<Item = (String, Result<RawTable>)>,
{
    let mut reports = Vec::new();
    let mut skipped = Vec::new();
    let mut taken = HashSet::new();

    for (name, table) in tables {
        let table = match table {
            Ok(t) => t,
            Err(e) => {
                error!(sheet = %name, error = %e, "Failed to read sheet, skipping");
                skipped.push(SkippedSheet {
                    sheet: name,
                    reason: format!("read error: {e}"),
                });
                continue;
            }
        };

        match analyze_sheet(&table, config) {
            Some(mut report) => {
                report.sheet_name =
                    unique_sheet_name(&report.sheet_name, &taken, config.sheet_name_max_len);
                taken.insert(report.sheet_name.clone());
                reports.push(report);
            }
            None => skipped.push(SkippedSheet {
                sheet: name,
                reason: "no quarter data".to_string(),
            }),
        }
    }

    (reports, skipped)
}

/// Keeps the reports whose sheets were written; the rest are recorded as
/// skipped render failures.
pub fn retain_written(
    sheets: Vec<SheetReport>,
    written: &[String],
    skipped: &mut Vec<SkippedSheet>,
) -> Vec<SheetReport> {
    let (kept, failed): (Vec<_>, Vec<_>) = sheets
        .into_iter()
        .partition(|s| written.contains(&s.sheet_name));
    skipped.extend(failed.into_iter().map(|s| SkippedSheet {
        sheet: s.source_name,
        reason: "render error".to_string(),
    }));
    kept
}

/// Transforms the gradebook at `input` into a quarterly report workbook.
///
/// # Errors
///
/// Fails when the input cannot be opened or the output cannot be saved.
/// A workbook without any usable sheet is not an error: the outcome has no
/// output and nothing is written.
#[tracing::instrument(skip_all, fields(input = %input.display()))]
pub fn process_workbook(input: &Path, options: &ProcessOptions) -> Result<ProcessOutcome> {
    let mut workbook = InputWorkbook::open(input)?;
    let (sheets, mut skipped) = analyze_workbook(&mut workbook, &options.config);

    if sheets.is_empty() {
        warn!(skipped = skipped.len(), "No sheet produced a report, nothing written");
        return Ok(ProcessOutcome {
            output: None,
            sheets,
            skipped,
        });
    }

    let path = options.output_path();
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    }

    let written = write_report(&sheets, &path)?;
    let sheets = retain_written(sheets, &written, &mut skipped);

    let output = (!written.is_empty()).then_some(path);
    match &output {
        Some(p) => info!(output = %p.display(), sheets = written.len(), "Report saved"),
        None => warn!("Every sheet failed to render, nothing written"),
    }

    Ok(ProcessOutcome {
        output,
        sheets,
        skipped,
    })
}

/// Structure dump of one sheet, used to diagnose unexpected exports.
#[derive(Debug, Clone, Serialize)]
pub struct SheetInspection {
    pub sheet: String,
    pub rows: usize,
    pub columns: usize,
    /// Merged regions in A1 notation.
    pub merged_regions: Vec<String>,
    pub header_rows: Vec<Vec<String>>,
    pub data_rows: Vec<Vec<String>>,
    pub descriptors: Vec<ColumnDescriptor>,
}

pub fn inspect_sheet(table: &RawTable, config: &ReportConfig, max_rows: usize) -> SheetInspection {
    let row_text = |row: usize| -> Vec<String> {
        table.row_values(row).into_iter().map(str::to_string).collect()
    };

    SheetInspection {
        sheet: table.name.clone(),
        rows: table.height(),
        columns: table.width(),
        merged_regions: table
            .regions()
            .iter()
            .map(|r| {
                format!(
                    "{}{}:{}{}",
                    column_letter(r.first_col),
                    r.first_row + 1,
                    column_letter(r.last_col),
                    r.last_row + 1
                )
            })
            .collect(),
        header_rows: (0..2.min(table.height())).map(row_text).collect(),
        data_rows: (2..table.height()).take(max_rows).map(row_text).collect(),
        descriptors: classify_headers(table, config),
    }
}
