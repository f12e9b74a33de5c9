//! Output sinks for processed reports.
//!
//! Writes the report workbook, the JSON run summary and the per-subject
//! statistics CSV.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::{debug, error, info};

use crate::engine::analyzer::{ProcessOutcome, SheetReport, SkippedSheet};
use crate::engine::layout::{Cell, LayoutRow, QuarterBlock, REPORTED_GRADES, RowKind, block_offsets};
use crate::engine::types::Quarter;
use crate::stats::QuarterStats;

const BORDER: u32 = 0xBFBFBF;
const TITLE_BG: u32 = 0xD9E1F2;
const TITLE_TEXT: u32 = 0x203864;
const HEADER_BG: u32 = 0x4472C4;
const HEADER_TEXT: u32 = 0xFFFFFF;
const STRIPE_BG: u32 = 0xF9F9F9;
const DATA_BG: u32 = 0xFFFFFF;
const QUALITY_BG: u32 = 0xE2EFDA;
const PERFORMANCE_BG: u32 = 0xFFF2CC;
const CLASS_BG: u32 = 0xBDD7EE;

/// Rows scanned when sizing columns.
const WIDTH_SCAN_ROWS: usize = 100;

fn grade_fill(grade: u8) -> u32 {
    match grade {
        5 => 0xE2EFDA,
        4 => 0xFFF2CC,
        _ => 0xFCE4D6,
    }
}

/// Cell format for column `col` of a row of `kind` in a block `width` columns wide.
fn cell_format(kind: RowKind, col: usize, width: usize, stripe: bool, cell: &Cell) -> Format {
    let base = Format::new()
        .set_border(FormatBorder::Thin)
        .set_border_color(BORDER)
        .set_align(FormatAlign::VerticalCenter);
    let stat_start = width.saturating_sub(REPORTED_GRADES.len());

    let format = match kind {
        RowKind::Title => base
            .set_bold()
            .set_font_size(14.0)
            .set_font_color(TITLE_TEXT)
            .set_background_color(TITLE_BG)
            .set_align(FormatAlign::Center)
            .set_text_wrap(),
        RowKind::Header => base
            .set_bold()
            .set_font_size(10.0)
            .set_font_color(HEADER_TEXT)
            .set_background_color(HEADER_BG)
            .set_align(FormatAlign::Center)
            .set_text_wrap(),
        RowKind::Student if col >= stat_start => base
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_background_color(grade_fill(REPORTED_GRADES[col - stat_start])),
        RowKind::Student => base
            .set_background_color(if stripe { STRIPE_BG } else { DATA_BG })
            .set_align(if col == 1 {
                FormatAlign::Left
            } else {
                FormatAlign::Center
            }),
        RowKind::GradeCount(g) => base
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_background_color(grade_fill(g)),
        RowKind::Quality => base
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_background_color(QUALITY_BG),
        RowKind::Performance => base
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_background_color(PERFORMANCE_BG),
        RowKind::ClassQuality | RowKind::ClassPerformance => base
            .set_bold()
            .set_background_color(CLASS_BG)
            .set_align(if col == 0 {
                FormatAlign::Left
            } else {
                FormatAlign::Center
            }),
    };

    match cell {
        Cell::Percent(_) => format.set_num_format("0.00"),
        _ => format,
    }
}

fn write_cell(ws: &mut Worksheet, row: u32, col: u16, cell: &Cell, format: &Format) -> Result<()> {
    match cell {
        Cell::Blank => ws.write_blank(row, col, format)?,
        Cell::Text(s) => ws.write_string_with_format(row, col, s, format)?,
        Cell::Number(n) => ws.write_number_with_format(row, col, *n as f64, format)?,
        Cell::Percent(p) => ws.write_number_with_format(row, col, *p, format)?,
    };
    Ok(())
}

fn write_row(ws: &mut Worksheet, at: usize, row: &LayoutRow, width: usize) -> Result<()> {
    let r = u32::try_from(at).context("row index out of range")?;
    let stripe = row.kind == RowKind::Student
        && matches!(row.cells.first(), Some(Cell::Number(n)) if n % 2 == 1);

    for (c, cell) in row.cells.iter().enumerate() {
        let col = u16::try_from(c).context("column index out of range")?;
        let format = cell_format(row.kind, c, width, stripe, cell);

        if row.span_from == Some(c) && width > c + 1 {
            let last = u16::try_from(width - 1).context("column index out of range")?;
            ws.merge_range(r, col, r, last, "", &format)?;
        }
        write_cell(ws, r, col, cell, &format)?;
    }
    Ok(())
}

fn write_block(ws: &mut Worksheet, start: usize, block: &QuarterBlock) -> Result<()> {
    for (i, row) in block.rows.iter().enumerate() {
        write_row(ws, start + i, row, block.width)?;
        if row.kind == RowKind::Header {
            ws.set_row_height(u32::try_from(start + i)?, 40)?;
        }
    }
    Ok(())
}

/// Display length of a cell, used for column sizing.
fn cell_len(cell: &Cell) -> usize {
    match cell {
        Cell::Blank => 0,
        Cell::Text(s) => s.chars().count(),
        Cell::Number(n) => n.to_string().len(),
        Cell::Percent(p) => format!("{p:.2}").len(),
    }
}

fn column_widths(blocks: &[QuarterBlock]) -> Vec<f64> {
    let width = blocks.iter().map(|b| b.width).max().unwrap_or(0);
    let mut longest = vec![0usize; width];

    for row in blocks
        .iter()
        .flat_map(|b| b.rows.iter())
        .filter(|r| r.kind != RowKind::Title)
        .take(WIDTH_SCAN_ROWS)
    {
        for (c, cell) in row.cells.iter().enumerate() {
            longest[c] = longest[c].max(cell_len(cell));
        }
    }

    longest
        .iter()
        .enumerate()
        .map(|(c, &len)| match c {
            0 => 25.0,
            _ if len > 15 => (len + 2).min(15) as f64,
            _ => (len + 2).min(12) as f64,
        })
        .collect()
}

/// Renders one sheet report into a standalone worksheet.
pub fn render_sheet(report: &SheetReport) -> Result<Worksheet> {
    let mut ws = Worksheet::new();
    ws.set_name(&report.sheet_name)?;

    for (start, block) in block_offsets(&report.blocks).into_iter().zip(&report.blocks) {
        write_block(&mut ws, start, block)?;
    }
    for (c, w) in column_widths(&report.blocks).into_iter().enumerate() {
        ws.set_column_width(u16::try_from(c)?, w)?;
    }

    Ok(ws)
}

/// Writes every renderable sheet to `path` and returns the names written.
/// A sheet that fails to render is logged and left out; when none render,
/// no file is created.
pub fn write_report(sheets: &[SheetReport], path: &Path) -> Result<Vec<String>> {
    let mut workbook = Workbook::new();
    let mut written = Vec::new();

    for sheet in sheets {
        match render_sheet(sheet) {
            Ok(ws) => {
                workbook.push_worksheet(ws);
                written.push(sheet.sheet_name.clone());
            }
            Err(e) => error!(sheet = %sheet.source_name, error = %e, "Failed to render sheet, skipping"),
        }
    }

    if written.is_empty() {
        return Ok(written);
    }

    workbook
        .save(path)
        .with_context(|| format!("failed to save report to {}", path.display()))?;
    debug!(path = %path.display(), sheets = written.len(), "Workbook saved");
    Ok(written)
}

#[derive(Debug, Serialize)]
pub struct SubjectSummary {
    pub subject: String,
    #[serde(flatten)]
    pub stats: QuarterStats,
}

#[derive(Debug, Serialize)]
pub struct QuarterSummary {
    pub quarter: Quarter,
    pub subjects: Vec<SubjectSummary>,
    pub class: QuarterStats,
}

#[derive(Debug, Serialize)]
pub struct SheetSummary {
    pub source_name: String,
    pub sheet_name: String,
    pub students: usize,
    pub quarters: Vec<QuarterSummary>,
}

/// Machine-readable account of one run.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub input: String,
    pub output: Option<String>,
    pub success: bool,
    pub sheets: Vec<SheetSummary>,
    pub skipped: Vec<SkippedSheet>,
}

impl RunSummary {
    pub fn from_outcome(input: &Path, outcome: &ProcessOutcome) -> Self {
        let sheets = outcome
            .sheets
            .iter()
            .map(|s| SheetSummary {
                source_name: s.source_name.clone(),
                sheet_name: s.sheet_name.clone(),
                students: s.students,
                quarters: s
                    .blocks
                    .iter()
                    .map(|b| QuarterSummary {
                        quarter: b.quarter,
                        subjects: b
                            .aggregate
                            .subjects
                            .iter()
                            .map(|subj| SubjectSummary {
                                subject: subj.subject.clone(),
                                stats: subj.counts.into(),
                            })
                            .collect(),
                        class: b.aggregate.class.into(),
                    })
                    .collect(),
            })
            .collect();

        RunSummary {
            generated_at: Utc::now(),
            input: input.display().to_string(),
            output: outcome.output.as_ref().map(|p| p.display().to_string()),
            success: outcome.success(),
            sheets,
            skipped: outcome.skipped.clone(),
        }
    }

    /// Flattens the summary into CSV rows: one per subject plus one class row per quarter.
    pub fn records(&self) -> Vec<StatsRecord> {
        let mut records = Vec::new();
        for sheet in &self.sheets {
            for q in &sheet.quarters {
                let scoped = q
                    .subjects
                    .iter()
                    .map(|s| ("subject", s.subject.as_str(), &s.stats))
                    .chain(std::iter::once(("class", "", &q.class)));
                for (scope, subject, stats) in scoped {
                    records.push(StatsRecord {
                        generated_at: self.generated_at,
                        sheet: sheet.sheet_name.clone(),
                        quarter: q.quarter.code().to_string(),
                        scope: scope.to_string(),
                        subject: subject.to_string(),
                        count5: stats.count5,
                        count4: stats.count4,
                        count3: stats.count3,
                        total: stats.total,
                        quality: stats.quality,
                        performance: stats.performance,
                    });
                }
            }
        }
        records
    }
}

#[derive(Debug, Serialize)]
pub struct StatsRecord {
    pub generated_at: DateTime<Utc>,
    pub sheet: String,
    pub quarter: String,
    pub scope: String,
    pub subject: String,
    pub count5: usize,
    pub count4: usize,
    pub count3: usize,
    pub total: usize,
    pub quality: f64,
    pub performance: f64,
}

/// Logs the summary using Rust's debug pretty-print format.
pub fn print_pretty(summary: &RunSummary) {
    debug!("{:#?}", summary);
}

/// Writes the summary as pretty-printed JSON.
pub fn write_summary_json(path: &Path, summary: &RunSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write summary {}", path.display()))?;
    info!(path = %path.display(), "Summary written");
    Ok(())
}

/// Appends statistics rows to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_stats(path: &Path, records: &[StatsRecord]) -> Result<()> {
    let file_exists = path.exists();
    debug!(path = %path.display(), file_exists, rows = records.len(), "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}
