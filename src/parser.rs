//! Workbook reader for raw per-class gradebook exports.
//!
//! Sheets are read one at a time into [`RawTable`]s so only a single sheet
//! is held in memory while it is being processed.

use anyhow::{Result, anyhow};
use calamine::{Data, Dimensions, Range, Reader, Xlsx, XlsxError, open_workbook};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, warn};

use crate::table::{MergedRegion, RawTable};

/// An opened input workbook.
pub struct InputWorkbook {
    workbook: Xlsx<BufReader<File>>,
    sheet_names: Vec<String>,
}

impl InputWorkbook {
    /// Opens an `.xlsx` file and loads its merged regions.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or is not a readable xlsx package.
    pub fn open(path: &Path) -> Result<Self> {
        let mut workbook: Xlsx<_> = open_workbook(path)
            .map_err(|e| anyhow!("failed to open workbook {}: {e}", path.display()))?;
        workbook
            .load_merged_regions()
            .map_err(|e| anyhow!("failed to load merged regions: {e}"))?;
        let sheet_names = workbook.sheet_names();

        debug!(path = %path.display(), sheets = sheet_names.len(), "Workbook opened");
        Ok(Self {
            workbook,
            sheet_names,
        })
    }

    pub fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    /// Reads one sheet. Merged regions are kept alongside the grid and
    /// resolved on lookup.
    pub fn read_sheet(&mut self, name: &str) -> Result<RawTable> {
        let range = self
            .workbook
            .worksheet_range(name)
            .map_err(|e| anyhow!("failed to read sheet '{name}': {e}"))?;

        let merged = merged_or_empty(name, self.workbook.worksheet_merge_cells(name));

        let regions = merged
            .iter()
            .map(|d| {
                MergedRegion::new(
                    d.start.0 as usize,
                    d.start.1 as usize,
                    d.end.0 as usize,
                    d.end.1 as usize,
                )
            })
            .collect::<Vec<_>>();

        let cells = range_to_grid(&range);
        debug!(
            sheet = name,
            rows = cells.len(),
            merged_regions = regions.len(),
            "Sheet read"
        );

        Ok(RawTable::new(name, cells, regions))
    }
}

/// Unwraps a sheet's merged regions. A read failure is logged and the sheet
/// is read without merges.
fn merged_or_empty(name: &str, merged: Option<Result<Vec<Dimensions>, XlsxError>>) -> Vec<Dimensions> {
    match merged {
        Some(Ok(regions)) => regions,
        Some(Err(e)) => {
            warn!(sheet = name, error = %e, "Failed to read merged cells, reading sheet without them");
            Vec::new()
        }
        None => Vec::new(),
    }
}

/// Copies a calamine range into a grid anchored at A1, so grid indices are
/// absolute sheet positions.
fn range_to_grid(range: &Range<Data>) -> Vec<Vec<String>> {
    let Some((last_row, last_col)) = range.end() else {
        return Vec::new();
    };

    (0..=last_row)
        .map(|row| {
            (0..=last_col)
                .map(|col| {
                    range
                        .get_value((row, col))
                        .map(cell_to_string)
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect()
}

/// Converts a calamine cell to trimmed text. Whole floats print without a
/// fractional part so `5.0` reads as `5`.
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.is_finite() {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::Empty | Data::Error(_) => String::new(),
    }
}
