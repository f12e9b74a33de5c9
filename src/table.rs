//! In-memory view of one worksheet.
//!
//! A [`RawTable`] is a dense grid of cell text plus the sheet's merged
//! regions. Reads through [`RawTable::value`] are merge-aware: any cell inside
//! a merged region yields the text of the region's top-left cell.

use std::collections::BTreeMap;

/// A rectangular merged region, 0-based and inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedRegion {
    pub first_row: usize,
    pub first_col: usize,
    pub last_row: usize,
    pub last_col: usize,
}

impl MergedRegion {
    pub fn new(first_row: usize, first_col: usize, last_row: usize, last_col: usize) -> Self {
        Self {
            first_row: first_row.min(last_row),
            first_col: first_col.min(last_col),
            last_row: last_row.max(first_row),
            last_col: last_col.max(first_col),
        }
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_col..=self.last_col).contains(&col)
    }

    pub fn anchor(&self) -> (usize, usize) {
        (self.first_row, self.first_col)
    }
}

/// Column interval `[start, end]` within one row, owned by the region anchored at `anchor`.
#[derive(Debug, Clone, Copy)]
struct Interval {
    start: usize,
    end: usize,
    anchor: (usize, usize),
}

/// Per-row interval index over merged regions.
///
/// Intervals of a row are sorted by start column, so resolving a cell is a
/// binary search within a single row.
#[derive(Debug, Default, Clone)]
pub struct MergeIndex {
    rows: BTreeMap<usize, Vec<Interval>>,
}

impl MergeIndex {
    pub fn new(regions: &[MergedRegion]) -> Self {
        let mut rows: BTreeMap<usize, Vec<Interval>> = BTreeMap::new();

        for region in regions {
            for row in region.first_row..=region.last_row {
                rows.entry(row).or_default().push(Interval {
                    start: region.first_col,
                    end: region.last_col,
                    anchor: region.anchor(),
                });
            }
        }

        for intervals in rows.values_mut() {
            intervals.sort_by_key(|i| i.start);
        }

        Self { rows }
    }

    /// Returns the anchor of the region covering `(row, col)`, if any.
    pub fn anchor(&self, row: usize, col: usize) -> Option<(usize, usize)> {
        let intervals = self.rows.get(&row)?;
        let idx = intervals.partition_point(|i| i.start <= col);
        if idx == 0 {
            return None;
        }
        let candidate = intervals[idx - 1];
        (col <= candidate.end).then_some(candidate.anchor)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One worksheet as read from the input workbook.
///
/// Rows 0 and 1 are the two header rows; rows from 2 on are data rows.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub name: String,
    cells: Vec<Vec<String>>,
    regions: Vec<MergedRegion>,
    index: MergeIndex,
}

impl RawTable {
    pub fn new(name: impl Into<String>, cells: Vec<Vec<String>>, regions: Vec<MergedRegion>) -> Self {
        let index = MergeIndex::new(&regions);
        Self {
            name: name.into(),
            cells,
            regions,
            index,
        }
    }

    /// Builds a table without merged regions from string literals. Handy in tests.
    pub fn from_rows(name: &str, rows: &[&[&str]]) -> Self {
        let cells = rows
            .iter()
            .map(|r| r.iter().map(|c| c.trim().to_string()).collect())
            .collect();
        Self::new(name, cells, Vec::new())
    }

    pub fn height(&self) -> usize {
        self.cells.len()
    }

    pub fn width(&self) -> usize {
        let widest_row = self.cells.iter().map(Vec::len).max().unwrap_or(0);
        let widest_region = self.regions.iter().map(|r| r.last_col + 1).max().unwrap_or(0);
        widest_row.max(widest_region)
    }

    pub fn regions(&self) -> &[MergedRegion] {
        &self.regions
    }

    /// Cell text without merge resolution; out-of-range cells are empty.
    pub fn raw(&self, row: usize, col: usize) -> &str {
        self.cells
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Merge-aware cell text.
    pub fn value(&self, row: usize, col: usize) -> &str {
        match self.index.anchor(row, col) {
            Some((r, c)) => self.raw(r, c),
            None => self.raw(row, col),
        }
    }

    /// Merge-aware values of a whole row, padded to the table width.
    pub fn row_values(&self, row: usize) -> Vec<&str> {
        (0..self.width()).map(|col| self.value(row, col)).collect()
    }

    /// Data rows (row 2 onward) that have at least one non-blank cell.
    pub fn data_rows(&self) -> Vec<Vec<String>> {
        (2..self.height())
            .map(|row| {
                self.row_values(row)
                    .into_iter()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|values| values.iter().any(|v| !v.trim().is_empty()))
            .collect()
    }
}
