//! Reconciles physical columns that carry the same `(subject, quarter)` pair.
//!
//! A subject taught in subgroups shows up as several columns with identical
//! headers; each student has a grade in only one of them.

use tracing::debug;

use crate::engine::types::{ColumnDescriptor, MergedColumn, MergedColumns, StudentRecord};

/// Result of merging: one logical column per key plus the name column values.
#[derive(Debug, Clone, Default)]
pub struct MergeOutput {
    pub columns: MergedColumns,
    /// Student names, index-aligned with every column's tokens.
    pub names: Vec<String>,
}

/// Joins the distinct non-blank values of one row, first-seen order, `", "`-separated.
pub fn merge_values<'a, I>(values: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut unique: Vec<&str> = Vec::new();
    for v in values.into_iter().map(str::trim) {
        if !v.is_empty() && !unique.contains(&v) {
            unique.push(v);
        }
    }
    unique.join(", ")
}

/// Groups subject descriptors by key and builds the merged token lists.
/// Service descriptors are skipped; single-column groups pass through as is.
pub fn merge_columns(students: &[StudentRecord], descriptors: &[ColumnDescriptor]) -> MergeOutput {
    let mut columns = MergedColumns::new();

    for d in descriptors.iter().filter(|d| d.is_subject()) {
        let Some(subject) = d.subject.clone() else {
            continue;
        };
        columns
            .entry((subject.clone(), d.quarter.clone()))
            .or_insert_with(|| MergedColumn {
                subject,
                quarter: d.quarter.clone(),
                sources: Vec::new(),
                tokens: Vec::new(),
            })
            .sources
            .push(d.ordinal);
    }

    for column in columns.values_mut() {
        column.tokens = match column.sources.as_slice() {
            [only] => students.iter().map(|s| s.cell(*only).to_string()).collect(),
            sources => {
                debug!(
                    subject = %column.subject,
                    quarter = ?column.quarter,
                    sources = ?sources,
                    "Merging duplicate columns"
                );
                students
                    .iter()
                    .map(|s| merge_values(sources.iter().map(|&c| s.cell(c))))
                    .collect()
            }
        };
    }

    MergeOutput {
        columns,
        names: students.iter().map(|s| s.name.clone()).collect(),
    }
}
