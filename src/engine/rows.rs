//! Restricts a sheet's data rows to the real student list.
//!
//! Two policies run in order: rows without a student name are dropped, then
//! everything from the first break in the `1, 2, 3, …` row numbering on is
//! cut off. Exports append footer rows after the class list, and a broken
//! sequence is how they are told apart.

use tracing::{debug, warn};

use crate::engine::types::{ColumnDescriptor, ColumnRole, ServiceKind, StudentRecord};

/// Column holding student names: the first name-like service column, or
/// the second physical column when the headers have none.
pub fn select_name_column(descriptors: &[ColumnDescriptor]) -> usize {
    descriptors
        .iter()
        .find(|d| d.role == ColumnRole::Service(ServiceKind::Name))
        .map(|d| d.ordinal)
        .unwrap_or(1)
}

/// Column holding row numbers, if any.
///
/// A row-number service column wins. Otherwise the first column that is
/// neither a service column nor a quartered subject column and whose first
/// non-blank value is numeric. Unlabelled leading columns are dropped from
/// the descriptor list but still exist in the rows, so they are candidates.
pub fn select_row_number_column(
    descriptors: &[ColumnDescriptor],
    name_col: usize,
    rows: &[Vec<String>],
) -> Option<usize> {
    if let Some(d) = descriptors
        .iter()
        .find(|d| d.role == ColumnRole::Service(ServiceKind::RowNumber))
    {
        return Some(d.ordinal);
    }

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    (0..width).find(|&col| {
        if col == name_col {
            return false;
        }
        let described = descriptors.iter().find(|d| d.ordinal == col);
        let excluded = match described {
            Some(d) if d.is_subject() => d.quarter.is_some(),
            Some(_) => true,
            None => false,
        };
        if excluded {
            return false;
        }
        rows.iter()
            .filter_map(|r| r.get(col))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
            .is_some_and(|v| parse_row_number(v).is_some())
    })
}

/// Parses a row-number cell; `"3"` and `"3.0"` both read as 3.
pub fn parse_row_number(value: &str) -> Option<i64> {
    let n: f64 = value.trim().parse().ok()?;
    (n.is_finite() && n.fract() == 0.0).then_some(n as i64)
}

/// Index of the first value that does not continue `1, 2, 3, …`, or `None`
/// when the whole sequence is intact.
pub fn sequence_break<S: AsRef<str>>(values: &[S]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .find(|(i, v)| parse_row_number(v.as_ref()) != Some(*i as i64 + 1))
        .map(|(i, _)| i)
}

/// Applies both row policies and assigns fresh 1-based ordinals.
pub fn validate_rows(rows: Vec<Vec<String>>, descriptors: &[ColumnDescriptor]) -> Vec<StudentRecord> {
    let name_col = select_name_column(descriptors);
    let before = rows.len();

    let named: Vec<Vec<String>> = rows
        .into_iter()
        .filter(|r| r.get(name_col).is_some_and(|n| !n.trim().is_empty()))
        .collect();
    if named.len() != before {
        debug!(
            dropped = before - named.len(),
            kept = named.len(),
            "Rows without a name dropped"
        );
    }

    let mut kept = named;
    if let Some(number_col) = select_row_number_column(descriptors, name_col, &kept) {
        let numbers: Vec<&str> = kept
            .iter()
            .map(|r| r.get(number_col).map(String::as_str).unwrap_or(""))
            .collect();
        if let Some(cut) = sequence_break(&numbers) {
            warn!(
                column = number_col,
                before = kept.len(),
                after = cut,
                "Row numbering broke, trailing rows discarded"
            );
            kept.truncate(cut);
        }
    }

    kept.into_iter()
        .enumerate()
        .map(|(i, cells)| StudentRecord {
            ordinal: i + 1,
            name: cells.get(name_col).map(|n| n.trim().to_string()).unwrap_or_default(),
            cells,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::{Quarter, QuarterLabel};

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn descriptors() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::service(1, ServiceKind::Name, "Аты-жөні"),
            ColumnDescriptor::subject(2, "Математика", Some(QuarterLabel::Canonical(Quarter::I))),
        ]
    }

    #[test]
    fn test_sequence_break_position() {
        assert_eq!(sequence_break(&["1", "2", "3", "5", "6"]), Some(3));
        assert_eq!(sequence_break(&["1", "2", "3"]), None);
        assert_eq!(sequence_break(&["2"]), Some(0));
        assert_eq!(sequence_break(&["1", "", "3"]), Some(1));
        assert_eq!(sequence_break(&["1", "Барлығы"]), Some(1));
        assert_eq!(sequence_break(&["1.0", "2"]), None);
    }

    #[test]
    fn test_name_column_fallback() {
        let d = vec![ColumnDescriptor::subject(2, "Математика", None)];
        assert_eq!(select_name_column(&d), 1);
        assert_eq!(select_name_column(&descriptors()), 1);
    }

    #[test]
    fn test_unlabelled_number_column_found() {
        let rows = vec![row(&["1", "Асан", "5"]), row(&["2", "Әлия", "4"])];
        assert_eq!(select_row_number_column(&descriptors(), 1, &rows), Some(0));
    }

    #[test]
    fn test_parallel_column_is_not_row_numbers() {
        let d = vec![
            ColumnDescriptor::service(0, ServiceKind::Other, "Параллель"),
            ColumnDescriptor::service(1, ServiceKind::Name, "Аты-жөні"),
            ColumnDescriptor::subject(2, "Математика", Some(QuarterLabel::Canonical(Quarter::I))),
        ];
        let rows = vec![row(&["5", "Асан", "5"]), row(&["5", "Әлия", "4"])];

        assert_eq!(select_row_number_column(&d, 1, &rows), None);
        let students = validate_rows(rows, &d);
        assert_eq!(students.len(), 2);
        assert_eq!(students[1].name, "Әлия");
    }

    #[test]
    fn test_truncates_at_sequence_break() {
        let rows = vec![
            row(&["1", "Асан", "5"]),
            row(&["2", "Әлия", "4"]),
            row(&["3", "Болат", "3"]),
            row(&["5", "Дана", "5"]),
            row(&["6", "Ерлан", "4"]),
        ];

        let students = validate_rows(rows, &descriptors());
        assert_eq!(students.len(), 3);
        assert_eq!(students[2].name, "Болат");
    }

    #[test]
    fn test_unnamed_rows_dropped_before_sequence_check() {
        let rows = vec![
            row(&["1", "Асан", "5"]),
            row(&["", "  ", "4"]),
            row(&["2", "Әлия", "3"]),
        ];

        let students = validate_rows(rows, &descriptors());
        assert_eq!(students.len(), 2);
        assert_eq!(students[1].ordinal, 2);
        assert_eq!(students[1].name, "Әлия");
    }

    #[test]
    fn test_fresh_ordinals_without_number_column() {
        let d = vec![
            ColumnDescriptor::service(0, ServiceKind::Name, "ФИО"),
            ColumnDescriptor::subject(1, "Физика", Some(QuarterLabel::Canonical(Quarter::I))),
        ];
        let rows = vec![row(&["Асан", "5"]), row(&["Әлия", "4"])];

        let students = validate_rows(rows, &d);
        assert_eq!(students.iter().map(|s| s.ordinal).collect::<Vec<_>>(), vec![1, 2]);
    }
}
