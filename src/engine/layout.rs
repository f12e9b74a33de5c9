//! Logical layout of the per-quarter report blocks.
//!
//! A block is a list of typed rows; [`crate::output`] turns them into cells.
//! Block layout, top to bottom:
//!
//! | Row                         | Cells                                                   |
//! |-----------------------------|---------------------------------------------------------|
//! | title                       | quarter title spanning the block                        |
//! | header                      | blank, name header, subjects…, `5`, `4`, `3`            |
//! | one per student             | ordinal, name, tokens…, own 5/4/3 counts                |
//! | `5`, `4`, `3`               | label, blank, per-subject count…, 3 blanks              |
//! | `Качество`, `Успеваемость`  | label, blank, per-subject percent…, 3 blanks            |
//! | class quality / performance | label, class percent spanning the rest of the block     |

use crate::engine::aggregate::QuarterAggregate;
use crate::engine::types::Quarter;

/// Blank rows between consecutive blocks.
pub const BLOCK_GAP: usize = 2;

/// Grades that get count rows and count columns, in display order.
pub const REPORTED_GRADES: [u8; 3] = [5, 4, 3];

pub const QUALITY_LABEL: &str = "Качество";
pub const PERFORMANCE_LABEL: &str = "Успеваемость";
pub const CLASS_QUALITY_LABEL: &str = "Качество по классу";
pub const CLASS_PERFORMANCE_LABEL: &str = "Успеваемость по классу";

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Blank,
    Text(String),
    Number(usize),
    Percent(f64),
}

impl Cell {
    fn text(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Title,
    Header,
    Student,
    GradeCount(u8),
    Quality,
    Performance,
    ClassQuality,
    ClassPerformance,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutRow {
    pub kind: RowKind,
    pub cells: Vec<Cell>,
    /// When set, the cell at this column spans to the right edge of the block.
    pub span_from: Option<usize>,
}

impl LayoutRow {
    fn new(kind: RowKind, cells: Vec<Cell>) -> Self {
        Self {
            kind,
            cells,
            span_from: None,
        }
    }

    fn spanning(kind: RowKind, cells: Vec<Cell>, from: usize) -> Self {
        Self {
            kind,
            cells,
            span_from: Some(from),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuarterBlock {
    pub quarter: Quarter,
    /// Ordinal + name + subjects + three grade-count columns.
    pub width: usize,
    pub rows: Vec<LayoutRow>,
    pub aggregate: QuarterAggregate,
}

impl QuarterBlock {
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, kind: RowKind) -> Option<&LayoutRow> {
        self.rows.iter().find(|r| r.kind == kind)
    }
}

/// Lays out one quarter. `names` is index-aligned with the aggregate's students.
pub fn build_block(aggregate: QuarterAggregate, names: &[String], name_header: &str) -> QuarterBlock {
    let subjects = &aggregate.subjects;
    let width = 2 + subjects.len() + REPORTED_GRADES.len();
    let trailing_blanks = || std::iter::repeat_n(Cell::Blank, REPORTED_GRADES.len());

    let mut rows = Vec::with_capacity(names.len() + 9);

    rows.push(LayoutRow::spanning(
        RowKind::Title,
        vec![Cell::text(aggregate.quarter.title())],
        0,
    ));

    let mut header = vec![Cell::Blank, Cell::text(name_header)];
    header.extend(subjects.iter().map(|s| Cell::text(&s.subject)));
    header.extend(REPORTED_GRADES.iter().map(|g| Cell::Text(g.to_string())));
    rows.push(LayoutRow::new(RowKind::Header, header));

    for (idx, name) in names.iter().enumerate() {
        let mut cells = vec![Cell::Number(idx + 1), Cell::text(name)];
        cells.extend(subjects.iter().map(|s| {
            s.tokens
                .get(idx)
                .filter(|t| !t.trim().is_empty())
                .map(|t| Cell::text(t))
                .unwrap_or(Cell::Blank)
        }));
        let own = aggregate.students.get(idx).copied().unwrap_or_default();
        cells.extend(REPORTED_GRADES.iter().map(|&g| Cell::Number(own.count_of(g))));
        rows.push(LayoutRow::new(RowKind::Student, cells));
    }

    for grade in REPORTED_GRADES {
        let mut cells = vec![Cell::Text(grade.to_string()), Cell::Blank];
        cells.extend(subjects.iter().map(|s| Cell::Number(s.counts.count_of(grade))));
        cells.extend(trailing_blanks());
        rows.push(LayoutRow::new(RowKind::GradeCount(grade), cells));
    }

    for (kind, label) in [
        (RowKind::Quality, QUALITY_LABEL),
        (RowKind::Performance, PERFORMANCE_LABEL),
    ] {
        let mut cells = vec![Cell::text(label), Cell::Blank];
        cells.extend(subjects.iter().map(|s| {
            Cell::Percent(match kind {
                RowKind::Quality => s.counts.quality(),
                _ => s.counts.performance(),
            })
        }));
        cells.extend(trailing_blanks());
        rows.push(LayoutRow::new(kind, cells));
    }

    rows.push(LayoutRow::spanning(
        RowKind::ClassQuality,
        vec![
            Cell::text(CLASS_QUALITY_LABEL),
            Cell::Percent(aggregate.class.quality()),
        ],
        1,
    ));
    rows.push(LayoutRow::spanning(
        RowKind::ClassPerformance,
        vec![
            Cell::text(CLASS_PERFORMANCE_LABEL),
            Cell::Percent(aggregate.class.performance()),
        ],
        1,
    ));

    QuarterBlock {
        quarter: aggregate.quarter,
        width,
        rows,
        aggregate,
    }
}

/// Start row of each block when stacked with [`BLOCK_GAP`] blank rows between them.
pub fn block_offsets(blocks: &[QuarterBlock]) -> Vec<usize> {
    let mut next = 0;
    blocks
        .iter()
        .map(|b| {
            let start = next;
            next += b.height() + BLOCK_GAP;
            start
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::aggregate::SubjectColumn;
    use crate::stats::GradeCounts;

    fn aggregate() -> QuarterAggregate {
        let algebra = SubjectColumn {
            subject: "Алгебра".into(),
            tokens: vec!["5".into(), "4".into(), "3".into()],
            counts: GradeCounts::from_grades([5, 4, 3]),
        };
        let physics = SubjectColumn {
            subject: "Физика".into(),
            tokens: vec!["5, 4".into(), "".into(), "2".into()],
            counts: GradeCounts::from_grades([5, 4, 2]),
        };
        let mut class = algebra.counts;
        class.absorb(&physics.counts);
        QuarterAggregate {
            quarter: Quarter::II,
            subjects: vec![algebra, physics],
            students: vec![
                GradeCounts::from_grades([5, 5, 4]),
                GradeCounts::from_grades([4]),
                GradeCounts::from_grades([3, 2]),
            ],
            class,
        }
    }

    fn names() -> Vec<String> {
        vec!["Асан".into(), "Әлия".into(), "Болат".into()]
    }

    #[test]
    fn test_block_shape() {
        let block = build_block(aggregate(), &names(), "Аты-жөні");

        assert_eq!(block.width, 7);
        // title + header + 3 students + 3 count rows + 2 percent rows + 2 class rows
        assert_eq!(block.height(), 12);
        assert_eq!(block.rows[0].cells, vec![Cell::text("2 четверть")]);
        assert_eq!(block.rows[0].span_from, Some(0));
        for row in &block.rows[1..block.height() - 2] {
            assert_eq!(row.cells.len(), block.width, "{:?}", row.kind);
        }
    }

    #[test]
    fn test_header_and_student_rows() {
        let block = build_block(aggregate(), &names(), "Аты-жөні");

        let header = block.row(RowKind::Header).unwrap();
        assert_eq!(header.cells[0], Cell::Blank);
        assert_eq!(header.cells[2], Cell::text("Алгебра"));
        assert_eq!(header.cells[4], Cell::text("5"));

        let first = &block.rows[2];
        assert_eq!(first.cells[0], Cell::Number(1));
        assert_eq!(first.cells[3], Cell::text("5, 4"));
        assert_eq!(&first.cells[4..], &[Cell::Number(2), Cell::Number(1), Cell::Number(0)]);

        let second = &block.rows[3];
        assert_eq!(second.cells[3], Cell::Blank);
    }

    #[test]
    fn test_statistics_rows() {
        let block = build_block(aggregate(), &names(), "Аты-жөні");

        let fives = block.row(RowKind::GradeCount(5)).unwrap();
        assert_eq!(fives.cells[0], Cell::text("5"));
        assert_eq!(fives.cells[2], Cell::Number(1));
        assert_eq!(fives.cells[6], Cell::Blank);

        let quality = block.row(RowKind::Quality).unwrap();
        assert_eq!(quality.cells[2], Cell::Percent(66.67));
        let performance = block.row(RowKind::Performance).unwrap();
        assert_eq!(performance.cells[3], Cell::Percent(66.67));

        let class = block.row(RowKind::ClassQuality).unwrap();
        assert_eq!(class.cells[1], Cell::Percent(66.67));
        assert_eq!(class.span_from, Some(1));
        let class = block.row(RowKind::ClassPerformance).unwrap();
        assert_eq!(class.cells[1], Cell::Percent(83.33));
    }

    #[test]
    fn test_block_offsets_leave_gap() {
        let a = build_block(aggregate(), &names(), "Аты-жөні");
        let b = a.clone();
        assert_eq!(block_offsets(&[a, b]), vec![0, 14]);
    }
}
