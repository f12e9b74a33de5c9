use crate::engine::grade::parse_grades;
use crate::engine::merge::MergeOutput;
use crate::engine::types::Quarter;
use crate::stats::GradeCounts;

/// One subject column of a quarter block.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectColumn {
    pub subject: String,
    /// Raw merged tokens, one per student.
    pub tokens: Vec<String>,
    pub counts: GradeCounts,
}

/// Everything a quarter block needs.
#[derive(Debug, Clone, PartialEq)]
pub struct QuarterAggregate {
    pub quarter: Quarter,
    pub subjects: Vec<SubjectColumn>,
    /// Per-student counts across this quarter's subjects, index-aligned with students.
    pub students: Vec<GradeCounts>,
    /// Union of every subject's grades.
    pub class: GradeCounts,
}

/// Aggregates one quarter.
///
/// Subjects with at least one non-blank token in `quarter` become columns,
/// in merge (descriptor) order. Returns `None` when no grade in the quarter
/// parses, so the quarter gets no block.
pub fn aggregate_quarter(quarter: Quarter, merged: &MergeOutput) -> Option<QuarterAggregate> {
    let student_count = merged.names.len();
    let mut students = vec![GradeCounts::default(); student_count];
    let mut class = GradeCounts::default();
    let mut subjects = Vec::new();

    for column in merged
        .columns
        .values()
        .filter(|c| c.in_quarter(quarter) && c.has_tokens())
    {
        let mut counts = GradeCounts::default();

        for (idx, token) in column.tokens.iter().enumerate() {
            for g in parse_grades(token) {
                counts.add(g);
                if let Some(student) = students.get_mut(idx) {
                    student.add(g);
                }
            }
        }

        class.absorb(&counts);
        subjects.push(SubjectColumn {
            subject: column.subject.clone(),
            tokens: column.tokens.clone(),
            counts,
        });
    }

    if class.is_empty() {
        return None;
    }

    Some(QuarterAggregate {
        quarter,
        subjects,
        students,
        class,
    })
}
