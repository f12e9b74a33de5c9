//! Data types shared by the engine stages.

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Canonical grading period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Quarter {
    I,
    II,
    III,
    IV,
    /// Annual aggregate, labelled `Ж`.
    #[serde(rename = "Ж")]
    Annual,
}

impl Quarter {
    /// Fixed order in which report blocks are emitted.
    pub const ORDER: [Quarter; 5] = [
        Quarter::I,
        Quarter::II,
        Quarter::III,
        Quarter::IV,
        Quarter::Annual,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Quarter::I => "I",
            Quarter::II => "II",
            Quarter::III => "III",
            Quarter::IV => "IV",
            Quarter::Annual => "Ж",
        }
    }

    /// Human-readable block title.
    pub fn title(self) -> &'static str {
        match self {
            Quarter::I => "1 четверть",
            Quarter::II => "2 четверть",
            Quarter::III => "3 четверть",
            Quarter::IV => "4 четверть",
            Quarter::Annual => "Годовая",
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A normalized quarter header. Labels outside the lookup are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum QuarterLabel {
    Canonical(Quarter),
    Other(String),
}

impl QuarterLabel {
    pub fn canonical(&self) -> Option<Quarter> {
        match self {
            QuarterLabel::Canonical(q) => Some(*q),
            QuarterLabel::Other(_) => None,
        }
    }
}

impl fmt::Display for QuarterLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuarterLabel::Canonical(q) => write!(f, "{q}"),
            QuarterLabel::Other(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ServiceKind {
    Name,
    RowNumber,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnRole {
    Service(ServiceKind),
    Subject,
}

/// One classified input column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDescriptor {
    /// 0-based physical column index in the input sheet.
    pub ordinal: usize,
    pub role: ColumnRole,
    /// Subject name, or the header text of a service column.
    pub subject: Option<String>,
    pub quarter: Option<QuarterLabel>,
}

impl ColumnDescriptor {
    pub fn service(ordinal: usize, kind: ServiceKind, label: &str) -> Self {
        Self {
            ordinal,
            role: ColumnRole::Service(kind),
            subject: Some(label.to_string()),
            quarter: None,
        }
    }

    pub fn subject(ordinal: usize, name: &str, quarter: Option<QuarterLabel>) -> Self {
        Self {
            ordinal,
            role: ColumnRole::Subject,
            subject: Some(name.to_string()),
            quarter,
        }
    }

    pub fn is_subject(&self) -> bool {
        self.role == ColumnRole::Subject
    }

    pub fn service_kind(&self) -> Option<ServiceKind> {
        match self.role {
            ColumnRole::Service(kind) => Some(kind),
            ColumnRole::Subject => None,
        }
    }
}

/// A data row that survived filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentRecord {
    /// Fresh 1-based presentation ordinal.
    pub ordinal: usize,
    pub name: String,
    /// Merge-aware cell text of the source row, by physical column.
    pub cells: Vec<String>,
}

impl StudentRecord {
    pub fn cell(&self, col: usize) -> &str {
        self.cells.get(col).map(String::as_str).unwrap_or("")
    }
}

/// Grouping key of the duplicate column merger.
pub type SubjectKey = (String, Option<QuarterLabel>);

/// All physical columns of one `(subject, quarter)` pair reconciled into one.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedColumn {
    pub subject: String,
    pub quarter: Option<QuarterLabel>,
    /// Physical columns folded into this one, in descriptor order.
    pub sources: Vec<usize>,
    /// One token per student, index-aligned with the student list.
    pub tokens: Vec<String>,
}

impl MergedColumn {
    pub fn has_tokens(&self) -> bool {
        self.tokens.iter().any(|t| !t.trim().is_empty())
    }

    pub fn in_quarter(&self, quarter: Quarter) -> bool {
        self.quarter.as_ref().and_then(QuarterLabel::canonical) == Some(quarter)
    }
}

/// Merged columns keyed by `(subject, quarter)` in first-seen descriptor order.
pub type MergedColumns = IndexMap<SubjectKey, MergedColumn>;
