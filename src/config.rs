//! Label rule tables and naming limits.
//!
//! Stored as a JSON object on disk; every field is optional and falls back
//! to the defaults used by the gradebook export:
//! ```json
//! {
//!   "name_keywords": ["аты-жөні", "фио"],
//!   "sheet_name_max_len": 31
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::engine::types::ServiceKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Header keywords marking the student-name column.
    pub name_keywords: Vec<String>,
    /// Header keywords marking the row-number column.
    pub row_number_keywords: Vec<String>,
    /// Other structural header keywords (never subjects).
    pub service_keywords: Vec<String>,
    /// Header written above the name column when the input has none.
    pub name_header: String,
    pub sheet_name_max_len: usize,
    pub default_output_file: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            name_keywords: vec![
                "аты-жөні".into(),
                "фио".into(),
                "fio".into(),
                "аты жөні".into(),
            ],
            row_number_keywords: vec!["номер_строки".into(), "№".into()],
            service_keywords: vec!["параллель".into()],
            name_header: "Аты-жөні".into(),
            sheet_name_max_len: 31,
            default_output_file: "processed_final.xlsx".into(),
        }
    }
}

impl ReportConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: ReportConfig = serde_json::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Loads from `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    /// The ordered `(keywords, kind)` table the header classifier evaluates.
    /// First match wins.
    pub fn service_rules(&self) -> Vec<(&[String], ServiceKind)> {
        vec![
            (self.name_keywords.as_slice(), ServiceKind::Name),
            (self.row_number_keywords.as_slice(), ServiceKind::RowNumber),
            (self.service_keywords.as_slice(), ServiceKind::Other),
        ]
    }
}
