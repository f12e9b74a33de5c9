//! Classifies the two header rows of a sheet into column descriptors.

use tracing::debug;

use crate::config::ReportConfig;
use crate::engine::types::{ColumnDescriptor, Quarter, QuarterLabel, ServiceKind};
use crate::table::RawTable;

/// Maps a free-text quarter header onto the canonical set.
///
/// Roman numerals written with latin `I` or cyrillic `І`, arabic digits and
/// the annual spellings are recognized. Anything else passes through as
/// [`QuarterLabel::Other`]; blank input yields `None`.
pub fn normalize_quarter(label: &str) -> Option<QuarterLabel> {
    let q = label.trim();
    if q.is_empty() {
        return None;
    }

    let canonical = match q {
        "I" | "І" => Some(Quarter::I),
        "II" | "ІІ" => Some(Quarter::II),
        "III" | "ІІІ" => Some(Quarter::III),
        "IV" | "ІV" => Some(Quarter::IV),
        "Ж" => Some(Quarter::Annual),
        _ => match q.to_lowercase().as_str() {
            "і" | "i" | "1" => Some(Quarter::I),
            "іі" | "ii" | "2" => Some(Quarter::II),
            "ііі" | "iii" | "3" => Some(Quarter::III),
            "іv" | "iv" | "4" => Some(Quarter::IV),
            "ж" | "5" | "год" | "годовая" => Some(Quarter::Annual),
            _ => None,
        },
    };

    Some(match canonical {
        Some(quarter) => QuarterLabel::Canonical(quarter),
        None => QuarterLabel::Other(q.to_string()),
    })
}

/// Evaluates the service rule table against one header cell.
/// Lowercased containment; first matching rule wins.
pub fn classify_service(text: &str, config: &ReportConfig) -> Option<ServiceKind> {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }

    config
        .service_rules()
        .into_iter()
        .find(|(keywords, _)| {
            keywords
                .iter()
                .any(|k| !k.is_empty() && text.contains(&k.to_lowercase()))
        })
        .map(|(_, kind)| kind)
}

/// Classifies the header rows of `table` (merge-aware).
pub fn classify_headers(table: &RawTable, config: &ReportConfig) -> Vec<ColumnDescriptor> {
    let width = table.width();
    let first: Vec<&str> = (0..width).map(|c| table.value(0, c)).collect();
    let second: Vec<&str> = (0..width).map(|c| table.value(1, c)).collect();
    classify_header_rows(&first, &second, config)
}

/// Walks the two header rows left to right.
///
/// Placeholder columns (both cells blank) produce no descriptor. A blank
/// first-row cell under a non-blank second-row cell continues the last
/// subject seen.
pub fn classify_header_rows(
    first: &[&str],
    second: &[&str],
    config: &ReportConfig,
) -> Vec<ColumnDescriptor> {
    let width = first.len().max(second.len());
    let mut descriptors = Vec::with_capacity(width);
    let mut current_subject: Option<String> = None;

    for col in 0..width {
        let top = first.get(col).map(|s| s.trim()).unwrap_or("");
        let bottom = second.get(col).map(|s| s.trim()).unwrap_or("");

        if top.is_empty() && bottom.is_empty() {
            debug!(col, "Placeholder column dropped");
            continue;
        }

        let service = classify_service(top, config).or_else(|| classify_service(bottom, config));
        if let Some(kind) = service {
            let label = if top.is_empty() { bottom } else { top };
            descriptors.push(ColumnDescriptor::service(col, kind, label));
            continue;
        }

        if !top.is_empty() {
            current_subject = Some(top.to_string());
            descriptors.push(ColumnDescriptor::subject(col, top, normalize_quarter(bottom)));
            continue;
        }

        match &current_subject {
            Some(subject) => {
                descriptors.push(ColumnDescriptor::subject(col, subject, normalize_quarter(bottom)));
            }
            None => descriptors.push(ColumnDescriptor::subject(col, bottom, None)),
        }
    }

    debug!(
        columns = width,
        descriptors = descriptors.len(),
        subjects = descriptors.iter().filter(|d| d.is_subject()).count(),
        "Headers classified"
    );
    descriptors
}
