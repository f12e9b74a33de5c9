use std::collections::HashSet;

/// Replaces characters Excel rejects in sheet names and truncates to `max_len` chars.
pub fn sanitize_sheet_name(name: &str, max_len: usize) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '?' | '*' | '[' | ']' | ':' => '_',
            c => c,
        })
        .take(max_len)
        .collect();
    if cleaned.trim().is_empty() {
        "Sheet".to_string()
    } else {
        cleaned
    }
}

/// Makes `name` unique among `taken` by appending ` (n)`, staying within `max_len` chars.
pub fn unique_sheet_name(name: &str, taken: &HashSet<String>, max_len: usize) -> String {
    if !taken.contains(name) {
        return name.to_string();
    }
    (2..)
        .map(|n| {
            let suffix = format!(" ({n})");
            let keep = max_len.saturating_sub(suffix.chars().count());
            let base: String = name.chars().take(keep).collect();
            format!("{base}{suffix}")
        })
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| name.to_string())
}

/// Spreadsheet column letters for a 0-based column index (`0` → `A`, `27` → `AB`).
pub fn column_letter(col: usize) -> String {
    let mut n = col + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Output file name derived from a class name, with path-hostile characters replaced.
pub fn class_file_name(class_name: &str) -> String {
    let safe: String = class_name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c => c,
        })
        .collect();
    format!("{}.xlsx", safe.trim())
}
