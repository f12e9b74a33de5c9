/// Parses a raw (possibly merged, comma-joined) cell token into grades.
///
/// Each comma-separated part has its non-digit characters stripped; what is
/// left must parse as an integer in `1..=5`. Anything else (remarks such as
/// `н/б`, out-of-domain numbers, empty parts) is dropped silently.
///
/// | Token     | Grades   |
/// |-----------|----------|
/// | `"5, 4"`  | `[5, 4]` |
/// | `"н/б"`   | `[]`     |
/// | `"6"`     | `[]`     |
/// | `"5+"`    | `[5]`    |
pub fn parse_grades(token: &str) -> Vec<u8> {
    token.split(',').filter_map(parse_grade).collect()
}

/// Parses one part of a token.
pub fn parse_grade(part: &str) -> Option<u8> {
    let digits: String = part.trim().chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    match digits.parse::<u32>() {
        Ok(g @ 1..=5) => Some(g as u8),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merged_token() {
        assert_eq!(parse_grades("5, 4"), vec![5, 4]);
        assert_eq!(parse_grades("3,3"), vec![3, 3]);
    }

    #[test]
    fn test_non_grade_tokens() {
        assert_eq!(parse_grades("н/б"), Vec::<u8>::new());
        assert_eq!(parse_grades(""), Vec::<u8>::new());
        assert_eq!(parse_grades("  ,  "), Vec::<u8>::new());
    }

    #[test]
    fn test_domain_boundaries() {
        assert_eq!(parse_grades("6"), Vec::<u8>::new());
        assert_eq!(parse_grades("0"), Vec::<u8>::new());
        assert_eq!(parse_grades("1"), vec![1]);
        assert_eq!(parse_grades("5"), vec![5]);
        assert_eq!(parse_grades("10"), Vec::<u8>::new());
    }

    #[test]
    fn test_annotations_are_stripped() {
        assert_eq!(parse_grades("5+"), vec![5]);
        assert_eq!(parse_grades("4, н/б, 3"), vec![4, 3]);
        assert_eq!(parse_grades("99999999999999999999"), Vec::<u8>::new());
    }
}
