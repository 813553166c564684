//! Path parsing and name validation for the namespace.

use crate::{CabinetError, Result};

use super::MAX_NAME_LENGTH;

/// Validate a folder or file name.
///
/// Names must be non-empty after trimming, at most [`MAX_NAME_LENGTH`]
/// characters, and free of path separators and control characters.
pub(crate) fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(CabinetError::InvalidPath("name is empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(CabinetError::InvalidPath(format!(
            "name exceeds {MAX_NAME_LENGTH} characters"
        )));
    }
    if name
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_control())
    {
        return Err(CabinetError::InvalidPath(format!(
            "name contains illegal characters: {name:?}"
        )));
    }
    Ok(())
}

/// Split an absolute path into validated segments.
///
/// The empty path and "/" resolve to no segments (the root). One leading
/// and one trailing separator are ignored; interior empty segments
/// (consecutive separators) are rejected.
pub(crate) fn split_path(path: &str) -> Result<Vec<&str>> {
    let trimmed = path.trim();
    if trimmed.is_empty() || trimmed == "/" {
        return Ok(Vec::new());
    }

    let body = trimmed.strip_prefix('/').unwrap_or(trimmed);
    let body = body.strip_suffix('/').unwrap_or(body);

    let mut segments = Vec::new();
    for segment in body.split('/') {
        if segment.trim().is_empty() {
            return Err(CabinetError::InvalidPath(format!(
                "empty segment in {path:?}"
            )));
        }
        validate_name(segment)?;
        segments.push(segment);
    }
    Ok(segments)
}

/// Compare two names under the configured case policy.
pub(crate) fn names_equal(a: &str, b: &str, case_insensitive: bool) -> bool {
    if case_insensitive {
        a.to_lowercase() == b.to_lowercase()
    } else {
        a == b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_root_forms() {
        assert!(split_path("").unwrap().is_empty());
        assert!(split_path("/").unwrap().is_empty());
        assert!(split_path("  /  ").unwrap().is_empty());
    }

    #[test]
    fn test_split_simple_path() {
        assert_eq!(split_path("/docs/2024/report").unwrap(), ["docs", "2024", "report"]);
    }

    #[test]
    fn test_split_without_leading_separator() {
        assert_eq!(split_path("docs/2024").unwrap(), ["docs", "2024"]);
    }

    #[test]
    fn test_split_ignores_trailing_separator() {
        assert_eq!(split_path("/docs/2024/").unwrap(), ["docs", "2024"]);
    }

    #[test]
    fn test_split_rejects_consecutive_separators() {
        assert!(matches!(
            split_path("/docs//2024"),
            Err(CabinetError::InvalidPath(_))
        ));
        assert!(matches!(split_path("//"), Err(CabinetError::InvalidPath(_))));
    }

    #[test]
    fn test_split_rejects_whitespace_segment() {
        assert!(matches!(
            split_path("/docs/  /2024"),
            Err(CabinetError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_validate_name_ok() {
        assert!(validate_name("report.txt").is_ok());
        assert!(validate_name("日本語フォルダ").is_ok());
        assert!(validate_name("with spaces").is_ok());
    }

    #[test]
    fn test_validate_name_empty() {
        assert!(matches!(
            validate_name(""),
            Err(CabinetError::InvalidPath(_))
        ));
        assert!(matches!(
            validate_name("   "),
            Err(CabinetError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_validate_name_too_long() {
        let long = "a".repeat(MAX_NAME_LENGTH + 1);
        assert!(matches!(
            validate_name(&long),
            Err(CabinetError::InvalidPath(_))
        ));

        let just_fits = "a".repeat(MAX_NAME_LENGTH);
        assert!(validate_name(&just_fits).is_ok());
    }

    #[test]
    fn test_validate_name_illegal_characters() {
        assert!(matches!(
            validate_name("a/b"),
            Err(CabinetError::InvalidPath(_))
        ));
        assert!(matches!(
            validate_name("a\\b"),
            Err(CabinetError::InvalidPath(_))
        ));
        assert!(matches!(
            validate_name("a\nb"),
            Err(CabinetError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_names_equal_case_sensitive() {
        assert!(names_equal("Pics", "Pics", false));
        assert!(!names_equal("Pics", "pics", false));
    }

    #[test]
    fn test_names_equal_case_insensitive() {
        assert!(names_equal("Pics", "pics", true));
        assert!(names_equal("PICS", "pics", true));
        assert!(!names_equal("pics", "docs", true));
    }
}
