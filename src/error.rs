//! Error types for CABINET.

use thiserror::Error;

/// Common error type for CABINET.
///
/// The validation variants (`NotFound`, `DuplicateName`, `InvalidPath`,
/// `CycleDetected`, `Forbidden`) are always raised before any store write,
/// so they never leave partial state behind.
#[derive(Error, Debug)]
pub enum CabinetError {
    /// Referenced folder, file, or owner scope does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// A sibling with the same name already exists in the target folder.
    #[error("duplicate name: {0}")]
    DuplicateName(String),

    /// Malformed path or name segment.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// The move would make a folder its own ancestor.
    #[error("move would create a cycle")]
    CycleDetected,

    /// Illegal operation on the root folder.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Underlying persistence failed. Propagated as-is; the caller decides
    /// whether to retry.
    #[error("store error: {0}")]
    Store(String),

    /// A persisted record could not be decoded into its typed shape.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// Blob gateway failure.
    #[error("blob gateway error: {0}")]
    Blob(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for CABINET operations.
pub type Result<T> = std::result::Result<T, CabinetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = CabinetError::NotFound("folder".to_string());
        assert_eq!(err.to_string(), "folder not found");
    }

    #[test]
    fn test_duplicate_name_display() {
        let err = CabinetError::DuplicateName("pics".to_string());
        assert_eq!(err.to_string(), "duplicate name: pics");
    }

    #[test]
    fn test_invalid_path_display() {
        let err = CabinetError::InvalidPath("empty segment".to_string());
        assert_eq!(err.to_string(), "invalid path: empty segment");
    }

    #[test]
    fn test_cycle_detected_display() {
        let err = CabinetError::CycleDetected;
        assert_eq!(err.to_string(), "move would create a cycle");
    }

    #[test]
    fn test_forbidden_display() {
        let err = CabinetError::Forbidden("root folder cannot be deleted".to_string());
        assert_eq!(err.to_string(), "forbidden: root folder cannot be deleted");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CabinetError = io_err.into();
        assert!(matches!(err, CabinetError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_result_alias() {
        fn sample_ok() -> Result<i32> {
            Ok(42)
        }

        fn sample_err() -> Result<i32> {
            Err(CabinetError::CycleDetected)
        }

        assert_eq!(sample_ok().unwrap(), 42);
        assert!(sample_err().is_err());
    }
}
