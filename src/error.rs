use rusqlite::Error as RusqliteError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::utils::Utils;

#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("Database file not found at {}", Utils::join_paths(.candidates))]
    NotFound { candidates: Vec<PathBuf> },

    #[error("Database error occurred: no such table: {0}")]
    TableNotFound(String),

    #[error("Database error occurred: {0}")]
    DatabaseError(#[from] RusqliteError), // Converts rusqlite::Error automatically

    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("Logger error: {0}")]
    LoggerError(#[from] flexi_logger::FlexiLoggerError),

    #[error("{0}")]
    Error(String),
}

/// How a failure is reported to the operator. Every category is terminal for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NotFound,
    Database,
    Unexpected,
}

impl MigrateError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MigrateError::NotFound { .. } => ErrorCategory::NotFound,
            MigrateError::TableNotFound(_) | MigrateError::DatabaseError(_) => {
                ErrorCategory::Database
            }
            MigrateError::IoError(_) | MigrateError::LoggerError(_) | MigrateError::Error(_) => {
                ErrorCategory::Unexpected
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_lists_every_candidate() {
        let err = MigrateError::NotFound {
            candidates: vec![PathBuf::from("a/edutrade.db"), PathBuf::from("a/instance/database.db")],
        };
        assert_eq!(err.category(), ErrorCategory::NotFound);

        let msg = err.to_string();
        assert!(msg.contains("a/edutrade.db"));
        assert!(msg.contains("database.db"));
    }

    #[test]
    fn test_database_category() {
        let err = MigrateError::from(RusqliteError::InvalidQuery);
        assert_eq!(err.category(), ErrorCategory::Database);
        assert!(err.to_string().starts_with("Database error occurred:"));

        let err = MigrateError::TableNotFound("user".to_string());
        assert_eq!(err.category(), ErrorCategory::Database);
        assert_eq!(err.to_string(), "Database error occurred: no such table: user");
    }

    #[test]
    fn test_unexpected_category() {
        let err = MigrateError::from(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
        assert_eq!(err.category(), ErrorCategory::Unexpected);

        let err = MigrateError::Error("boom".to_string());
        assert_eq!(err.category(), ErrorCategory::Unexpected);
        assert_eq!(err.to_string(), "boom");
    }
}
