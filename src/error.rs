use thiserror::Error;

use crate::export::ClipboardError;

/// Data store failures, classified at the repository boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    #[error("Record already exists")]
    Conflict,

    #[error("Data store error: {0}")]
    Other(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
            rusqlite::Error::SqliteFailure(ref failure, _)
                if failure.code == rusqlite::ErrorCode::ConstraintViolation
                    && (failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                        || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY) =>
            {
                StoreError::Conflict
            }
            other => StoreError::Other(other.to_string()),
        }
    }
}

impl From<tokio_rusqlite::Error> for StoreError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        match err {
            tokio_rusqlite::Error::Rusqlite(e) => StoreError::from(e),
            other => StoreError::Other(other.to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    ImageProvider(String),

    #[error("Blob storage error: {0}")]
    Blob(String),

    #[error(transparent)]
    Clipboard(#[from] ClipboardError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid base64 image payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<tokio_rusqlite::Error> for AppError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        AppError::Store(err.into())
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Store(err.into())
    }
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    /// The one message shown to the operator when an action fails.
    ///
    /// Store internals are logged, never shown.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Store(StoreError::Other(_)) | AppError::Io(_) | AppError::Json(_) => {
                "Data store request failed. Please try again.".to_string()
            }
            AppError::Http(_) => "Network request failed. Please try again.".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_violation() -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: rusqlite::ErrorCode::ConstraintViolation,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
            },
            Some("UNIQUE constraint failed".to_string()),
        )
    }

    #[test]
    fn test_unique_violation_maps_to_conflict() {
        assert!(matches!(StoreError::from(unique_violation()), StoreError::Conflict));
    }

    #[test]
    fn test_no_rows_maps_to_not_found() {
        assert!(matches!(
            StoreError::from(rusqlite::Error::QueryReturnedNoRows),
            StoreError::NotFound
        ));
    }

    #[test]
    fn test_other_sqlite_errors_map_to_other() {
        let err = rusqlite::Error::InvalidColumnName("nope".to_string());
        assert!(matches!(StoreError::from(err), StoreError::Other(_)));
    }

    #[test]
    fn test_store_details_hidden_from_user_message() {
        let err = AppError::Store(StoreError::Other("disk I/O error at page 7".to_string()));
        let message = err.user_message();
        assert!(!message.contains("page 7"));
        assert!(message.contains("Data store request failed"));
    }

    #[test]
    fn test_provider_message_preserved() {
        let err = AppError::ImageProvider("Grok image generation failed: quota".to_string());
        assert_eq!(err.user_message(), "Grok image generation failed: quota");
    }
}
