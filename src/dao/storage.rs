use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A stored value could not be interpreted as the expected type.
    #[error("corrupt value under `{key}`: {value:?}")]
    Corrupt { key: String, value: String },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a corruption error for a value found under `key`.
    pub fn corrupt(key: impl Into<String>, value: impl Into<String>) -> Self {
        StorageError::Corrupt {
            key: key.into(),
            value: value.into(),
        }
    }
}
