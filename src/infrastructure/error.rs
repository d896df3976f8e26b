//! Infrastructure-level errors (store and I/O concerns)

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::CodeId;

/// Errors raised by the code store and the file system beneath it.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse code store {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("cannot serialize code store: {message}")]
    Serialize { message: String },

    #[error("no stored row for code #{0}")]
    Missing(CodeId),

    #[error("unique constraint violated for code: {0}")]
    UniqueViolation(String),
}

impl InfraError {
    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Result type for infrastructure layer operations.
pub type InfraResult<T> = Result<T, InfraError>;
