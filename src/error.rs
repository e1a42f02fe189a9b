//! Error types shared by every Burrow component.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BurrowError>;

/// The error type for indexing, persistence and query resolution.
#[derive(Debug, Error)]
pub enum BurrowError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    /// Setup mistakes: duplicate categories, missing sources, bad strategies.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The category has never been indexed or loaded.
    #[error("category {category} is not ready")]
    NotReady { category: String },

    #[error("indexing failed: {0}")]
    Index(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl BurrowError {
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        BurrowError::InvalidConfig(msg.into())
    }

    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        BurrowError::InvalidArgument(msg.into())
    }

    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        BurrowError::NotFound(msg.into())
    }

    pub fn not_ready<S: Into<String>>(category: S) -> Self {
        BurrowError::NotReady {
            category: category.into(),
        }
    }

    pub fn index<S: Into<String>>(msg: S) -> Self {
        BurrowError::Index(msg.into())
    }

    pub fn backend<S: Into<String>>(msg: S) -> Self {
        BurrowError::Backend(msg.into())
    }

    pub fn internal<S: Into<String>>(msg: S) -> Self {
        BurrowError::Internal(msg.into())
    }

    /// Whether this error means "retry later" rather than "no matches".
    pub fn is_not_ready(&self) -> bool {
        matches!(self, BurrowError::NotReady { .. })
    }
}
