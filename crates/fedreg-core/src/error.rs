use thiserror::Error;

/// Core error types for fedreg domain operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid publication date: {0}")]
    InvalidDate(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Time formatting error: {0}")]
    TimeFormat(#[from] time::error::Format),

    #[error("Agency not found: {0}")]
    AgencyNotFound(String),
}

impl CoreError {
    /// Create a new InvalidDate error
    pub fn invalid_date(date: impl Into<String>) -> Self {
        Self::InvalidDate(date.into())
    }

    /// Create a new AgencyNotFound error
    pub fn agency_not_found(slug: impl Into<String>) -> Self {
        Self::AgencyNotFound(slug.into())
    }

    /// Check if this error is a client error (4xx category)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidDate(_) | Self::AgencyNotFound(_))
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidDate(_) => ErrorCategory::Validation,
            Self::AgencyNotFound(_) => ErrorCategory::NotFound,
            Self::JsonError(_) | Self::TimeFormat(_) => ErrorCategory::Serialization,
        }
    }
}

/// Error categories for logging and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Serialization,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::NotFound => write!(f, "not_found"),
            Self::Serialization => write!(f, "serialization"),
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
