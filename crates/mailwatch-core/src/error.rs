//! Error types for the core library.

use std::path::PathBuf;

use thiserror::Error;

use crate::monitor::ValidationError;
use crate::provider::ProviderError;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Alert presence was queried before a successful refresh in this cycle.
    #[error("Messages have not been refreshed in this cycle; refresh before querying alerts")]
    NotRefreshed,

    /// The mail provider could not be reached or failed to list messages.
    #[error("Mail provider unavailable: {0}")]
    ProviderUnavailable(#[from] ProviderError),

    /// The provider cannot evaluate the pushdown filter.
    #[error("Filter unsupported: {0}")]
    FilterUnsupported(String),

    /// The provider failed while evaluating the pushdown filter.
    #[error("Filter execution failed: {0}")]
    FilterExecutionFailed(String),

    /// The snooze state could not be written.
    #[error("Failed to persist snooze state to {}: {source}", path.display())]
    PersistenceWriteFailed {
        /// Target file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// An attachment that passed validation is gone when the alert is composed.
    #[error("Attachment {} is no longer available", .0.display())]
    AttachmentUnavailable(PathBuf),

    /// Configuration rejected at construction time.
    #[error("Invalid configuration: {}", join_errors(.0))]
    InvalidConfiguration(Vec<ValidationError>),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a configuration error with a single cause.
    #[must_use]
    pub fn invalid(error: ValidationError) -> Self {
        Self::InvalidConfiguration(vec![error])
    }

    /// Whether the monitor loop should log this error and try again next cycle.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidConfiguration(_))
    }
}

impl From<Vec<ValidationError>> for Error {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::InvalidConfiguration(errors)
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
