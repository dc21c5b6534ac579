//! Error types for calendar codec and entity operations.

use thiserror::Error;

/// Result type for calendar operations.
pub type CalendarResult<T> = Result<T, CalendarError>;

/// Errors that can occur while parsing or building calendar entities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    /// A timestamp token could not be parsed.
    #[error("malformed timestamp '{token}': {reason}")]
    MalformedTimestamp { token: String, reason: String },

    /// The document violates the calendar structure at the given 1-based line.
    #[error("malformed document at line {line}: {detail}")]
    MalformedDocument { line: usize, detail: String },

    /// A field value breaks an entity invariant.
    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl CalendarError {
    /// Creates a malformed timestamp error.
    pub fn timestamp(token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedTimestamp {
            token: token.into(),
            reason: reason.into(),
        }
    }

    /// Creates a malformed document error for the given line.
    pub fn document(line: usize, detail: impl Into<String>) -> Self {
        Self::MalformedDocument {
            line,
            detail: detail.into(),
        }
    }

    /// Creates an invalid field error.
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// Returns the source line for document errors.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::MalformedDocument { line, .. } => Some(*line),
            _ => None,
        }
    }
}
