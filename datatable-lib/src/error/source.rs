//! Errors reported by the external row, edit and find callbacks

/// Failure of a call into an external collaborator.
///
/// Every source failure is recoverable: a failed read leaves its window
/// unfetched and is retried on the next navigation into it, a failed edit is
/// surfaced as a row-level error on the open edit session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct SourceError {
    /// Human-readable error message.
    pub message: String,
}

impl SourceError {
    /// Creates a new source error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for SourceError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for SourceError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}
