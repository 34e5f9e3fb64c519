//! Top-level error type

use super::ConfigError;
use super::EditError;
use super::SortError;
use super::SourceError;

/// Any error returned by the [`DataTable`](crate::DataTable) orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// Invalid configuration or unknown column.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Rejected sort key sequence.
    #[error(transparent)]
    Sort(#[from] SortError),

    /// Edit session misuse.
    #[error(transparent)]
    Edit(#[from] EditError),

    /// External collaborator failure.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

/// Result alias used throughout the crate.
pub type Result<T, E = TableError> = std::result::Result<T, E>;
