//! Sort configuration errors

/// Errors raised when a sort key sequence is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SortError {
    /// The column does not exist.
    #[error("Cannot sort by unknown column '{key}'")]
    UnknownColumn { key: String },

    /// The column is not declared sortable.
    #[error("Column '{key}' is not sortable")]
    NotSortable { key: String },

    /// The column already appears at a higher priority.
    #[error("Column '{key}' appears more than once in the sort sequence")]
    Duplicate { key: String },
}
