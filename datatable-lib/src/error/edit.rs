//! Edit session errors

use crate::edit::EditPhase;

/// Errors raised by misuse of the edit session state machine.
///
/// Validation failures and callback rejections are not errors; they are
/// reported through [`SaveOutcome`](crate::edit::SaveOutcome) and leave the
/// session open.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    /// No edit session is open.
    #[error("No edit session is open")]
    NoSession,

    /// An edit session is already open.
    #[error("An edit session is already open")]
    SessionOpen,

    /// The operation is not valid in the session's current phase.
    #[error("Cannot {operation} while {phase:?}")]
    InvalidPhase {
        operation: &'static str,
        phase: EditPhase,
    },

    /// The row to edit has not been fetched yet.
    #[error("Row {index} is not loaded")]
    RowNotLoaded { index: usize },

    /// The session has no original row (a create session cannot be deleted
    /// or updated).
    #[error("Session has no original row")]
    NoOriginalRow,

    /// Delete was requested without the confirmation step.
    #[error("Delete requires confirmation")]
    ConfirmationRequired,

    /// No row edit callback was supplied.
    #[error("No row edit callback configured")]
    NoEditor,
}
