//! Single-row edit sessions
//!
//! An [`EditSession`] exists from the moment the user opens a row for
//! editing until the edit is saved or cancelled; no session means the table
//! is idle. The session holds the working copy of the row and its validation
//! errors, and produces an [`EditCommit`] once the row is valid. Sending the
//! commit to the [`RowEditor`](crate::source::RowEditor) and applying the
//! result to the cache is done by the [`DataTable`](crate::DataTable).

use std::collections::BTreeMap;

use log::debug;

use crate::config::ColumnConfig;
use crate::config::TableConfig;
use crate::error::EditError;
use crate::error::SourceError;
use crate::model::Generation;
use crate::model::Row;
use crate::model::Value;
use crate::source::EditAction;
use crate::source::EditOutcome;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditPhase {
    /// Fields can be changed.
    Editing,
    /// A delete is waiting for confirmation.
    ConfirmingDelete,
    /// Validators are running ahead of a save.
    Validating,
    /// The edit callback has been invoked and has not answered.
    Saving,
}

/// Result of a save attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The edit was applied; the session is closed.
    Saved,
    /// Validation errors prevented the edit callback from being invoked.
    Blocked,
    /// The source refused the edit or failed; the message is on the session.
    Rejected(String),
}

/// An edit ready to be sent to the row editor.
#[derive(Debug, Clone, PartialEq)]
pub struct EditCommit {
    pub action: EditAction,
    pub row: Row,
    /// The row as it was before editing; `None` for creates.
    pub original: Option<Row>,
    pub key_column: String,
    /// Generation the edited row was read under.
    pub generation: Generation,
    /// Index of the edited row when the session began.
    pub row_index: Option<usize>,
}

impl EditCommit {
    /// Key value identifying the original row.
    pub fn original_key(&self) -> Option<&Value> {
        self.original.as_ref().map(|row| row.value(&self.key_column))
    }
}

/// Working state of one row edit.
#[derive(Debug, Clone)]
pub struct EditSession {
    mode: EditAction,
    phase: EditPhase,
    generation: Generation,
    row_index: Option<usize>,
    original: Option<Row>,
    working: Row,
    field_errors: BTreeMap<String, Vec<String>>,
    row_errors: Vec<String>,
}

impl EditSession {
    fn new(
        mode: EditAction,
        generation: Generation,
        row_index: Option<usize>,
        original: Option<Row>,
        working: Row,
    ) -> Self {
        Self {
            mode,
            phase: EditPhase::Editing,
            generation,
            row_index,
            original,
            working,
            field_errors: BTreeMap::new(),
            row_errors: Vec::new(),
        }
    }

    /// Opens an existing row for editing.
    pub fn begin_update(row: Row, row_index: usize, generation: Generation) -> Self {
        Self::new(EditAction::Update, generation, Some(row_index), Some(row.clone()), row)
    }

    /// Opens a new, empty row. Every configured column starts out null.
    pub fn begin_create(columns: &[ColumnConfig], generation: Generation) -> Self {
        let working = columns
            .iter()
            .map(|c| (c.name.clone(), Value::Null))
            .collect();
        Self::new(EditAction::Create, generation, None, None, working)
    }

    /// Opens an existing row for deletion.
    pub fn begin_delete(row: Row, row_index: usize, generation: Generation) -> Self {
        Self::new(EditAction::Delete, generation, Some(row_index), Some(row.clone()), row)
    }

    pub fn mode(&self) -> EditAction {
        self.mode
    }

    pub fn phase(&self) -> EditPhase {
        self.phase
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn row_index(&self) -> Option<usize> {
        self.row_index
    }

    pub fn original(&self) -> Option<&Row> {
        self.original.as_ref()
    }

    /// The row being edited.
    pub fn working(&self) -> &Row {
        &self.working
    }

    pub fn field_errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.field_errors
    }

    /// Errors of one field.
    pub fn errors_for(&self, field: &str) -> &[String] {
        self.field_errors
            .get(field)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn row_errors(&self) -> &[String] {
        &self.row_errors
    }

    /// Returns `true` while any field or row error is present. Save and
    /// save-as-new are disabled in that state.
    pub fn has_errors(&self) -> bool {
        !self.row_errors.is_empty() || self.field_errors.values().any(|e| !e.is_empty())
    }

    /// Changes a field of the working row and clears its errors.
    pub fn set_field(&mut self, field: &str, value: Value) -> Result<(), EditError> {
        self.expect_phase(EditPhase::Editing, "edit a field")?;
        self.working.insert(field, value);
        self.field_errors.remove(field);
        Ok(())
    }

    /// Validates one field, as when it loses focus. Returns its errors.
    pub fn blur_field(&mut self, column: &ColumnConfig) -> Result<&[String], EditError> {
        self.expect_phase(EditPhase::Editing, "validate a field")?;
        self.validate_field(column);
        Ok(self.errors_for(&column.name))
    }

    /// Opens the delete confirmation.
    pub fn request_delete(&mut self) -> Result<(), EditError> {
        self.expect_phase(EditPhase::Editing, "delete")?;
        if self.original.is_none() {
            return Err(EditError::NoOriginalRow);
        }
        self.phase = EditPhase::ConfirmingDelete;
        Ok(())
    }

    /// Backs out of the delete confirmation.
    pub fn cancel_delete(&mut self) -> Result<(), EditError> {
        self.expect_phase(EditPhase::ConfirmingDelete, "cancel delete")?;
        self.phase = EditPhase::Editing;
        Ok(())
    }

    /// Validates the session for `action` and, when it is valid, moves to
    /// [`EditPhase::Saving`] and returns the commit.
    ///
    /// Returns `Ok(None)` when validation errors block the save; the session
    /// stays in [`EditPhase::Editing`] with the errors populated. Deletes are
    /// not validated but must have been confirmed.
    pub fn prepare_save(
        &mut self,
        action: EditAction,
        config: &TableConfig,
    ) -> Result<Option<EditCommit>, EditError> {
        match action {
            EditAction::Delete => {
                if self.phase != EditPhase::ConfirmingDelete {
                    return Err(EditError::ConfirmationRequired);
                }
            }
            EditAction::Create | EditAction::Update => {
                self.expect_phase(EditPhase::Editing, "save")?;
            }
        }
        if action != EditAction::Create && self.original.is_none() {
            return Err(EditError::NoOriginalRow);
        }

        if action != EditAction::Delete {
            self.phase = EditPhase::Validating;
            for column in &config.columns {
                self.validate_field(column);
            }
            self.row_errors = config.validate_row(&self.working);

            if self.has_errors() {
                debug!(
                    "Save of '{}' blocked by {} field and {} row errors",
                    config.name,
                    self.field_errors.len(),
                    self.row_errors.len()
                );
                self.phase = EditPhase::Editing;
                return Ok(None);
            }
        }

        self.phase = EditPhase::Saving;
        Ok(Some(EditCommit {
            action,
            row: self.working.clone(),
            original: match action {
                EditAction::Create => None,
                EditAction::Update | EditAction::Delete => self.original.clone(),
            },
            key_column: config.key_column.clone(),
            generation: self.generation,
            row_index: match action {
                EditAction::Create => Some(0),
                EditAction::Update | EditAction::Delete => self.row_index,
            },
        }))
    }

    /// Takes the editor's answer. On anything but success the message becomes
    /// the row error and the session returns to [`EditPhase::Editing`].
    pub fn finish(&mut self, result: Result<EditOutcome, SourceError>) -> SaveOutcome {
        let message = match result {
            Ok(EditOutcome::Saved) => return SaveOutcome::Saved,
            Ok(EditOutcome::Rejected(message)) => message,
            Err(err) => err.to_string(),
        };
        self.row_errors = vec![message.clone()];
        self.phase = EditPhase::Editing;
        SaveOutcome::Rejected(message)
    }

    fn validate_field(&mut self, column: &ColumnConfig) {
        let messages = column.validate(self.working.value(&column.name));
        if messages.is_empty() {
            self.field_errors.remove(&column.name);
        } else {
            self.field_errors.insert(column.name.clone(), messages);
        }
    }

    fn expect_phase(&self, expected: EditPhase, operation: &'static str) -> Result<(), EditError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(EditError::InvalidPhase {
                operation,
                phase: self.phase,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TableConfig {
        TableConfig::new("people", "id")
            .editable(true)
            .with_column(ColumnConfig::new("id"))
            .with_column(ColumnConfig::new("name").with_validator(|value: &Value| {
                if value.to_string().chars().count() < 3 {
                    vec!["Name too short".to_string()]
                } else {
                    Vec::new()
                }
            }))
            .with_column(
                ColumnConfig::new("status")
                    .with_enum_values(|| vec!["Active".into(), "Inactive".into()]),
            )
            .with_row_validator(|row: &Row| {
                if row.get_string("name").ok().flatten() == Some("Error") {
                    vec!["Name cannot be Error".to_string()]
                } else {
                    Vec::new()
                }
            })
    }

    fn person() -> Row {
        Row::new()
            .set("id", 1)
            .set("name", "Alice")
            .set("status", "Active")
    }

    #[test]
    fn test_valid_update_produces_commit() {
        let config = config();
        let mut session = EditSession::begin_update(person(), 4, Generation::INITIAL);
        session.set_field("name", Value::from("Alicia")).unwrap();

        let commit = session
            .prepare_save(EditAction::Update, &config)
            .unwrap()
            .unwrap();

        assert_eq!(session.phase(), EditPhase::Saving);
        assert_eq!(commit.action, EditAction::Update);
        assert_eq!(commit.row.get_string("name").unwrap(), Some("Alicia"));
        assert_eq!(commit.original, Some(person()));
        assert_eq!(commit.original_key(), Some(&Value::from(1)));
        assert_eq!(commit.row_index, Some(4));
        assert_eq!(commit.key_column, "id");
    }

    #[test]
    fn test_field_validation_blocks_save() {
        let config = config();
        let mut session = EditSession::begin_update(person(), 0, Generation::INITIAL);
        session.set_field("name", Value::from("Al")).unwrap();

        let errors = session.blur_field(config.column("name").unwrap()).unwrap();
        assert_eq!(errors, ["Name too short"]);

        assert_eq!(session.prepare_save(EditAction::Update, &config).unwrap(), None);
        assert_eq!(session.phase(), EditPhase::Editing);
        assert!(session.has_errors());

        // Typing clears the field's errors.
        session.set_field("name", Value::from("Albert")).unwrap();
        assert!(session.errors_for("name").is_empty());
        assert!(session.prepare_save(EditAction::Update, &config).unwrap().is_some());
    }

    #[test]
    fn test_row_validation_blocks_save() {
        let config = config();
        let mut session = EditSession::begin_update(person(), 0, Generation::INITIAL);
        session.set_field("name", Value::from("Error")).unwrap();

        assert_eq!(session.prepare_save(EditAction::Update, &config).unwrap(), None);
        assert_eq!(session.row_errors(), ["Name cannot be Error"]);
    }

    #[test]
    fn test_enum_values_checked() {
        let config = config();
        let mut session = EditSession::begin_update(person(), 0, Generation::INITIAL);
        session.set_field("status", Value::from("Retired")).unwrap();

        let errors = session.blur_field(config.column("status").unwrap()).unwrap();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_create_starts_with_null_fields() {
        let config = config();
        let mut session = EditSession::begin_create(&config.columns, Generation::INITIAL);
        assert_eq!(session.mode(), EditAction::Create);
        assert!(session.working().value("name").is_null());
        assert!(session.working().contains("status"));

        session.set_field("id", Value::from(9)).unwrap();
        session.set_field("name", Value::from("Zed")).unwrap();
        let commit = session.prepare_save(EditAction::Create, &config).unwrap().unwrap();
        assert_eq!(commit.original, None);

        let mut empty = EditSession::begin_create(&config.columns, Generation::INITIAL);
        assert!(matches!(
            empty.prepare_save(EditAction::Update, &config),
            Err(EditError::NoOriginalRow)
        ));
    }

    #[test]
    fn test_save_as_new_drops_original() {
        let config = config();
        let mut session = EditSession::begin_update(person(), 3, Generation::INITIAL);
        let commit = session.prepare_save(EditAction::Create, &config).unwrap().unwrap();

        assert_eq!(commit.action, EditAction::Create);
        assert_eq!(commit.original, None);
        assert_eq!(commit.row_index, Some(0));
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let config = config();
        let mut session = EditSession::begin_delete(person(), 2, Generation::INITIAL);

        assert!(matches!(
            session.prepare_save(EditAction::Delete, &config),
            Err(EditError::ConfirmationRequired)
        ));

        session.request_delete().unwrap();
        assert_eq!(session.phase(), EditPhase::ConfirmingDelete);
        assert!(session.set_field("name", Value::from("x")).is_err());

        session.cancel_delete().unwrap();
        session.request_delete().unwrap();
        let commit = session.prepare_save(EditAction::Delete, &config).unwrap().unwrap();
        assert_eq!(commit.action, EditAction::Delete);
        assert_eq!(commit.original, Some(person()));
    }

    #[test]
    fn test_delete_skips_validation() {
        let config = config();
        let invalid = person().set("name", "Al");
        let mut session = EditSession::begin_delete(invalid, 0, Generation::INITIAL);
        session.request_delete().unwrap();
        assert!(session.prepare_save(EditAction::Delete, &config).unwrap().is_some());
    }

    #[test]
    fn test_rejection_reopens_session() {
        let config = config();
        let mut session = EditSession::begin_update(person(), 0, Generation::INITIAL);
        session.prepare_save(EditAction::Update, &config).unwrap();

        let outcome = session.finish(Ok(EditOutcome::rejected("Duplicate key")));
        assert_eq!(outcome, SaveOutcome::Rejected("Duplicate key".into()));
        assert_eq!(session.phase(), EditPhase::Editing);
        assert_eq!(session.row_errors(), ["Duplicate key"]);

        session.prepare_save(EditAction::Update, &config).unwrap();
        let outcome = session.finish(Err(SourceError::new("connection reset")));
        assert_eq!(outcome, SaveOutcome::Rejected("connection reset".into()));
    }

    #[test]
    fn test_cannot_save_twice() {
        let config = config();
        let mut session = EditSession::begin_update(person(), 0, Generation::INITIAL);
        session.prepare_save(EditAction::Update, &config).unwrap();

        assert!(matches!(
            session.prepare_save(EditAction::Update, &config),
            Err(EditError::InvalidPhase {
                phase: EditPhase::Saving,
                ..
            })
        ));
    }
}
