//! Table configuration

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use super::ColumnConfig;
use super::RowValidator;
use crate::error::ConfigError;
use crate::model::Row;

/// Configuration for one table.
///
/// # Example
///
/// ```
/// use datatable_lib::config::{ColumnConfig, TableConfig};
///
/// let config = TableConfig::new("people", "name")
///     .editable(true)
///     .filterable(true)
///     .with_column(ColumnConfig::new("name").sortable(true))
///     .with_column(ColumnConfig::new("age").sortable(true));
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableConfig {
    /// Table name, passed to callbacks for identification.
    pub name: String,
    /// Column holding the unique primary key of each row.
    pub key_column: String,
    /// Display title.
    #[serde(default)]
    pub title: Option<String>,
    /// Caps the number of rows the rendering collaborator shows at once.
    #[serde(default)]
    pub max_visible_rows: Option<usize>,
    /// Enables the debounced filter.
    #[serde(default)]
    pub is_filterable: bool,
    /// Enables incremental find.
    #[serde(default)]
    pub is_findable: bool,
    /// Enables row editing.
    #[serde(default)]
    pub is_editable: bool,
    /// Column definitions, in display order.
    pub columns: Vec<ColumnConfig>,
    #[serde(skip)]
    row_validator: Option<RowValidator>,
}

impl TableConfig {
    /// Creates a config with no columns and every feature disabled.
    pub fn new(name: impl Into<String>, key_column: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key_column: key_column.into(),
            title: None,
            max_visible_rows: None,
            is_filterable: false,
            is_findable: false,
            is_editable: false,
            columns: Vec::new(),
            row_validator: None,
        }
    }

    /// Parses the declarative part of a config from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: TableConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the display title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Appends a column.
    pub fn with_column(mut self, column: ColumnConfig) -> Self {
        self.columns.push(column);
        self
    }

    /// Appends several columns.
    pub fn with_columns(mut self, columns: impl IntoIterator<Item = ColumnConfig>) -> Self {
        self.columns.extend(columns);
        self
    }

    /// Caps the number of visible rows.
    pub fn with_max_visible_rows(mut self, rows: usize) -> Self {
        self.max_visible_rows = Some(rows);
        self
    }

    /// Enables or disables filtering.
    pub fn filterable(mut self, enabled: bool) -> Self {
        self.is_filterable = enabled;
        self
    }

    /// Enables or disables incremental find.
    pub fn findable(mut self, enabled: bool) -> Self {
        self.is_findable = enabled;
        self
    }

    /// Enables or disables editing.
    pub fn editable(mut self, enabled: bool) -> Self {
        self.is_editable = enabled;
        self
    }

    /// Sets the row-level validator run on save.
    pub fn with_row_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Row) -> Vec<String> + Send + Sync + 'static,
    {
        self.row_validator = Some(Arc::new(validator));
        self
    }

    /// Checks the structural invariants of the config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.columns.is_empty() {
            return Err(ConfigError::NoColumns {
                table: self.name.clone(),
            });
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(ConfigError::DuplicateColumn {
                    name: column.name.clone(),
                });
            }
        }

        if !seen.contains(self.key_column.as_str()) {
            return Err(ConfigError::MissingKeyColumn {
                name: self.key_column.clone(),
            });
        }

        Ok(())
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnConfig> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Looks up a column by name, failing for unknown names.
    pub fn require_column(&self, name: &str) -> Result<&ColumnConfig, ConfigError> {
        self.column(name)
            .ok_or_else(|| ConfigError::unknown_column(name))
    }

    /// Returns the column names in display order.
    pub fn column_keys(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Runs the row-level validator.
    pub fn validate_row(&self, row: &Row) -> Vec<String> {
        self.row_validator
            .as_ref()
            .map(|validator| validator(row))
            .unwrap_or_default()
    }

    /// Fails with [`ConfigError::Disabled`] unless `enabled`.
    pub(crate) fn require(&self, enabled: bool, feature: &'static str) -> Result<(), ConfigError> {
        if enabled {
            Ok(())
        } else {
            Err(ConfigError::disabled(self.name.clone(), feature))
        }
    }
}

impl fmt::Debug for TableConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableConfig")
            .field("name", &self.name)
            .field("key_column", &self.key_column)
            .field("title", &self.title)
            .field("max_visible_rows", &self.max_visible_rows)
            .field("is_filterable", &self.is_filterable)
            .field("is_findable", &self.is_findable)
            .field("is_editable", &self.is_editable)
            .field("columns", &self.columns)
            .field("row_validator", &self.row_validator.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> TableConfig {
        TableConfig::new("people", "id")
            .with_column(ColumnConfig::new("id"))
            .with_column(ColumnConfig::new("name"))
    }

    #[test]
    fn test_validate_ok() {
        assert!(people().validate().is_ok());
        assert_eq!(people().column_keys(), vec!["id", "name"]);
    }

    #[test]
    fn test_validate_rejects_bad_configs() {
        let empty = TableConfig::new("empty", "id");
        assert!(matches!(empty.validate(), Err(ConfigError::NoColumns { .. })));

        let duplicate = people().with_column(ColumnConfig::new("name"));
        assert!(matches!(
            duplicate.validate(),
            Err(ConfigError::DuplicateColumn { name }) if name == "name"
        ));

        let no_key = TableConfig::new("t", "missing").with_column(ColumnConfig::new("id"));
        assert!(matches!(
            no_key.validate(),
            Err(ConfigError::MissingKeyColumn { .. })
        ));
    }

    #[test]
    fn test_from_json() {
        let config = TableConfig::from_json(
            r#"{
                "name": "items",
                "keyColumn": "id",
                "isFilterable": true,
                "columns": [{"name": "id"}, {"name": "value", "isSortable": true}]
            }"#,
        )
        .unwrap();

        assert!(config.is_filterable);
        assert!(!config.is_editable);
        assert!(config.column("value").unwrap().is_sortable);
        assert!(TableConfig::from_json("{").is_err());
    }

    #[test]
    fn test_row_validator() {
        let config = people().with_row_validator(|row: &Row| {
            if row.get_string("name").ok().flatten() == Some("Error") {
                vec!["Global error: Name cannot be Error".to_string()]
            } else {
                Vec::new()
            }
        });

        assert_eq!(config.validate_row(&Row::new().set("name", "Error")).len(), 1);
        assert!(config.validate_row(&Row::new().set("name", "Fine")).is_empty());
    }
}
