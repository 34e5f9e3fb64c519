//! Configuration errors

/// Errors raised while validating a table configuration or resolving
/// column names against it.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The table declares no columns.
    #[error("Table '{table}' has no columns")]
    NoColumns { table: String },

    /// Two columns share the same name.
    #[error("Duplicate column '{name}'")]
    DuplicateColumn { name: String },

    /// The key column is not one of the configured columns.
    #[error("Key column '{name}' is not a configured column")]
    MissingKeyColumn { name: String },

    /// A column name does not exist in the current column set.
    #[error("Unknown column '{name}'")]
    UnknownColumn { name: String },

    /// A feature was used that the table configuration does not enable.
    #[error("Table '{table}' is not {feature}")]
    Disabled { table: String, feature: &'static str },

    /// A feature is enabled but the callback it needs was not supplied.
    #[error("Table '{table}' is {feature} but has no {callback}")]
    MissingCallback {
        table: String,
        feature: &'static str,
        callback: &'static str,
    },

    /// The declarative configuration could not be parsed.
    #[error("Invalid table configuration: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    /// Creates an unknown column error.
    pub fn unknown_column(name: impl Into<String>) -> Self {
        Self::UnknownColumn { name: name.into() }
    }

    /// Creates a disabled feature error.
    pub fn disabled(table: impl Into<String>, feature: &'static str) -> Self {
        Self::Disabled {
            table: table.into(),
            feature,
        }
    }
}
