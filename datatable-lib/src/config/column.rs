//! Column configuration

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use crate::model::Row;
use crate::model::Value;

/// Converts a cell value to display text.
pub type Formatter = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// Validates a user-entered value, returning error messages (empty = valid).
pub type FieldValidator = Arc<dyn Fn(&Value) -> Vec<String> + Send + Sync>;

/// Lists the legal values of a select-style column.
pub type EnumValues = Arc<dyn Fn() -> Vec<String> + Send + Sync>;

/// Validates a whole row on save, returning error messages (empty = valid).
pub type RowValidator = Arc<dyn Fn(&Row) -> Vec<String> + Send + Sync>;

/// How a column's text wraps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Wrap {
    /// Single line, truncated.
    #[default]
    None,
    /// Wrap at word boundaries.
    Word,
    /// Wrap at any character.
    Hard,
}

/// Horizontal alignment of a column's text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Justify {
    #[default]
    Left,
    Center,
    Right,
}

fn default_max_lines() -> u16 {
    ColumnConfig::DEFAULT_MAX_LINES
}

fn default_max_chars() -> u16 {
    ColumnConfig::DEFAULT_MAX_CHARS
}

/// Definition of one column.
///
/// The declarative fields load from JSON; the callbacks (`formatter`,
/// `validator`, `enum_values`) are attached with the `with_*` setters.
///
/// # Example
///
/// ```
/// use datatable_lib::config::ColumnConfig;
/// use datatable_lib::model::Value;
///
/// let age = ColumnConfig::new("age")
///     .sortable(true)
///     .with_formatter(|value: &Value| format!("{value} years young"))
///     .with_validator(|value: &Value| match value {
///         Value::Int(v) if *v < 0 => vec!["Age cannot be negative".to_string()],
///         _ => Vec::new(),
///     });
///
/// assert_eq!(age.display_title(), "Age");
/// assert_eq!(age.format(&Value::from(3i64)), "3 years young");
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnConfig {
    /// Column name in the data source (key).
    pub name: String,
    /// Display title. Defaults to the name in title case.
    #[serde(default)]
    pub title: Option<String>,
    /// Whether the column can take part in the sort sequence.
    #[serde(default)]
    pub is_sortable: bool,
    /// Wrapping mode.
    #[serde(default)]
    pub wrappable: Wrap,
    /// When wrapping, the maximum number of lines a row may use.
    #[serde(default = "default_max_lines")]
    pub max_lines: u16,
    /// Horizontal alignment.
    #[serde(default)]
    pub justify: Justify,
    /// Maximum column width in characters.
    #[serde(default = "default_max_chars")]
    pub max_chars: u16,
    #[serde(skip)]
    formatter: Option<Formatter>,
    #[serde(skip)]
    validator: Option<FieldValidator>,
    #[serde(skip)]
    enum_values: Option<EnumValues>,
}

impl ColumnConfig {
    /// Default line limit for wrapped columns.
    pub const DEFAULT_MAX_LINES: u16 = 2;

    /// Default width, wide enough for a date or a dollar amount.
    pub const DEFAULT_MAX_CHARS: u16 = 9;

    /// Creates a column with default settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            is_sortable: false,
            wrappable: Wrap::None,
            max_lines: Self::DEFAULT_MAX_LINES,
            justify: Justify::Left,
            max_chars: Self::DEFAULT_MAX_CHARS,
            formatter: None,
            validator: None,
            enum_values: None,
        }
    }

    /// Sets the display title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets whether the column is sortable.
    pub fn sortable(mut self, sortable: bool) -> Self {
        self.is_sortable = sortable;
        self
    }

    /// Sets the wrapping mode.
    pub fn with_wrap(mut self, wrap: Wrap) -> Self {
        self.wrappable = wrap;
        self
    }

    /// Sets the line limit for wrapped text.
    pub fn with_max_lines(mut self, lines: u16) -> Self {
        self.max_lines = lines;
        self
    }

    /// Sets the alignment.
    pub fn with_justify(mut self, justify: Justify) -> Self {
        self.justify = justify;
        self
    }

    /// Sets the maximum width in characters.
    pub fn with_max_chars(mut self, chars: u16) -> Self {
        self.max_chars = chars;
        self
    }

    /// Sets the display formatter.
    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    /// Sets the field validator.
    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Value) -> Vec<String> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Sets the list of legal values.
    pub fn with_enum_values<F>(mut self, values: F) -> Self
    where
        F: Fn() -> Vec<String> + Send + Sync + 'static,
    {
        self.enum_values = Some(Arc::new(values));
        self
    }

    /// Returns the title, or the name in title case.
    pub fn display_title(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| title_case(&self.name))
    }

    /// Formats a value for display.
    pub fn format(&self, value: &Value) -> String {
        match &self.formatter {
            Some(formatter) => formatter(value),
            None => value.to_string(),
        }
    }

    /// Returns the legal values, if the column is a select.
    pub fn enum_values(&self) -> Option<Vec<String>> {
        self.enum_values.as_ref().map(|values| values())
    }

    /// Validates a user-entered value.
    ///
    /// Runs the column validator, then rejects values outside the enum list.
    pub fn validate(&self, value: &Value) -> Vec<String> {
        let mut messages = self
            .validator
            .as_ref()
            .map(|validator| validator(value))
            .unwrap_or_default();

        if let Some(allowed) = self.enum_values()
            && !value.is_null()
        {
            let text = value.to_string();
            if !allowed.iter().any(|v| *v == text) {
                messages.push(format!("'{text}' is not one of: {}", allowed.join(", ")));
            }
        }

        messages
    }
}

impl fmt::Debug for ColumnConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnConfig")
            .field("name", &self.name)
            .field("title", &self.title)
            .field("is_sortable", &self.is_sortable)
            .field("wrappable", &self.wrappable)
            .field("max_lines", &self.max_lines)
            .field("justify", &self.justify)
            .field("max_chars", &self.max_chars)
            .field("formatter", &self.formatter.is_some())
            .field("validator", &self.validator.is_some())
            .field("enum_values", &self.enum_values.is_some())
            .finish()
    }
}

/// `first_name` / `first-name` / `first name` -> `First Name`.
fn title_case(name: &str) -> String {
    name.split(['_', '-', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
