//! Ports to the external collaborators
//!
//! The table never owns its data. It reads windows of rows through a
//! [`RowSource`], writes edits through a [`RowEditor`], delegates incremental
//! find to a [`FindSource`] and drives scrolling through a [`Viewport`].
//!
//! [`MemorySource`] implements the three data ports over an in-memory row
//! set and [`HeadlessViewport`] implements the viewport without rendering.

mod memory;
mod viewport;

pub use memory::*;
pub use viewport::*;

use std::ops::Range;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use crate::error::SourceError;
use crate::fetch::FetchRequest;
use crate::find::FindRequest;
use crate::model::Row;

/// Kind of row edit sent to the [`RowEditor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditAction {
    Create,
    Update,
    Delete,
}

/// Answer of the [`RowEditor`] to one edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// The source applied the edit.
    Saved,
    /// The source refused the edit; the message is shown on the session.
    Rejected(String),
}

impl EditOutcome {
    /// Creates a rejection.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }
}

/// Search direction for the [`FindSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindDirection {
    Next,
    Previous,
}

/// A find hit: the row, and optionally the column that matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindMatch {
    pub row_index: usize,
    pub column_name: Option<String>,
}

impl FindMatch {
    /// Creates a match with a column.
    pub fn new(row_index: usize, column_name: impl Into<String>) -> Self {
        Self {
            row_index,
            column_name: Some(column_name.into()),
        }
    }
}

impl From<usize> for FindMatch {
    fn from(row_index: usize) -> Self {
        Self {
            row_index,
            column_name: None,
        }
    }
}

/// Reads windows of rows.
///
/// Must return at most `request.count` rows starting logically at
/// `request.start` in the order given by `request.sort_keys`, restricted by
/// `request.filter_term`. Returning fewer rows than requested marks the end
/// of the data set at `request.start + returned`.
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn fetch_rows(&self, request: &FetchRequest) -> Result<Vec<Row>, SourceError>;
}

/// Applies a single-row edit to the source.
///
/// `original` is the row as it was before editing (`None` for creates), so
/// the source can locate the record even if the key column was changed.
#[async_trait]
pub trait RowEditor: Send + Sync {
    async fn edit_row(
        &self,
        action: EditAction,
        row: &Row,
        original: Option<&Row>,
        key_column: &str,
    ) -> Result<EditOutcome, SourceError>;
}

/// Finds rows matching a term, in the order given by `request.sort_keys`
/// and restricted by `request.filter_term`.
///
/// With [`FindDirection::Next`] the result is the first match with an index
/// greater than `request.from` (any index when it is `None`). With
/// [`FindDirection::Previous`] it is the last match with an index less than
/// `request.from` (searching from the end when it is `None`).
#[async_trait]
pub trait FindSource: Send + Sync {
    async fn find(&self, request: &FindRequest) -> Result<Option<FindMatch>, SourceError>;
}

/// Where a row should land in the viewport after scrolling to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScrollAlign {
    /// Scroll the minimum distance that makes the row visible.
    #[default]
    Auto,
    Start,
    Center,
    End,
}

/// The virtualized rendering primitive.
///
/// Reports which absolute row indices are rendered and accepts scroll
/// commands. Implementations use interior mutability; the table only holds a
/// shared reference.
pub trait Viewport: Send + Sync {
    /// Returns the range of row indices currently rendered.
    fn visible_range(&self) -> Range<usize>;

    /// Returns the number of rows that fit in the viewport.
    fn visible_row_count(&self) -> usize {
        self.visible_range().len()
    }

    /// Scrolls so that `index` is visible.
    fn scroll_to_index(&self, index: usize, align: ScrollAlign);
}
