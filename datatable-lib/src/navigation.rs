//! Active cell navigation

use std::ops::Range;

use serde::Serialize;

use crate::error::ConfigError;

/// A keyboard navigation command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavCommand {
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    Left,
    Right,
}

/// The active cell as exposed to the rendering collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveCellInfo {
    /// Absolute index in the current sort/filter order.
    pub data_row_index: usize,
    pub data_column_name: String,
    /// Position within the rendered rows; `None` when scrolled out of view.
    pub viewport_row_index: Option<usize>,
}

/// What the table knows about the extent of the data set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Extent {
    /// Total rows, once a short read revealed the end.
    pub row_count: Option<usize>,
    /// Highest cached index.
    pub last_cached: Option<usize>,
}

impl Extent {
    fn clamp(&self, index: usize) -> usize {
        match self.row_count {
            Some(count) => index.min(count.saturating_sub(1)),
            None => index,
        }
    }
}

/// Owns the active cell.
///
/// The row index moves synchronously on every command, whether or not the
/// target row has been fetched; a burst of N presses always lands N rows
/// away (clamped). Scrolling and fetching are left to the table.
///
/// # Example
///
/// ```
/// use datatable_lib::navigation::{Extent, NavCommand, NavigationController};
///
/// let mut nav = NavigationController::new(vec!["a".into(), "b".into()]);
/// let extent = Extent { row_count: Some(30), last_cached: None };
///
/// nav.apply(NavCommand::PageDown, 20, extent);
/// assert_eq!(nav.row(), 20);
/// nav.apply(NavCommand::PageDown, 20, extent);
/// assert_eq!(nav.row(), 29);
/// nav.apply(NavCommand::Right, 20, extent);
/// assert_eq!(nav.column(), "b");
/// ```
#[derive(Debug, Clone)]
pub struct NavigationController {
    row: usize,
    column: usize,
    columns: Vec<String>,
}

impl NavigationController {
    /// Creates a controller on row 0 of the first column.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            row: 0,
            column: 0,
            columns,
        }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    /// Returns the active column name.
    pub fn column(&self) -> &str {
        self.columns
            .get(self.column)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Computes the row a command moves to. `page` is the viewport's row
    /// count at the time of the command.
    pub fn target(&self, command: NavCommand, page: usize, extent: Extent) -> usize {
        let page = page.max(1);
        let target = match command {
            NavCommand::Up => self.row.saturating_sub(1),
            NavCommand::Down => self.row + 1,
            NavCommand::PageUp => self.row.saturating_sub(page),
            NavCommand::PageDown => self.row + page,
            NavCommand::Home => 0,
            NavCommand::End => match extent.row_count {
                Some(count) => count.saturating_sub(1),
                None => extent.last_cached.unwrap_or(0).max(self.row),
            },
            NavCommand::Left | NavCommand::Right => self.row,
        };
        extent.clamp(target)
    }

    /// Applies a command. Returns the new row index.
    pub fn apply(&mut self, command: NavCommand, page: usize, extent: Extent) -> usize {
        match command {
            NavCommand::Left => self.column = self.column.saturating_sub(1),
            NavCommand::Right => {
                self.column = (self.column + 1).min(self.columns.len().saturating_sub(1))
            }
            _ => self.row = self.target(command, page, extent),
        }
        self.row
    }

    /// Moves to `row`, clamped to the known extent.
    pub fn set_row(&mut self, row: usize, extent: Extent) -> usize {
        self.row = extent.clamp(row);
        self.row
    }

    /// Moves to the named column.
    pub fn set_column(&mut self, name: &str) -> Result<(), ConfigError> {
        let index = self
            .columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| ConfigError::unknown_column(name))?;
        self.column = index;
        Ok(())
    }

    /// Pulls the row back inside a newly learned end. Returns whether it
    /// moved.
    pub fn clamp_to(&mut self, row_count: usize) -> bool {
        let clamped = self.row.min(row_count.saturating_sub(1));
        let moved = clamped != self.row;
        self.row = clamped;
        moved
    }

    /// Back to the first row, keeping the column.
    pub fn reset(&mut self) {
        self.row = 0;
    }

    /// Describes the active cell against the rendered `visible` range.
    /// `None` when the data set is known to be empty.
    pub fn info(&self, visible: Range<usize>, row_count: Option<usize>) -> Option<ActiveCellInfo> {
        if row_count == Some(0) || self.columns.is_empty() {
            return None;
        }

        Some(ActiveCellInfo {
            data_row_index: self.row,
            data_column_name: self.column().to_string(),
            viewport_row_index: visible
                .contains(&self.row)
                .then(|| self.row - visible.start),
        })
    }
}
