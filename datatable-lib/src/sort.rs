//! Multi-column sort sequence

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::config::ColumnConfig;
use crate::error::SortError;

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    /// Returns the opposite direction.
    pub fn reversed(self) -> Self {
        match self {
            Direction::Asc => Direction::Desc,
            Direction::Desc => Direction::Asc,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Asc => write!(f, "asc"),
            Direction::Desc => write!(f, "desc"),
        }
    }
}

/// One entry of the sort sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey {
    /// Column name.
    pub key: String,
    pub direction: Direction,
}

impl SortKey {
    pub fn new(key: impl Into<String>, direction: Direction) -> Self {
        Self {
            key: key.into(),
            direction,
        }
    }

    /// Ascending sort on `key`.
    pub fn asc(key: impl Into<String>) -> Self {
        Self::new(key, Direction::Asc)
    }

    /// Descending sort on `key`.
    pub fn desc(key: impl Into<String>) -> Self {
        Self::new(key, Direction::Desc)
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.key, self.direction)
    }
}

/// The ordered sort sequence; the first key is the primary one.
///
/// The model only validates and stores the sequence. The table reacts to a
/// change by moving to a new generation.
///
/// # Example
///
/// ```
/// use datatable_lib::config::ColumnConfig;
/// use datatable_lib::sort::{SortKey, SortModel};
///
/// let columns = vec![
///     ColumnConfig::new("name").sortable(true),
///     ColumnConfig::new("age").sortable(true),
/// ];
/// let mut sort = SortModel::new();
///
/// sort.set_sort(vec![SortKey::asc("name")], &columns).unwrap();
///
/// // "name" is taken by the primary key, only "age" is left for priority 1.
/// let candidates: Vec<_> = sort.candidates(1, &columns).map(|c| c.name.as_str()).collect();
/// assert_eq!(candidates, vec!["age"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortModel {
    keys: Vec<SortKey>,
}

impl SortModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current sequence.
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns the priority and direction of `key`, if it is sorted on.
    pub fn position(&self, key: &str) -> Option<(usize, Direction)> {
        self.keys
            .iter()
            .position(|k| k.key == key)
            .map(|priority| (priority, self.keys[priority].direction))
    }

    /// Replaces the sequence. Returns whether it changed.
    pub fn set_sort(
        &mut self,
        keys: Vec<SortKey>,
        columns: &[ColumnConfig],
    ) -> Result<bool, SortError> {
        check(&keys, columns)?;
        if keys == self.keys {
            return Ok(false);
        }
        self.keys = keys;
        Ok(true)
    }

    /// Cycles `key` through ascending, descending and unsorted, keeping the
    /// priority of the other keys. A new key is appended at the lowest
    /// priority.
    pub fn toggle_column(&mut self, key: &str, columns: &[ColumnConfig]) -> Result<(), SortError> {
        check_column(key, columns)?;

        match self.position(key) {
            None => self.keys.push(SortKey::asc(key)),
            Some((priority, Direction::Asc)) => self.keys[priority].direction = Direction::Desc,
            Some((priority, Direction::Desc)) => {
                self.keys.remove(priority);
            }
        }
        Ok(())
    }

    /// Returns the columns selectable at `priority`: sortable columns not
    /// already used at a higher priority.
    pub fn candidates<'a>(
        &'a self,
        priority: usize,
        columns: &'a [ColumnConfig],
    ) -> impl Iterator<Item = &'a ColumnConfig> + 'a {
        let taken = &self.keys[..priority.min(self.keys.len())];
        columns
            .iter()
            .filter(|c| c.is_sortable)
            .filter(move |c| !taken.iter().any(|k| k.key == c.name))
    }

    /// Removes every key. Returns whether there were any.
    pub fn clear(&mut self) -> bool {
        let changed = !self.keys.is_empty();
        self.keys.clear();
        changed
    }
}

fn check_column(key: &str, columns: &[ColumnConfig]) -> Result<(), SortError> {
    match columns.iter().find(|c| c.name == key) {
        None => Err(SortError::UnknownColumn { key: key.to_string() }),
        Some(column) if !column.is_sortable => Err(SortError::NotSortable {
            key: key.to_string(),
        }),
        Some(_) => Ok(()),
    }
}

fn check(keys: &[SortKey], columns: &[ColumnConfig]) -> Result<(), SortError> {
    for (priority, key) in keys.iter().enumerate() {
        check_column(&key.key, columns)?;
        if keys[..priority].iter().any(|k| k.key == key.key) {
            return Err(SortError::Duplicate {
                key: key.key.clone(),
            });
        }
    }
    Ok(())
}
