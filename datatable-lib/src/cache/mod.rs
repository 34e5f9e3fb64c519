//! Row cache keyed by absolute index
//!
//! Holds the rows fetched for the current generation, learns the end of the
//! data set from short reads and shifts indices when local edits insert or
//! remove rows.

mod config;

pub use config::*;

use std::collections::BTreeMap;
use std::ops::Range;

use log::debug;

use crate::model::Generation;
use crate::model::Row;
use crate::model::RowRange;
use crate::model::Value;
use crate::source::EditAction;

/// Rows of the current generation keyed by absolute index.
///
/// Rows are only ever written for the generation the cache is in; results
/// fetched under an older generation are refused. Evicted or missing rows are
/// simply absent, the cache never fabricates data.
///
/// # Example
///
/// ```
/// use datatable_lib::cache::RangeCache;
/// use datatable_lib::model::{Generation, Row, RowRange};
///
/// let mut cache = RangeCache::new("id", 100);
/// let rows = vec![Row::new().set("id", 0), Row::new().set("id", 1)];
/// cache.merge(RowRange::new(Generation::INITIAL, 10, rows));
///
/// assert!(cache.get(11).is_some());
/// assert_eq!(cache.missing(8..13), vec![8..10, 12..13]);
/// ```
#[derive(Debug)]
pub struct RangeCache {
    generation: Generation,
    key_column: String,
    rows: BTreeMap<usize, Row>,
    row_count: Option<usize>,
    capacity: usize,
    focus: usize,
}

impl RangeCache {
    /// Creates an empty cache holding at most `capacity` rows.
    pub fn new(key_column: impl Into<String>, capacity: usize) -> Self {
        Self {
            generation: Generation::INITIAL,
            key_column: key_column.into(),
            rows: BTreeMap::new(),
            row_count: None,
            capacity: capacity.max(1),
            focus: 0,
        }
    }

    /// Returns the generation the cached rows belong to.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Returns the row at `index`, if fetched.
    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(&index)
    }

    /// Returns `true` if the row at `index` is fetched.
    pub fn contains(&self, index: usize) -> bool {
        self.rows.contains_key(&index)
    }

    /// Returns the number of rows held.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if no rows are held.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the total number of rows, once a short read has revealed it.
    pub fn row_count(&self) -> Option<usize> {
        self.row_count
    }

    /// Returns the highest index known to exist.
    ///
    /// Uses the known row count when there is one, otherwise the highest
    /// cached index.
    pub fn last_index(&self) -> Option<usize> {
        match self.row_count {
            Some(count) => count.checked_sub(1),
            None => self.rows.last_key_value().map(|(index, _)| *index),
        }
    }

    /// Iterates over the cached rows within `range`.
    pub fn rows_in(&self, range: Range<usize>) -> impl Iterator<Item = (usize, &Row)> {
        self.rows.range(range).map(|(index, row)| (*index, row))
    }

    /// Records the centre of the most recently requested window. Eviction
    /// removes the rows farthest from it.
    pub fn set_focus(&mut self, index: usize) {
        self.focus = index;
    }

    /// Overlays `range` on the cache, replacing overlapping rows.
    ///
    /// Returns `false` and leaves the cache untouched when the range belongs
    /// to another generation.
    pub fn merge(&mut self, range: RowRange) -> bool {
        if range.generation() != self.generation {
            debug!(
                "Discarding rows {:?} from {} (cache is at {})",
                range.span(),
                range.generation(),
                self.generation
            );
            return false;
        }

        self.rows.extend(range.into_indexed());
        self.evict();
        true
    }

    /// Learns the data set extent from a read of `requested` rows at `start`
    /// that returned `returned` rows.
    ///
    /// A short read fixes the row count at `start + returned` and drops any
    /// cached rows past it. An empty read only shows that the count is at
    /// most `start`. A full read reaching past a known count means the count
    /// is out of date, so it is forgotten.
    pub fn observe_extent(
        &mut self,
        generation: Generation,
        start: usize,
        requested: usize,
        returned: usize,
    ) -> bool {
        if generation != self.generation {
            return false;
        }

        let end = start + returned;
        if returned < requested {
            let count = match self.row_count {
                Some(known) if returned == 0 => known.min(start),
                _ => end,
            };
            if self.row_count != Some(count) {
                debug!("Data set ends at row {count} ({generation})");
            }
            self.row_count = Some(count);
            self.rows.split_off(&count);
        } else if let Some(count) = self.row_count
            && end > count
        {
            self.row_count = None;
        }
        true
    }

    /// Returns the sub-ranges of `range` that are not cached, clipped to the
    /// known row count.
    pub fn missing(&self, range: Range<usize>) -> Vec<Range<usize>> {
        let end = match self.row_count {
            Some(count) => range.end.min(count),
            None => range.end,
        };

        let mut gaps = Vec::new();
        let mut cursor = range.start;
        for index in self.rows.range(range.start..end).map(|(index, _)| *index) {
            if index > cursor {
                gaps.push(cursor..index);
            }
            cursor = index + 1;
        }
        if cursor < end {
            gaps.push(cursor..end);
        }
        gaps
    }

    /// Drops every row and the learned extent, and moves to `generation`.
    pub fn invalidate_all(&mut self, generation: Generation) {
        debug!(
            "Invalidating {} cached rows ({} -> {generation})",
            self.rows.len(),
            self.generation
        );
        self.rows.clear();
        self.row_count = None;
        self.generation = generation;
    }

    /// Returns the cached index of the row whose key column equals `key`.
    pub fn index_of_key(&self, key: &Value) -> Option<usize> {
        if key.is_null() {
            return None;
        }
        self.rows
            .iter()
            .find(|(_, row)| row.value(&self.key_column) == key)
            .map(|(index, _)| *index)
    }

    /// Applies a successful edit without refetching.
    ///
    /// * `Update` replaces the row in place.
    /// * `Delete` removes the row and moves every later row up one index.
    /// * `Create` moves every row down one index and inserts at index 0.
    ///
    /// The row is located by `original_key`, falling back to `index_hint`
    /// when the key is not cached. Returns the affected index, or `None` when
    /// the edit belongs to another generation or the row cannot be located.
    pub fn apply_local_mutation(
        &mut self,
        generation: Generation,
        action: EditAction,
        row: Row,
        original_key: Option<&Value>,
        index_hint: Option<usize>,
    ) -> Option<usize> {
        if generation != self.generation {
            debug!("Skipping local {action:?} from {generation} (cache is at {})", self.generation);
            return None;
        }

        match action {
            EditAction::Create => {
                let shifted = std::mem::take(&mut self.rows);
                self.rows = shifted
                    .into_iter()
                    .map(|(index, row)| (index + 1, row))
                    .collect();
                self.rows.insert(0, row);
                self.row_count = self.row_count.map(|count| count + 1);
                self.evict();
                Some(0)
            }
            EditAction::Update => {
                let index = self.locate(original_key, index_hint)?;
                self.rows.insert(index, row);
                Some(index)
            }
            EditAction::Delete => {
                let index = self.locate(original_key, index_hint)?;
                self.rows.remove(&index);
                let tail = self.rows.split_off(&index);
                self.rows
                    .extend(tail.into_iter().map(|(i, row)| (i - 1, row)));
                self.row_count = self.row_count.map(|count| count.saturating_sub(1));
                Some(index)
            }
        }
    }

    fn locate(&self, key: Option<&Value>, hint: Option<usize>) -> Option<usize> {
        key.and_then(|key| self.index_of_key(key)).or(hint)
    }

    fn evict(&mut self) {
        while self.rows.len() > self.capacity {
            let (Some(first), Some(last)) = (
                self.rows.first_key_value().map(|(i, _)| *i),
                self.rows.last_key_value().map(|(i, _)| *i),
            ) else {
                break;
            };

            if self.focus.abs_diff(first) >= self.focus.abs_diff(last) {
                self.rows.pop_first();
            } else {
                self.rows.pop_last();
            }
        }
    }
}
