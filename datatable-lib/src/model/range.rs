//! Row windows and the generation token

use std::fmt;
use std::ops::Range;

use serde::Deserialize;
use serde::Serialize;

use super::Row;

/// Identifies one (sort, filter) configuration of the table.
///
/// Every fetch is tagged with the generation current at issue time, and every
/// cache mutation checks it. Changing sort keys or the filter term moves the
/// table to the next generation, which makes all older results stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Generation(u64);

impl Generation {
    /// The generation a freshly built table starts in.
    pub const INITIAL: Generation = Generation(0);

    /// Returns the generation following this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw counter value.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// A contiguous `[start, start + rows.len())` window of rows fetched under a
/// particular generation.
#[derive(Debug, Clone, PartialEq)]
pub struct RowRange {
    generation: Generation,
    start: usize,
    rows: Vec<Row>,
}

impl RowRange {
    /// Creates a new range.
    pub fn new(generation: Generation, start: usize, rows: Vec<Row>) -> Self {
        Self {
            generation,
            start,
            rows,
        }
    }

    /// Returns the generation the rows were fetched under.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Returns the absolute index of the first row.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Returns the absolute index one past the last row.
    pub fn end(&self) -> usize {
        self.start + self.rows.len()
    }

    /// Returns the covered index range.
    pub fn span(&self) -> Range<usize> {
        self.start..self.end()
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the range holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the rows.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Consumes the range, yielding `(absolute index, row)` pairs.
    pub fn into_indexed(self) -> impl Iterator<Item = (usize, Row)> {
        let start = self.start;
        self.rows
            .into_iter()
            .enumerate()
            .map(move |(offset, row)| (start + offset, row))
    }
}
