//! Incremental find
//!
//! The controller decides where each search starts; the matching itself is
//! done by the [`FindSource`](crate::source::FindSource). Every plan carries
//! a sequence number so that only the answer to the latest search moves the
//! active cell.

use log::debug;
use serde::Serialize;

use crate::sort::SortKey;
use crate::source::FindDirection;

/// A search as passed to the [`FindSource`](crate::source::FindSource).
///
/// Carries the sort and filter the table shows when the search is planned,
/// so the source matches against the same order the row indices refer to,
/// even while the read for that order is still in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FindRequest {
    pub term: String,
    pub direction: FindDirection,
    /// With `Next`, the match must lie after this index; with `Previous`,
    /// before it. `None` searches from the respective end.
    pub from: Option<usize>,
    /// Configured column names, in display order.
    pub column_keys: Vec<String>,
    pub sort_keys: Vec<SortKey>,
    pub filter_term: Option<String>,
}

impl FindRequest {
    /// Builds the request for a plan.
    pub fn new(
        plan: &FindPlan,
        column_keys: Vec<String>,
        sort_keys: Vec<SortKey>,
        filter_term: Option<String>,
    ) -> Self {
        Self {
            term: plan.term.clone(),
            direction: plan.direction,
            from: plan.from,
            column_keys,
            sort_keys,
            filter_term,
        }
    }

    /// The same search for another plan of the same term, such as its
    /// wrapped retry.
    pub fn for_plan(&self, plan: &FindPlan) -> Self {
        Self {
            term: plan.term.clone(),
            direction: plan.direction,
            from: plan.from,
            ..self.clone()
        }
    }
}

/// One search to run against the find source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindPlan {
    seq: u64,
    pub term: String,
    pub direction: FindDirection,
    /// Passed to the source as the index to search from.
    pub from: Option<usize>,
    /// Retry once from the far end when nothing is found.
    pub wrap: bool,
}

impl FindPlan {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// The search to run when this one finds nothing and may wrap.
    pub fn wrapped(&self) -> Option<FindPlan> {
        self.wrap.then(|| FindPlan {
            seq: self.seq,
            term: self.term.clone(),
            direction: self.direction,
            from: None,
            wrap: false,
        })
    }
}

/// Find state: the term and the row it last matched.
#[derive(Debug, Default)]
pub struct FindController {
    term: String,
    last_match: Option<usize>,
    seq: u64,
}

impl FindController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn last_match(&self) -> Option<usize> {
        self.last_match
    }

    /// Changes the term while the active row is `current`.
    ///
    /// The search runs forward and includes the current row, so the cursor
    /// stays put while the row still matches, whether the term grew, shrank
    /// or was replaced. It does not wrap. An empty term clears the state and
    /// plans nothing.
    pub fn set_term(&mut self, term: &str, current: usize) -> Option<FindPlan> {
        if term == self.term {
            return None;
        }

        self.term = term.to_string();
        self.seq += 1;

        if term.is_empty() {
            self.last_match = None;
            return None;
        }

        // `Next` from `current - 1` is inclusive of `current`.
        let from = current.checked_sub(1);
        debug!("Find '{term}' from row {current}");

        Some(FindPlan {
            seq: self.seq,
            term: self.term.clone(),
            direction: FindDirection::Next,
            from,
            wrap: false,
        })
    }

    /// Plans a search strictly after or before `current`, wrapping once.
    pub fn step(&mut self, direction: FindDirection, current: usize) -> Option<FindPlan> {
        if self.term.is_empty() {
            return None;
        }
        self.seq += 1;

        Some(FindPlan {
            seq: self.seq,
            term: self.term.clone(),
            direction,
            from: Some(current),
            wrap: true,
        })
    }

    /// Returns `true` if `plan` is the latest search.
    pub fn is_current(&self, plan: &FindPlan) -> bool {
        plan.seq == self.seq
    }

    /// Records the answer to `plan`. Returns `false` for an outdated plan.
    pub fn record(&mut self, plan: &FindPlan, row_index: Option<usize>) -> bool {
        if !self.is_current(plan) {
            return false;
        }
        self.last_match = row_index;
        true
    }

    /// Invalidates any search in flight.
    pub fn cancel(&mut self) {
        self.seq += 1;
    }
}
