//! Fetch sequencing
//!
//! [`FetchCoordinator`] is the bookkeeping half of the fetch path: it numbers
//! requests, suppresses redundant ones and decides which part of a result may
//! still be merged when it arrives. Spawning the actual reads is left to the
//! [`DataTable`](crate::DataTable).
//!
//! Results are applied last-issued-wins: an index claimed by a later request
//! is never overwritten by an earlier one, whatever order the responses
//! arrive in. Cancellation is purely logical; superseded reads run to
//! completion and their results are dropped.

use std::ops::Range;

use log::debug;
use serde::Serialize;

use crate::model::Generation;
use crate::model::Row;
use crate::model::RowRange;
use crate::sort::SortKey;

/// A read of `count` rows starting at `start`, as passed to the
/// [`RowSource`](crate::source::RowSource).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchRequest {
    /// Sequence number assigned at issue time.
    pub seq: u64,
    /// Generation the request was issued under.
    pub generation: Generation,
    pub start: usize,
    pub count: usize,
    /// Configured column names.
    pub column_keys: Vec<String>,
    pub sort_keys: Vec<SortKey>,
    pub filter_term: Option<String>,
}

impl FetchRequest {
    /// Builds the request for an issued ticket.
    pub fn new(
        ticket: &FetchTicket,
        column_keys: Vec<String>,
        sort_keys: Vec<SortKey>,
        filter_term: Option<String>,
    ) -> Self {
        Self {
            seq: ticket.seq,
            generation: ticket.generation,
            start: ticket.start,
            count: ticket.count,
            column_keys,
            sort_keys,
            filter_term,
        }
    }

    /// Returns the requested index range.
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.count
    }
}

/// Handle for an issued request, returned to the coordinator on completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTicket {
    seq: u64,
    generation: Generation,
    start: usize,
    count: usize,
}

impl FetchTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.count
    }
}

/// The mergeable part of a completed read.
#[derive(Debug, Clone, PartialEq)]
pub struct Accepted {
    /// Row windows no later request claims.
    pub ranges: Vec<RowRange>,
    pub start: usize,
    pub requested: usize,
    /// Number of rows the source returned, before clipping.
    pub returned: usize,
}

#[derive(Debug, Clone)]
struct Entry {
    seq: u64,
    generation: Generation,
    range: Range<usize>,
    pending: bool,
    superseded: bool,
}

/// Tracks in-flight reads and arbitrates their results.
///
/// # Example
///
/// ```
/// use datatable_lib::fetch::FetchCoordinator;
/// use datatable_lib::model::{Generation, Row};
///
/// let g = Generation::INITIAL;
/// let mut fetches = FetchCoordinator::new();
/// let a = fetches.issue(g, 0..20).unwrap();
/// let b = fetches.issue(g, 10..30).unwrap();
///
/// // B resolves first and is applied in full.
/// let rows = |n: usize| (0..n).map(|_| Row::new()).collect::<Vec<_>>();
/// assert_eq!(fetches.complete(b, g, rows(20)).unwrap().ranges[0].span(), 10..30);
///
/// // A arrives later; only the part B does not claim survives.
/// let accepted = fetches.complete(a, g, rows(20)).unwrap();
/// assert_eq!(accepted.ranges[0].span(), 0..10);
/// ```
#[derive(Debug, Default)]
pub struct FetchCoordinator {
    next_seq: u64,
    entries: Vec<Entry>,
}

impl FetchCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a read of `range` under `generation`.
    ///
    /// Returns `None` when a pending, non-superseded request of the same
    /// generation already covers the whole range.
    pub fn issue(&mut self, generation: Generation, range: Range<usize>) -> Option<FetchTicket> {
        if range.is_empty() {
            return None;
        }

        let covered = self.entries.iter().any(|entry| {
            entry.pending
                && !entry.superseded
                && entry.generation == generation
                && entry.range.start <= range.start
                && entry.range.end >= range.end
        });
        if covered {
            debug!("Coalescing fetch {range:?} into an in-flight request");
            return None;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Entry {
            seq,
            generation,
            range: range.clone(),
            pending: true,
            superseded: false,
        });

        debug!("Issuing fetch #{seq} {range:?} ({generation})");
        Some(FetchTicket {
            seq,
            generation,
            start: range.start,
            count: range.len(),
        })
    }

    /// Returns the parts of `ranges` not covered by a pending request of
    /// `generation`.
    pub fn uncovered(&self, generation: Generation, ranges: &[Range<usize>]) -> Vec<Range<usize>> {
        let mut claimed: Vec<Range<usize>> = self
            .entries
            .iter()
            .filter(|e| e.pending && !e.superseded && e.generation == generation)
            .map(|e| e.range.clone())
            .collect();
        claimed.sort_by_key(|r| r.start);

        ranges
            .iter()
            .flat_map(|range| subtract(range.clone(), &claimed))
            .collect()
    }

    /// Returns `true` while any request is awaiting its result.
    pub fn has_pending(&self) -> bool {
        self.entries.iter().any(|e| e.pending)
    }

    /// Returns the number of requests awaiting their result.
    pub fn pending_count(&self) -> usize {
        self.entries.iter().filter(|e| e.pending).count()
    }

    /// Decides what part of a completed read may be merged.
    ///
    /// Returns `None` when the result is stale (generation changed), was
    /// superseded by a local edit, or belongs to an unknown ticket. Otherwise
    /// the rows are clipped to the indices no later-issued request claims.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        current: Generation,
        rows: Vec<Row>,
    ) -> Option<Accepted> {
        let position = self.entries.iter().position(|e| e.seq == ticket.seq)?;
        let entry = &mut self.entries[position];
        entry.pending = false;
        let superseded = entry.superseded;

        if ticket.generation != current || superseded {
            debug!(
                "Discarding fetch #{} {:?} ({}, current {current}, superseded: {superseded})",
                ticket.seq,
                ticket.range(),
                ticket.generation
            );
            self.entries.remove(position);
            self.prune();
            return None;
        }

        let returned = rows.len();
        let mut claimed: Vec<Range<usize>> = self
            .entries
            .iter()
            .filter(|e| e.seq > ticket.seq && e.generation == ticket.generation)
            .map(|e| e.range.clone())
            .collect();
        claimed.sort_by_key(|r| r.start);

        let span = ticket.start..ticket.start + returned;
        let keep = subtract(span, &claimed);
        if keep.iter().map(|part| part.len()).sum::<usize>() != returned {
            debug!(
                "Clipping fetch #{} {:?} to {keep:?}",
                ticket.seq,
                ticket.range()
            );
        }

        let mut ranges = Vec::with_capacity(keep.len());
        let mut rows = rows.into_iter();
        let mut offset = ticket.start;
        for part in keep {
            rows.by_ref().take(part.start - offset).for_each(drop);
            let piece: Vec<Row> = rows.by_ref().take(part.len()).collect();
            offset = part.end;
            ranges.push(RowRange::new(ticket.generation, part.start, piece));
        }

        self.prune();
        Some(Accepted {
            ranges,
            start: ticket.start,
            requested: ticket.count,
            returned,
        })
    }

    /// Forgets a failed request. It claims nothing, so earlier results
    /// overlapping it are merged in full.
    pub fn fail(&mut self, ticket: FetchTicket) {
        self.entries.retain(|e| e.seq != ticket.seq);
        self.prune();
    }

    /// Marks every in-flight request superseded; their results will be
    /// dropped.
    pub fn supersede_all(&mut self) {
        for entry in self.entries.iter_mut().filter(|e| e.pending) {
            entry.superseded = true;
        }
    }

    /// Forgets every request.
    pub fn invalidate(&mut self) {
        self.entries.clear();
    }

    /// Completed entries only matter to older pending requests.
    fn prune(&mut self) {
        let oldest_pending = self
            .entries
            .iter()
            .filter(|e| e.pending)
            .map(|e| e.seq)
            .min();

        self.entries.retain(|e| match oldest_pending {
            Some(oldest) => e.pending || e.seq > oldest,
            None => false,
        });
    }
}

/// `range` minus the union of `claimed`, which must be sorted by start.
fn subtract(range: Range<usize>, claimed: &[Range<usize>]) -> Vec<Range<usize>> {
    let mut parts = Vec::new();
    let mut cursor = range.start;
    for claim in claimed {
        if claim.end <= cursor || claim.is_empty() {
            continue;
        }
        if claim.start >= range.end {
            break;
        }
        if claim.start > cursor {
            parts.push(cursor..claim.start);
        }
        cursor = cursor.max(claim.end);
        if cursor >= range.end {
            break;
        }
    }
    if cursor < range.end {
        parts.push(cursor..range.end);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    const G: Generation = Generation::INITIAL;

    fn rows(range: Range<usize>) -> Vec<Row> {
        range.map(|r| Row::new().set("id", r)).collect()
    }

    fn spans(accepted: &Accepted) -> Vec<Range<usize>> {
        accepted.ranges.iter().map(|r| r.span()).collect()
    }

    #[test]
    fn test_last_issued_wins_when_later_resolves_first() {
        let mut fetches = FetchCoordinator::new();
        let a = fetches.issue(G, 0..20).unwrap();
        let b = fetches.issue(G, 10..30).unwrap();

        let accepted_b = fetches.complete(b, G, rows(10..30)).unwrap();
        assert_eq!(spans(&accepted_b), vec![10..30]);

        let accepted_a = fetches.complete(a, G, rows(0..20)).unwrap();
        assert_eq!(spans(&accepted_a), vec![0..10]);
        assert_eq!(accepted_a.ranges[0].rows()[9].get_i64("id").unwrap(), Some(9));
        assert_eq!(accepted_a.returned, 20);
    }

    #[test]
    fn test_last_issued_wins_when_earlier_resolves_first() {
        let mut fetches = FetchCoordinator::new();
        let a = fetches.issue(G, 0..20).unwrap();
        let b = fetches.issue(G, 10..30).unwrap();

        // A is clipped even though B has not answered yet.
        let accepted_a = fetches.complete(a, G, rows(0..20)).unwrap();
        assert_eq!(spans(&accepted_a), vec![0..10]);

        let accepted_b = fetches.complete(b, G, rows(10..30)).unwrap();
        assert_eq!(spans(&accepted_b), vec![10..30]);
    }

    #[test]
    fn test_failed_later_request_claims_nothing() {
        let mut fetches = FetchCoordinator::new();
        let a = fetches.issue(G, 0..20).unwrap();
        let b = fetches.issue(G, 10..30).unwrap();

        fetches.fail(b);
        let accepted = fetches.complete(a, G, rows(0..20)).unwrap();
        assert_eq!(spans(&accepted), vec![0..20]);
    }

    #[test]
    fn test_request_inside_pending_is_coalesced() {
        let mut fetches = FetchCoordinator::new();
        let a = fetches.issue(G, 0..30).unwrap();
        assert!(fetches.issue(G, 10..15).is_none());
        assert_eq!(fetches.pending_count(), 1);

        let accepted = fetches.complete(a, G, rows(0..30)).unwrap();
        assert_eq!(spans(&accepted), vec![0..30]);
    }

    #[test]
    fn test_subtract_middle_claim() {
        assert_eq!(subtract(0..30, &[10..15]), vec![0..10, 15..30]);
        assert_eq!(subtract(0..30, &[0..5, 10..15, 25..40]), vec![5..10, 15..25]);
        assert!(subtract(10..20, &[0..30]).is_empty());
    }

    #[test]
    fn test_stale_generation_discarded() {
        let mut fetches = FetchCoordinator::new();
        let a = fetches.issue(G, 0..20).unwrap();
        assert!(fetches.complete(a, G.next(), rows(0..20)).is_none());
        assert!(!fetches.has_pending());
    }

    #[test]
    fn test_superseded_discarded() {
        let mut fetches = FetchCoordinator::new();
        let a = fetches.issue(G, 0..20).unwrap();
        fetches.supersede_all();

        assert!(fetches.complete(a, G, rows(0..20)).is_none());

        // A superseded request no longer suppresses new ones.
        let mut fetches = FetchCoordinator::new();
        fetches.issue(G, 0..20).unwrap();
        fetches.supersede_all();
        assert!(fetches.issue(G, 0..20).is_some());
    }

    #[test]
    fn test_covered_request_coalesced() {
        let mut fetches = FetchCoordinator::new();
        fetches.issue(G, 0..50).unwrap();

        assert!(fetches.issue(G, 10..20).is_none());
        assert!(fetches.issue(G, 40..60).is_some());
        assert!(fetches.issue(G.next(), 10..20).is_some());
        assert_eq!(fetches.pending_count(), 3);
    }

    #[test]
    fn test_uncovered() {
        let mut fetches = FetchCoordinator::new();
        fetches.issue(G, 10..20).unwrap();
        fetches.issue(G, 30..40).unwrap();

        assert_eq!(fetches.uncovered(G, &[0..50]), vec![0..10, 20..30, 40..50]);
        assert_eq!(fetches.uncovered(G.next(), &[0..50]), vec![0..50]);
    }

    #[test]
    fn test_short_read_reports_extent() {
        let mut fetches = FetchCoordinator::new();
        let a = fetches.issue(G, 40..90).unwrap();
        let accepted = fetches.complete(a, G, rows(40..47)).unwrap();

        assert_eq!(spans(&accepted), vec![40..47]);
        assert_eq!(accepted.requested, 50);
        assert_eq!(accepted.returned, 7);
    }

    #[test]
    fn test_unknown_ticket_ignored() {
        let mut fetches = FetchCoordinator::new();
        let a = fetches.issue(G, 0..10).unwrap();
        fetches.invalidate();
        assert!(fetches.complete(a, G, rows(0..10)).is_none());
    }

    #[test]
    fn test_prune_keeps_claims_needed_by_older_requests() {
        let mut fetches = FetchCoordinator::new();
        let a = fetches.issue(G, 0..20).unwrap();
        let b = fetches.issue(G, 10..30).unwrap();
        let c = fetches.issue(G, 50..60).unwrap();

        fetches.complete(c, G, rows(50..60)).unwrap();
        fetches.complete(b, G, rows(10..30)).unwrap();

        let accepted = fetches.complete(a, G, rows(0..20)).unwrap();
        assert_eq!(spans(&accepted), vec![0..10]);
        assert!(!fetches.has_pending());
    }
}
