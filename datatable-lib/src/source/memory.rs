//! In-memory implementation of the data ports

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering as AtomicOrdering;
use std::time::Duration;

use async_trait::async_trait;

use super::EditAction;
use super::EditOutcome;
use super::FindDirection;
use super::FindMatch;
use super::FindSource;
use super::RowEditor;
use super::RowSource;
use crate::config::ColumnConfig;
use crate::error::SourceError;
use crate::fetch::FetchRequest;
use crate::find::FindRequest;
use crate::model::Row;
use crate::model::Value;
use crate::sort::Direction;
use crate::sort::SortKey;

/// A row source, row editor and find source over rows held in memory.
///
/// Sorting, filtering and find all happen here, never in the table. Reads
/// and writes can be delayed to simulate a remote backend, and reads can be
/// made to fail. Edits locate rows by the key column the source was
/// created with.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use datatable_lib::source::MemorySource;
///
/// // 1000 rows of "R{row}C{col}" text in 5 columns, 300 ms per call
/// let source = MemorySource::grid(1000, 5).with_latency(Duration::from_millis(300));
/// assert_eq!(source.len(), 1000);
/// ```
#[derive(Debug)]
pub struct MemorySource {
    key_column: String,
    rows: RwLock<Vec<Row>>,
    latency: Duration,
    scripted_latency: Mutex<VecDeque<Duration>>,
    fail_reads: AtomicBool,
    edit_rejection: Mutex<Option<String>>,
    requests: Mutex<Vec<FetchRequest>>,
    edits: Mutex<Vec<(EditAction, Row)>>,
}

impl MemorySource {
    /// Creates a source over `rows`, keyed by `key_column`.
    pub fn new(key_column: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            key_column: key_column.into(),
            rows: RwLock::new(rows),
            latency: Duration::ZERO,
            scripted_latency: Mutex::new(VecDeque::new()),
            fail_reads: AtomicBool::new(false),
            edit_rejection: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
            edits: Mutex::new(Vec::new()),
        }
    }

    /// Creates a synthetic grid: an integer `id` column plus `col0..colN`
    /// whose cells read `R{row}C{col}`.
    pub fn grid(rows: usize, cols: usize) -> Self {
        let data = (0..rows)
            .map(|r| {
                (0..cols).fold(Row::new().set("id", r), |row, c| {
                    row.set(format!("col{c}"), format!("R{r}C{c}"))
                })
            })
            .collect();
        Self::new("id", data)
    }

    /// Column definitions matching [`MemorySource::grid`].
    pub fn grid_columns(cols: usize) -> Vec<ColumnConfig> {
        std::iter::once(ColumnConfig::new("id").with_title("ID").sortable(true))
            .chain((0..cols).map(|c| {
                ColumnConfig::new(format!("col{c}"))
                    .with_title(format!("Column {c}"))
                    .sortable(true)
            }))
            .collect()
    }

    /// Delays every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queues per-call delays for upcoming reads, consumed in issue order.
    /// Reads beyond the script use the base latency.
    pub fn script_latencies(&self, delays: impl IntoIterator<Item = Duration>) {
        lock(&self.scripted_latency).extend(delays);
    }

    /// Makes subsequent reads fail (or succeed again).
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, AtomicOrdering::SeqCst);
    }

    /// Makes subsequent edits return a rejection with `message`.
    pub fn set_edit_rejection(&self, message: Option<String>) {
        *lock(&self.edit_rejection) = message;
    }

    /// Changes the held rows directly, as another client of a remote
    /// backend would.
    pub fn update_rows<F>(&self, f: F)
    where
        F: FnOnce(&mut Vec<Row>),
    {
        let mut rows = write(&self.rows);
        f(&mut rows);
    }

    /// Returns the number of rows held.
    pub fn len(&self) -> usize {
        read(&self.rows).len()
    }

    /// Returns `true` if the source holds no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns every read request received so far.
    pub fn requests(&self) -> Vec<FetchRequest> {
        lock(&self.requests).clone()
    }

    /// Returns the number of read requests received so far.
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Returns every edit applied so far.
    pub fn edits(&self) -> Vec<(EditAction, Row)> {
        lock(&self.edits).clone()
    }

    /// Returns the key column edits are matched on.
    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    /// Returns the rows filtered by `filter_term` over `column_keys` and
    /// sorted by `sort_keys`.
    fn ordered(
        &self,
        column_keys: &[String],
        sort_keys: &[SortKey],
        filter_term: Option<&str>,
    ) -> Vec<Row> {
        let mut rows: Vec<Row> = read(&self.rows)
            .iter()
            .filter(|row| match filter_term {
                Some(term) => row.matches(column_keys, term).is_some(),
                None => true,
            })
            .cloned()
            .collect();

        if !sort_keys.is_empty() {
            rows.sort_by(|a, b| compare_rows(a, b, sort_keys));
        }

        rows
    }

    fn position_of(rows: &[Row], key_column: &str, key: &Value) -> Option<usize> {
        rows.iter().position(|row| row.value(key_column) == key)
    }

    async fn delay(&self) {
        let delay = lock(&self.scripted_latency)
            .pop_front()
            .unwrap_or(self.latency);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

fn compare_rows(a: &Row, b: &Row, sort_keys: &[SortKey]) -> Ordering {
    sort_keys
        .iter()
        .map(|key| {
            let ordering = a.value(&key.key).sort_cmp(b.value(&key.key));
            match key.direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            }
        })
        .find(|ordering| *ordering != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl RowSource for MemorySource {
    async fn fetch_rows(&self, request: &FetchRequest) -> Result<Vec<Row>, SourceError> {
        lock(&self.requests).push(request.clone());

        // The answer is computed when the request arrives and delivered after
        // the delay, like a response in transit.
        let result = if self.fail_reads.load(AtomicOrdering::SeqCst) {
            Err(SourceError::new(format!(
                "read of rows {:?} failed",
                request.range()
            )))
        } else {
            let rows = self.ordered(
                &request.column_keys,
                &request.sort_keys,
                request.filter_term.as_deref(),
            );

            Ok(rows
                .into_iter()
                .skip(request.start)
                .take(request.count)
                .collect())
        };

        self.delay().await;
        result
    }
}

#[async_trait]
impl RowEditor for MemorySource {
    async fn edit_row(
        &self,
        action: EditAction,
        row: &Row,
        original: Option<&Row>,
        key_column: &str,
    ) -> Result<EditOutcome, SourceError> {
        if key_column != self.key_column {
            return Err(SourceError::new(format!(
                "rows are keyed by '{}', not '{key_column}'",
                self.key_column
            )));
        }
        let key_column = self.key_column.as_str();

        self.delay().await;

        if let Some(message) = lock(&self.edit_rejection).clone() {
            return Ok(EditOutcome::Rejected(message));
        }

        let key = row.value(key_column);
        let original_key = original.map(|o| o.value(key_column)).unwrap_or(key);

        {
            let mut rows = write(&self.rows);
            match action {
                EditAction::Create => {
                    if !key.is_null() && Self::position_of(&rows, key_column, key).is_some() {
                        return Ok(EditOutcome::rejected(format!("Duplicate key '{key}'")));
                    }
                    rows.insert(0, row.clone());
                }
                EditAction::Update => {
                    let Some(index) = Self::position_of(&rows, key_column, original_key) else {
                        return Ok(EditOutcome::rejected(format!("Row '{original_key}' not found")));
                    };
                    if key != original_key && Self::position_of(&rows, key_column, key).is_some() {
                        return Ok(EditOutcome::rejected(format!("Duplicate key '{key}'")));
                    }
                    rows[index] = row.clone();
                }
                EditAction::Delete => {
                    let Some(index) = Self::position_of(&rows, key_column, original_key) else {
                        return Ok(EditOutcome::rejected(format!("Row '{original_key}' not found")));
                    };
                    rows.remove(index);
                }
            }
        }

        lock(&self.edits).push((action, row.clone()));
        Ok(EditOutcome::Saved)
    }
}

#[async_trait]
impl FindSource for MemorySource {
    async fn find(&self, request: &FindRequest) -> Result<Option<FindMatch>, SourceError> {
        // Matched against the order the request names, not the last read.
        let rows = self.ordered(
            &request.column_keys,
            &request.sort_keys,
            request.filter_term.as_deref(),
        );
        let columns = if request.column_keys.is_empty() {
            let mut keys: Vec<String> = rows
                .first()
                .map(|row| row.fields().keys().cloned().collect())
                .unwrap_or_default();
            keys.sort();
            keys
        } else {
            request.column_keys.clone()
        };

        let term = request.term.as_str();
        let hit = |index: usize| {
            rows[index]
                .matches(&columns, term)
                .map(|column| FindMatch::new(index, column))
        };

        let found = match request.direction {
            FindDirection::Next => {
                let start = request.from.map(|f| f + 1).unwrap_or(0);
                (start..rows.len()).find_map(hit)
            }
            FindDirection::Previous => {
                let end = request.from.unwrap_or(rows.len()).min(rows.len());
                (0..end).rev().find_map(hit)
            }
        };

        self.delay().await;

        Ok(found)
    }
}
