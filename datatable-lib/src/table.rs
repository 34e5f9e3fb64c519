//! The table orchestrator

use std::ops::Range;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use log::debug;
use log::info;
use log::warn;
use tokio::task::JoinHandle;

use crate::cache::CacheConfig;
use crate::cache::RangeCache;
use crate::config::TableConfig;
use crate::config::TimingConfig;
use crate::deferred::DeferredSlot;
use crate::deferred::SlotToken;
use crate::edit::EditPhase;
use crate::edit::EditSession;
use crate::edit::SaveOutcome;
use crate::error::ConfigError;
use crate::error::EditError;
use crate::error::Result;
use crate::error::SourceError;
use crate::fetch::FetchCoordinator;
use crate::fetch::FetchRequest;
use crate::fetch::FetchTicket;
use crate::filter::FilterModel;
use crate::find::FindController;
use crate::find::FindPlan;
use crate::find::FindRequest;
use crate::model::Generation;
use crate::model::Row;
use crate::model::Value;
use crate::navigation::ActiveCellInfo;
use crate::navigation::Extent;
use crate::navigation::NavCommand;
use crate::navigation::NavigationController;
use crate::notice::Notice;
use crate::notice::Notifier;
use crate::sort::SortKey;
use crate::sort::SortModel;
use crate::source::EditAction;
use crate::source::EditOutcome;
use crate::source::FindDirection;
use crate::source::FindSource;
use crate::source::RowEditor;
use crate::source::RowSource;
use crate::source::ScrollAlign;
use crate::source::Viewport;

/// A windowed view over an asynchronous row source.
///
/// The table keeps the rows around the viewport cached, moves the active
/// cell on keyboard commands without waiting for data, and coordinates sort,
/// filter, find and single-row edits against the source. Reads run as
/// spawned tasks, so the table must be used inside a tokio runtime.
///
/// The handle is cheap to clone; clones share the same state.
///
/// # Example
///
/// ```ignore
/// let source = Arc::new(MemorySource::grid(1000, 5));
/// let table = DataTable::builder(config)
///     .source(source.clone())
///     .finder(source)
///     .viewport(Arc::new(HeadlessViewport::new(20)))
///     .build()?;
///
/// table.refresh();
/// table.navigate(NavCommand::PageDown);
/// table.set_find_term("R42").await?;
/// ```
#[derive(Clone)]
pub struct DataTable {
    state: Arc<RwLock<TableState>>,
    ports: Arc<Ports>,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
    dirty: Arc<AtomicBool>,
}

struct Ports {
    source: Arc<dyn RowSource>,
    editor: Option<Arc<dyn RowEditor>>,
    finder: Option<Arc<dyn FindSource>>,
    viewport: Arc<dyn Viewport>,
}

struct TableState {
    config: TableConfig,
    timing: TimingConfig,
    cache_config: CacheConfig,
    generation: Generation,
    cache: RangeCache,
    fetches: FetchCoordinator,
    sort: SortModel,
    filter: FilterModel,
    filter_slot: DeferredSlot,
    find: FindController,
    nav: NavigationController,
    notifier: Notifier,
    edit: Option<EditSession>,
    last_error: Option<String>,
}

impl TableState {
    fn extent(&self) -> Extent {
        Extent {
            row_count: self.cache.row_count(),
            last_cached: self.cache.last_index(),
        }
    }

    fn fetch_request(&self, ticket: &FetchTicket) -> FetchRequest {
        FetchRequest::new(
            ticket,
            self.config.column_keys(),
            self.sort.keys().to_vec(),
            self.filter.applied().map(str::to_string),
        )
    }

    fn find_request(&self, plan: &FindPlan) -> FindRequest {
        FindRequest::new(
            plan,
            self.config.column_keys(),
            self.sort.keys().to_vec(),
            self.filter.applied().map(str::to_string),
        )
    }
}

impl DataTable {
    /// Creates a builder for a table with the given configuration.
    pub fn builder(config: TableConfig) -> DataTableBuilder<Missing, Missing> {
        DataTableBuilder::new(config)
    }

    fn read(&self) -> RwLockReadGuard<'_, TableState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TableState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::SeqCst);
    }

    fn track(&self, handle: JoinHandle<()>) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }

    /// Waits until every read and pending filter change has been applied.
    pub async fn settle(&self) {
        loop {
            let tasks = {
                let mut tracked = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
                std::mem::take(&mut *tracked)
            };
            if tasks.is_empty() {
                break;
            }
            futures::future::join_all(tasks).await;
        }
    }

    // -------------------------------------------------------------------------
    // Fetching
    // -------------------------------------------------------------------------

    /// The rows that should be cached: the visible rows and the active row,
    /// widened by the overscan and to at least the minimum fetch size.
    fn window(&self, state: &TableState) -> Range<usize> {
        let visible = self.ports.viewport.visible_range();
        let active = state.nav.row();
        let overscan = state.cache_config.overscan;

        let start = visible.start.min(active).saturating_sub(overscan);
        let min = state.cache_config.min_fetch_rows;
        let end = (visible.end.max(active + 1) + overscan).max(start + min);
        start..end
    }

    /// Issues a read for the part of the window that is neither cached nor
    /// already being fetched.
    fn ensure_window(&self, state: &mut TableState) {
        let window = self.window(state);
        state.cache.set_focus(state.nav.row());

        let missing = state.cache.missing(window);
        let uncovered = state.fetches.uncovered(state.generation, &missing);
        let (Some(first), Some(last)) = (uncovered.first(), uncovered.last()) else {
            return;
        };

        let min = state.cache_config.min_fetch_rows;
        let mut range = first.start..last.end.max(first.start + min);
        if let Some(count) = state.cache.row_count() {
            range.end = range.end.min(count);
            range.start = range.start.min(range.end.saturating_sub(min));
        }

        self.issue(state, range);
    }

    fn issue(&self, state: &mut TableState, range: Range<usize>) {
        let Some(ticket) = state.fetches.issue(state.generation, range) else {
            return;
        };
        let request = state.fetch_request(&ticket);

        let table = self.clone();
        let handle = tokio::spawn(async move {
            let result = table.ports.source.fetch_rows(&request).await;
            table.finish_fetch(ticket, result);
        });
        self.track(handle);
    }

    fn finish_fetch(
        &self,
        ticket: FetchTicket,
        result: std::result::Result<Vec<Row>, SourceError>,
    ) {
        let mut guard = self.write();
        let state = &mut *guard;

        match result {
            Err(err) => {
                warn!(
                    "Fetch #{} of rows {:?} from '{}' failed: {err}",
                    ticket.seq(),
                    ticket.range(),
                    state.config.name
                );
                state.fetches.fail(ticket);
                state.last_error = Some(err.to_string());
            }
            Ok(rows) => {
                let generation = state.generation;
                let Some(accepted) = state.fetches.complete(ticket, generation, rows) else {
                    return;
                };

                state.cache.observe_extent(
                    generation,
                    accepted.start,
                    accepted.requested,
                    accepted.returned,
                );
                for range in accepted.ranges {
                    debug!("Applying rows {:?} ({generation})", range.span());
                    state.cache.merge(range);
                }
                state.last_error = None;

                if let Some(count) = state.cache.row_count()
                    && state.nav.clamp_to(count)
                {
                    debug!("Active row clamped to {} (data set ends at {count})", state.nav.row());
                    self.ports.viewport.scroll_to_index(state.nav.row(), ScrollAlign::Auto);
                    self.ensure_window(state);
                }
            }
        }

        drop(guard);
        self.mark_dirty();
    }

    /// Moves to a new generation, dropping every cached row and every read
    /// in flight, and fetches the window again.
    fn invalidate(&self, state: &mut TableState, reset_active: bool) {
        state.generation = state.generation.next();
        debug!("'{}' moves to {}", state.config.name, state.generation);

        state.cache.invalidate_all(state.generation);
        state.fetches.invalidate();
        state.find.cancel();

        if reset_active {
            state.nav.reset();
            self.ports.viewport.scroll_to_index(0, ScrollAlign::Start);
        }
        self.ensure_window(state);
    }

    /// Re-reads the current window under the current generation. Rows are
    /// replaced as the answer arrives; nothing is dropped beforehand.
    pub fn refresh(&self) {
        let mut guard = self.write();
        let state = &mut *guard;
        let window = self.window(state);
        state.cache.set_focus(state.nav.row());
        self.issue(state, window);
    }

    /// Drops everything cached and reads the window again, keeping the
    /// active cell.
    pub fn reload(&self) {
        let mut guard = self.write();
        self.invalidate(&mut guard, false);
        drop(guard);
        self.mark_dirty();
    }

    /// Fetches whatever the viewport now shows, after it scrolled or resized
    /// on its own.
    pub fn viewport_changed(&self) {
        let mut guard = self.write();
        self.ensure_window(&mut guard);
    }

    // -------------------------------------------------------------------------
    // Data access
    // -------------------------------------------------------------------------

    /// Returns the row at `index`, if fetched.
    pub fn row(&self, index: usize) -> Option<Row> {
        self.read().cache.get(index).cloned()
    }

    /// Returns the formatted text of a cell, if its row is fetched.
    pub fn cell_text(&self, index: usize, column: &str) -> Result<Option<String>> {
        let state = self.read();
        let config = state.config.require_column(column)?;
        Ok(state.cache.get(index).map(|row| config.format(row.value(column))))
    }

    /// Returns the total row count once the end of the data is known.
    pub fn row_count(&self) -> Option<usize> {
        self.read().cache.row_count()
    }

    /// Returns the number of rows currently cached.
    pub fn cached_rows(&self) -> usize {
        self.read().cache.len()
    }

    pub fn generation(&self) -> Generation {
        self.read().generation
    }

    /// Returns `true` while reads are in flight.
    pub fn is_loading(&self) -> bool {
        self.read().fetches.has_pending()
    }

    pub fn config(&self) -> TableConfig {
        self.read().config.clone()
    }

    /// Message of the most recent failed read or find, cleared by the next
    /// successful read.
    pub fn last_error(&self) -> Option<String> {
        self.read().last_error.clone()
    }

    /// Returns the current transient notice.
    pub fn notice(&self) -> Option<Notice> {
        self.read().notifier.current().cloned()
    }

    /// Returns `true` if anything visible changed since the last
    /// [`clear_dirty`](Self::clear_dirty).
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    pub fn clear_dirty(&self) {
        self.dirty.store(false, Ordering::SeqCst);
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    /// Applies a keyboard command. The active row moves immediately, whether
    /// or not the target has been fetched. Returns the new row index.
    pub fn navigate(&self, command: NavCommand) -> usize {
        let mut guard = self.write();
        let state = &mut *guard;

        let mut page = self.ports.viewport.visible_row_count();
        if let Some(max) = state.config.max_visible_rows {
            page = page.min(max);
        }

        let extent = state.extent();
        let row = state.nav.apply(command, page, extent);
        self.ports.viewport.scroll_to_index(row, ScrollAlign::Auto);
        self.ensure_window(state);

        drop(guard);
        self.mark_dirty();
        row
    }

    /// Returns the active cell. `None` when the data set is known to be
    /// empty.
    pub fn active_cell(&self) -> Option<ActiveCellInfo> {
        let state = self.read();
        state
            .nav
            .info(self.ports.viewport.visible_range(), state.cache.row_count())
    }

    /// Makes `index` the active row, and optionally `column` the active
    /// column, scrolling it into view.
    pub fn scroll_to_row(&self, index: usize, column: Option<&str>) -> Result<usize> {
        let mut guard = self.write();
        let state = &mut *guard;

        if let Some(column) = column {
            state.nav.set_column(column)?;
        }
        let extent = state.extent();
        let row = state.nav.set_row(index, extent);
        self.ports.viewport.scroll_to_index(row, ScrollAlign::Auto);
        self.ensure_window(state);

        drop(guard);
        self.mark_dirty();
        Ok(row)
    }

    // -------------------------------------------------------------------------
    // Sort and filter
    // -------------------------------------------------------------------------

    /// Replaces the sort sequence. A change resets the active cell to the
    /// first row and refetches under a new generation.
    pub fn set_sort(&self, keys: Vec<SortKey>) -> Result<()> {
        let mut guard = self.write();
        let state = &mut *guard;

        if state.sort.set_sort(keys, &state.config.columns)? {
            info!("'{}' sorted by {:?}", state.config.name, state.sort.keys());
            self.invalidate(state, true);
            drop(guard);
            self.mark_dirty();
        }
        Ok(())
    }

    /// Cycles a column through ascending, descending and unsorted.
    pub fn toggle_sort(&self, key: &str) -> Result<()> {
        let mut guard = self.write();
        let state = &mut *guard;

        state.sort.toggle_column(key, &state.config.columns)?;
        info!("'{}' sorted by {:?}", state.config.name, state.sort.keys());
        self.invalidate(state, true);

        drop(guard);
        self.mark_dirty();
        Ok(())
    }

    pub fn sort_keys(&self) -> Vec<SortKey> {
        self.read().sort.keys().to_vec()
    }

    /// Sets the filter term. It applies once no other change has followed
    /// for the debounce period; applying it resets the active cell and
    /// refetches under a new generation.
    pub fn set_filter_term(&self, term: &str) -> Result<()> {
        let mut state = self.write();
        state.config.require(state.config.is_filterable, "filterable")?;

        if !state.filter.stage(term) {
            state.filter_slot.cancel();
            return Ok(());
        }

        let token = state.filter_slot.arm();
        let delay = state.timing.filter_debounce;
        drop(state);

        let table = self.clone();
        let handle = tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            table.commit_filter(token);
        });
        self.track(handle);
        Ok(())
    }

    fn commit_filter(&self, token: SlotToken) {
        let mut guard = self.write();
        let state = &mut *guard;

        if !state.filter_slot.fire(token) {
            return;
        }
        if let Some(term) = state.filter.commit() {
            info!("'{}' filtered by {term:?}", state.config.name);
            self.invalidate(state, true);
            drop(guard);
            self.mark_dirty();
        }
    }

    /// Returns the applied filter term.
    pub fn filter_term(&self) -> Option<String> {
        self.read().filter.applied().map(str::to_string)
    }

    // -------------------------------------------------------------------------
    // Find
    // -------------------------------------------------------------------------

    /// Changes the find term and moves to the first match at or after the
    /// active row.
    ///
    /// The active row is kept while it still matches. An empty term clears
    /// the find state without moving.
    pub async fn set_find_term(&self, term: &str) -> Result<()> {
        let plan = {
            let mut state = self.write();
            state.config.require(state.config.is_findable, "findable")?;
            let current = state.nav.row();
            state
                .find
                .set_term(term, current)
                .map(|plan| (state.find_request(&plan), plan))
        };

        match plan {
            Some((request, plan)) => self.run_find(plan, request).await,
            None => Ok(()),
        }
    }

    /// Moves to the next match after the active row, wrapping once.
    pub async fn find_next(&self) -> Result<()> {
        self.find_step(FindDirection::Next).await
    }

    /// Moves to the previous match before the active row, wrapping once.
    pub async fn find_previous(&self) -> Result<()> {
        self.find_step(FindDirection::Previous).await
    }

    pub fn find_term(&self) -> String {
        self.read().find.term().to_string()
    }

    async fn find_step(&self, direction: FindDirection) -> Result<()> {
        let plan = {
            let mut state = self.write();
            state.config.require(state.config.is_findable, "findable")?;
            let current = state.nav.row();
            state
                .find
                .step(direction, current)
                .map(|plan| (state.find_request(&plan), plan))
        };

        match plan {
            Some((request, plan)) => self.run_find(plan, request).await,
            None => Ok(()),
        }
    }

    async fn run_find(&self, plan: FindPlan, request: FindRequest) -> Result<()> {
        let finder = self
            .ports
            .finder
            .clone()
            .ok_or_else(|| self.missing_callback("findable", "find source"))?;
        let generation = self.generation();

        let mut result = finder.find(&request).await;
        let mut wrapped = false;
        if let Ok(None) = result
            && let Some(retry) = plan.wrapped()
        {
            let current = self.read().find.is_current(&plan);
            if !current {
                return Ok(());
            }
            result = finder.find(&request.for_plan(&retry)).await;
            wrapped = true;
        }

        let mut guard = self.write();
        let state = &mut *guard;
        if state.generation != generation || !state.find.is_current(&plan) {
            debug!("Dropping find result for '{}' (superseded)", plan.term);
            return Ok(());
        }

        match result {
            Err(err) => {
                warn!("Find '{}' in '{}' failed: {err}", plan.term, state.config.name);
                state.last_error = Some(err.to_string());
                return Err(err.into());
            }
            Ok(None) => {
                debug!("Find '{}' matched nothing", plan.term);
                state.find.record(&plan, None);
                self.show_notice(state, Notice::NotFound { term: plan.term.clone() });
            }
            Ok(Some(hit)) => {
                debug!(
                    "Find '{}' matched row {} ({:?})",
                    plan.term, hit.row_index, hit.column_name
                );
                state.find.record(&plan, Some(hit.row_index));
                if wrapped {
                    self.show_notice(state, Notice::Wrapped { term: plan.term.clone() });
                }

                let extent = state.extent();
                let row = state.nav.set_row(hit.row_index, extent);
                if let Some(column) = &hit.column_name
                    && state.nav.set_column(column).is_err()
                {
                    debug!("Find matched unconfigured column '{column}'");
                }
                self.ports.viewport.scroll_to_index(row, ScrollAlign::Auto);
                self.ensure_window(state);
            }
        }

        drop(guard);
        self.mark_dirty();
        Ok(())
    }

    fn show_notice(&self, state: &mut TableState, notice: Notice) {
        let token = state.notifier.show(notice);
        let ttl = state.timing.notice_ttl;

        let table = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if table.write().notifier.expire(token) {
                table.mark_dirty();
            }
        });
    }

    // -------------------------------------------------------------------------
    // Editing
    // -------------------------------------------------------------------------

    /// Opens the active row for editing.
    pub fn begin_edit(&self) -> Result<()> {
        let row = self.read().nav.row();
        self.begin_edit_at(row)
    }

    /// Opens the row at `index` for editing. The row must be fetched.
    pub fn begin_edit_at(&self, index: usize) -> Result<()> {
        self.open_session(|state| {
            let row = state.cache.get(index).cloned().ok_or(EditError::RowNotLoaded { index })?;
            Ok(EditSession::begin_update(row, index, state.generation))
        })
    }

    /// Opens an empty row for creation.
    pub fn begin_create(&self) -> Result<()> {
        self.open_session(|state| {
            Ok(EditSession::begin_create(
                &state.config.columns,
                state.generation,
            ))
        })
    }

    /// Opens the active row for deletion.
    pub fn begin_delete(&self) -> Result<()> {
        self.open_session(|state| {
            let index = state.nav.row();
            let row = state.cache.get(index).cloned().ok_or(EditError::RowNotLoaded { index })?;
            Ok(EditSession::begin_delete(row, index, state.generation))
        })
    }

    fn open_session<F>(&self, open: F) -> Result<()>
    where
        F: FnOnce(&TableState) -> Result<EditSession>,
    {
        let mut state = self.write();
        state.config.require(state.config.is_editable, "editable")?;
        if state.edit.is_some() {
            return Err(EditError::SessionOpen.into());
        }

        let session = open(&*state)?;
        debug!(
            "Opened {:?} session on '{}' at {:?}",
            session.mode(),
            state.config.name,
            session.row_index()
        );
        state.edit = Some(session);
        drop(state);
        self.mark_dirty();
        Ok(())
    }

    fn with_session<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut EditSession, &TableConfig) -> Result<T>,
    {
        let mut guard = self.write();
        let state = &mut *guard;
        let session = state.edit.as_mut().ok_or(EditError::NoSession)?;
        let result = f(session, &state.config);
        drop(guard);
        self.mark_dirty();
        result
    }

    /// Changes a field of the row being edited.
    pub fn set_field(&self, field: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        self.with_session(|session, config| {
            config.require_column(field)?;
            Ok(session.set_field(field, value)?)
        })
    }

    /// Validates a field, as when it loses focus. Returns its errors.
    pub fn blur_field(&self, field: &str) -> Result<Vec<String>> {
        self.with_session(|session, config| {
            let column = config.require_column(field)?;
            Ok(session.blur_field(column)?.to_vec())
        })
    }

    /// Opens the delete confirmation for the row being edited.
    pub fn request_delete(&self) -> Result<()> {
        self.with_session(|session, _| Ok(session.request_delete()?))
    }

    /// Backs out of the delete confirmation.
    pub fn cancel_delete(&self) -> Result<()> {
        self.with_session(|session, _| Ok(session.cancel_delete()?))
    }

    /// Discards the session and its working row. A session that is saving
    /// cannot be cancelled.
    pub fn cancel_edit(&self) -> Result<()> {
        let mut state = self.write();
        let phase = state
            .edit
            .as_ref()
            .map(EditSession::phase)
            .ok_or(EditError::NoSession)?;
        if phase == EditPhase::Saving {
            return Err(EditError::InvalidPhase {
                operation: "cancel",
                phase,
            }
            .into());
        }
        state.edit = None;
        drop(state);
        self.mark_dirty();
        Ok(())
    }

    /// Returns a snapshot of the open session.
    pub fn edit_session(&self) -> Option<EditSession> {
        self.read().edit.clone()
    }

    /// Saves the session with its own action: update for an edit, create for
    /// a new row.
    pub async fn save(&self) -> Result<SaveOutcome> {
        let action = self
            .read()
            .edit
            .as_ref()
            .map(|session| session.mode())
            .ok_or(EditError::NoSession)?;
        self.commit(action).await
    }

    /// Saves the working row as a new row.
    pub async fn save_as_new(&self) -> Result<SaveOutcome> {
        self.commit(EditAction::Create).await
    }

    /// Deletes the row after [`request_delete`](Self::request_delete).
    pub async fn confirm_delete(&self) -> Result<SaveOutcome> {
        self.commit(EditAction::Delete).await
    }

    async fn commit(&self, action: EditAction) -> Result<SaveOutcome> {
        let editor = self.ports.editor.clone().ok_or(EditError::NoEditor)?;

        let commit = {
            let mut guard = self.write();
            let state = &mut *guard;
            let session = state.edit.as_mut().ok_or(EditError::NoSession)?;
            session.prepare_save(action, &state.config)?
        };
        let Some(commit) = commit else {
            self.mark_dirty();
            return Ok(SaveOutcome::Blocked);
        };

        let result: std::result::Result<EditOutcome, SourceError> = editor
            .edit_row(commit.action, &commit.row, commit.original.as_ref(), &commit.key_column)
            .await;

        let mut guard = self.write();
        let state = &mut *guard;
        let session = state.edit.as_mut().ok_or(EditError::NoSession)?;
        let outcome = session.finish(result);

        match &outcome {
            SaveOutcome::Saved => {
                info!("Saved {:?} on '{}'", commit.action, state.config.name);
                state.edit = None;
                state.fetches.supersede_all();

                let applied = state.cache.apply_local_mutation(
                    commit.generation,
                    commit.action,
                    commit.row.clone(),
                    commit.original_key(),
                    commit.row_index,
                );
                if applied.is_none() {
                    debug!("Saved row belongs to {}; left to the next read", commit.generation);
                }

                let extent = state.extent();
                match commit.action {
                    EditAction::Create => {
                        state.nav.set_row(0, extent);
                    }
                    EditAction::Delete => {
                        if let Some(count) = extent.row_count {
                            state.nav.clamp_to(count);
                        }
                    }
                    EditAction::Update => {}
                }
                self.ports.viewport.scroll_to_index(state.nav.row(), ScrollAlign::Auto);
                self.ensure_window(state);
            }
            SaveOutcome::Rejected(message) => {
                warn!("{:?} on '{}' rejected: {message}", commit.action, state.config.name);
            }
            SaveOutcome::Blocked => {}
        }

        drop(guard);
        self.mark_dirty();
        Ok(outcome)
    }

    fn missing_callback(&self, feature: &'static str, callback: &'static str) -> ConfigError {
        ConfigError::MissingCallback {
            table: self.read().config.name.clone(),
            feature,
            callback,
        }
    }
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<T>(T);

/// Builder for a [`DataTable`].
///
/// The row source and the viewport are required; the builder only offers
/// [`build`](DataTableBuilder::build) once both are set. The row editor is
/// required by editable tables and the find source by findable ones, which
/// `build` checks.
pub struct DataTableBuilder<Source, View> {
    config: TableConfig,
    source: Source,
    viewport: View,
    editor: Option<Arc<dyn RowEditor>>,
    finder: Option<Arc<dyn FindSource>>,
    timing: TimingConfig,
    cache: CacheConfig,
}

impl DataTableBuilder<Missing, Missing> {
    /// Creates a builder with default timing and cache settings.
    pub fn new(config: TableConfig) -> Self {
        Self {
            config,
            source: Missing,
            viewport: Missing,
            editor: None,
            finder: None,
            timing: TimingConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl<V> DataTableBuilder<Missing, V> {
    /// Sets the row source.
    pub fn source<T: RowSource + 'static>(
        self,
        source: Arc<T>,
    ) -> DataTableBuilder<Set<Arc<dyn RowSource>>, V> {
        DataTableBuilder {
            config: self.config,
            source: Set(source as Arc<dyn RowSource>),
            viewport: self.viewport,
            editor: self.editor,
            finder: self.finder,
            timing: self.timing,
            cache: self.cache,
        }
    }
}

impl<S> DataTableBuilder<S, Missing> {
    /// Sets the viewport.
    pub fn viewport<T: Viewport + 'static>(
        self,
        viewport: Arc<T>,
    ) -> DataTableBuilder<S, Set<Arc<dyn Viewport>>> {
        DataTableBuilder {
            config: self.config,
            source: self.source,
            viewport: Set(viewport as Arc<dyn Viewport>),
            editor: self.editor,
            finder: self.finder,
            timing: self.timing,
            cache: self.cache,
        }
    }
}

impl<S, V> DataTableBuilder<S, V> {
    /// Sets the row edit callback.
    pub fn editor<T: RowEditor + 'static>(mut self, editor: Arc<T>) -> Self {
        self.editor = Some(editor as Arc<dyn RowEditor>);
        self
    }

    /// Sets the find callback.
    pub fn finder<T: FindSource + 'static>(mut self, finder: Arc<T>) -> Self {
        self.finder = Some(finder as Arc<dyn FindSource>);
        self
    }

    /// Sets the debounce and notice timing.
    pub fn timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Sets the cache and fetch window sizing.
    pub fn cache_config(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }
}

impl DataTableBuilder<Set<Arc<dyn RowSource>>, Set<Arc<dyn Viewport>>> {
    /// Validates the configuration and builds the table. No rows are read
    /// until the first [`refresh`](DataTable::refresh) or navigation.
    pub fn build(self) -> Result<DataTable> {
        let config = self.config;
        config.validate()?;

        let required = [
            (config.is_editable, self.editor.is_some(), "editable", "row editor"),
            (config.is_findable, self.finder.is_some(), "findable", "find source"),
        ];
        for (enabled, present, feature, callback) in required {
            if enabled && !present {
                return Err(ConfigError::MissingCallback {
                    table: config.name.clone(),
                    feature,
                    callback,
                }
                .into());
            }
        }

        let state = TableState {
            generation: Generation::INITIAL,
            cache: RangeCache::new(config.key_column.clone(), self.cache.capacity),
            fetches: FetchCoordinator::new(),
            sort: SortModel::new(),
            filter: FilterModel::new(),
            filter_slot: DeferredSlot::new(),
            find: FindController::new(),
            nav: NavigationController::new(config.column_keys()),
            notifier: Notifier::new(),
            edit: None,
            last_error: None,
            timing: self.timing,
            cache_config: self.cache,
            config,
        };

        Ok(DataTable {
            state: Arc::new(RwLock::new(state)),
            ports: Arc::new(Ports {
                source: self.source.0,
                editor: self.editor,
                finder: self.finder,
                viewport: self.viewport.0,
            }),
            tasks: Arc::new(Mutex::new(Vec::new())),
            dirty: Arc::new(AtomicBool::new(true)),
        })
    }
}
