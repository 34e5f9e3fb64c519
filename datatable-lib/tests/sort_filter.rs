//! Sort and filter changes invalidate the window and reset the cursor.

mod common;

use std::time::Duration;

use common::harness;
use common::harness_with;
use datatable_lib::error::TableError;
use datatable_lib::cache::CacheConfig;
use datatable_lib::config::ColumnConfig;
use datatable_lib::config::TableConfig;
use datatable_lib::error::ConfigError;
use datatable_lib::error::SortError;
use datatable_lib::navigation::NavCommand;
use datatable_lib::sort::SortKey;
use datatable_lib::source::MemorySource;

#[tokio::test(start_paused = true)]
async fn test_sort_change_starts_new_generation() {
    let h = harness(30, 1, 0, 20);
    h.table.refresh();
    h.table.settle().await;
    for _ in 0..5 {
        h.table.navigate(NavCommand::Down);
    }

    let generation = h.table.generation();
    h.table.set_sort(vec![SortKey::desc("id")]).unwrap();

    assert_eq!(h.table.generation(), generation.next());
    assert_eq!(h.active_row(), 0);
    assert_eq!(h.table.cached_rows(), 0);

    h.table.settle().await;

    let last = h.source.requests().pop().unwrap();
    assert_eq!(last.generation, generation.next());
    assert_eq!(last.sort_keys, vec![SortKey::desc("id")]);
    assert_eq!(h.col0(0).as_deref(), Some("R29C0"));
    assert_eq!(h.table.sort_keys(), vec![SortKey::desc("id")]);

    // Setting the same sequence again changes nothing.
    h.table.set_sort(vec![SortKey::desc("id")]).unwrap();
    assert_eq!(h.table.generation(), generation.next());
}

#[tokio::test(start_paused = true)]
async fn test_stale_read_is_dropped_after_sort() {
    let h = harness(30, 1, 200, 20);
    h.table.refresh();
    tokio::task::yield_now().await;

    h.table.set_sort(vec![SortKey::desc("id")]).unwrap();
    h.table.settle().await;

    // Only the sorted read landed.
    assert_eq!(h.col0(0).as_deref(), Some("R29C0"));
    assert_eq!(h.source.request_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_toggle_sort_cycles() {
    let h = harness(30, 1, 0, 20);
    h.table.refresh();
    h.table.settle().await;

    h.table.toggle_sort("col0").unwrap();
    assert_eq!(h.table.sort_keys(), vec![SortKey::asc("col0")]);
    h.table.toggle_sort("col0").unwrap();
    assert_eq!(h.table.sort_keys(), vec![SortKey::desc("col0")]);
    h.table.toggle_sort("col0").unwrap();
    assert!(h.table.sort_keys().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unsortable_column_is_refused() {
    let config = TableConfig::new("plain", "id")
        .with_column(ColumnConfig::new("id").sortable(true))
        .with_column(ColumnConfig::new("col0"));
    let h = harness_with(MemorySource::grid(10, 1), config, 20, CacheConfig::default());

    let err = h.table.set_sort(vec![SortKey::asc("col0")]).unwrap_err();
    assert!(matches!(err, TableError::Sort(SortError::NotSortable { .. })));
    assert!(h.table.sort_keys().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_filter_applies_after_debounce() {
    let h = harness(30, 1, 0, 20);
    h.table.refresh();
    h.table.settle().await;
    h.table.scroll_to_row(15, None).unwrap();

    let generation = h.table.generation();
    h.table.set_filter_term("R2").unwrap();
    assert_eq!(h.table.filter_term(), None);
    assert_eq!(h.table.generation(), generation);

    h.table.settle().await;

    assert_eq!(h.table.filter_term().as_deref(), Some("R2"));
    assert_eq!(h.table.generation(), generation.next());
    assert_eq!(h.active_row(), 0);
    assert_eq!(h.table.row_count(), Some(11));
    assert_eq!(h.col0(0).as_deref(), Some("R2C0"));
    assert_eq!(h.col0(1).as_deref(), Some("R20C0"));

    let last = h.source.requests().pop().unwrap();
    assert_eq!(last.filter_term.as_deref(), Some("R2"));
}

#[tokio::test(start_paused = true)]
async fn test_filter_keystrokes_collapse() {
    let h = harness(30, 1, 0, 20);
    h.table.refresh();
    h.table.settle().await;
    let generation = h.table.generation();

    h.table.set_filter_term("R").unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    h.table.set_filter_term("R2").unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    h.table.set_filter_term("R2C").unwrap();
    h.table.settle().await;

    assert_eq!(h.table.generation(), generation.next());
    assert_eq!(h.table.filter_term().as_deref(), Some("R2C"));

    let filtered: Vec<_> = h
        .source
        .requests()
        .into_iter()
        .filter_map(|r| r.filter_term)
        .collect();
    assert_eq!(filtered, vec!["R2C".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_filter_returning_to_applied_term_is_a_no_op() {
    let h = harness(30, 1, 0, 20);
    h.table.set_filter_term("R2").unwrap();
    h.table.settle().await;
    let generation = h.table.generation();

    h.table.set_filter_term("R3").unwrap();
    h.table.set_filter_term("R2").unwrap();
    h.table.settle().await;

    assert_eq!(h.table.generation(), generation);
    assert_eq!(h.table.filter_term().as_deref(), Some("R2"));
}

#[tokio::test(start_paused = true)]
async fn test_clearing_filter_shows_everything() {
    let h = harness(30, 1, 0, 20);
    h.table.set_filter_term("R2").unwrap();
    h.table.settle().await;
    assert_eq!(h.table.row_count(), Some(11));

    h.table.set_filter_term("").unwrap();
    h.table.settle().await;

    assert_eq!(h.table.filter_term(), None);
    assert_eq!(h.table.row_count(), Some(30));
}

#[tokio::test(start_paused = true)]
async fn test_filter_requires_filterable_table() {
    let config = TableConfig::new("plain", "id").with_columns(MemorySource::grid_columns(1));
    let h = harness_with(MemorySource::grid(10, 1), config, 20, CacheConfig::default());

    let err = h.table.set_filter_term("R").unwrap_err();
    assert!(matches!(err, TableError::Config(ConfigError::Disabled { .. })));
}
