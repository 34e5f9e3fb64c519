//! Navigation and windowed fetching against a slow source.
//!
//! Time is paused, so latencies are simulated and the tests run instantly.

mod common;

use std::time::Duration;

use common::harness;
use common::harness_with;
use common::grid_config;
use datatable_lib::cache::CacheConfig;
use datatable_lib::navigation::NavCommand;
use datatable_lib::source::MemorySource;

#[tokio::test(start_paused = true)]
async fn test_burst_navigation_does_not_stall() {
    let h = harness(1000, 3, 300, 20);
    h.table.refresh();

    for _ in 0..100 {
        h.table.navigate(NavCommand::Down);
    }

    // The active row moved before any read returned.
    assert_eq!(h.active_row(), 100);
    assert!(h.table.row(100).is_none());
    assert!(h.table.is_loading());

    h.table.settle().await;

    let active = h.table.active_cell().unwrap();
    assert_eq!(active.data_row_index, 100);
    assert_eq!(active.viewport_row_index, Some(19));
    assert_eq!(h.col0(100).as_deref(), Some("R100C0"));
    assert!(!h.table.is_loading());

    // Reads were issued per uncovered window, not per key press.
    assert!(h.source.request_count() <= 5, "{} reads", h.source.request_count());
}

#[tokio::test(start_paused = true)]
async fn test_navigation_before_first_read() {
    let h = harness(100, 1, 0, 20);
    assert_eq!(h.source.request_count(), 0);

    h.table.navigate(NavCommand::Down);
    h.table.settle().await;

    assert_eq!(h.source.request_count(), 1);
    assert_eq!(h.col0(1).as_deref(), Some("R1C0"));
}

#[tokio::test(start_paused = true)]
async fn test_last_issued_read_wins_on_overlap() {
    let h = harness_with(
        MemorySource::grid(100, 1),
        grid_config(1),
        20,
        CacheConfig::default().with_min_fetch_rows(1).with_overscan(0),
    );
    h.source
        .script_latencies([Duration::from_millis(300), Duration::from_millis(50)]);

    // A reads rows [0, 20) slowly.
    h.table.refresh();
    tokio::task::yield_now().await;

    h.table.scroll_to_row(10, None).unwrap();
    h.source.update_rows(|rows| {
        for row in rows.iter_mut() {
            row.insert("col0", "NEW");
        }
    });

    // B reads rows [10, 30) and answers first.
    h.viewport.set_offset(10);
    h.table.refresh();
    tokio::task::yield_now().await;

    let ranges: Vec<_> = h.source.requests().iter().map(|r| r.range()).collect();
    assert_eq!(ranges, vec![0..20, 10..30]);

    h.table.settle().await;

    // A landed after B but only where B made no claim.
    assert_eq!(h.col0(5).as_deref(), Some("R5C0"));
    assert_eq!(h.col0(9).as_deref(), Some("R9C0"));
    assert_eq!(h.col0(10).as_deref(), Some("NEW"));
    assert_eq!(h.col0(19).as_deref(), Some("NEW"));
    assert_eq!(h.col0(29).as_deref(), Some("NEW"));
}

#[tokio::test(start_paused = true)]
async fn test_short_read_learns_end_and_clamps() {
    let h = harness(30, 1, 100, 20);
    h.table.refresh();

    for _ in 0..3 {
        h.table.navigate(NavCommand::PageDown);
    }
    assert_eq!(h.active_row(), 60);

    h.table.settle().await;

    assert_eq!(h.table.row_count(), Some(30));
    assert_eq!(h.active_row(), 29);
    assert_eq!(h.col0(29).as_deref(), Some("R29C0"));

    // The end is known now, so End and Down stop at it.
    h.table.navigate(NavCommand::Home);
    assert_eq!(h.table.navigate(NavCommand::End), 29);
    assert_eq!(h.table.navigate(NavCommand::Down), 29);
}

#[tokio::test(start_paused = true)]
async fn test_page_size_follows_viewport_height() {
    let h = harness(100, 1, 0, 20);
    h.table.refresh();
    h.table.settle().await;

    assert_eq!(h.table.navigate(NavCommand::PageDown), 20);

    h.viewport.set_height(7);
    h.table.viewport_changed();
    assert_eq!(h.table.navigate(NavCommand::PageDown), 27);
    assert_eq!(h.table.navigate(NavCommand::PageUp), 20);
}

#[tokio::test(start_paused = true)]
async fn test_columns_move_with_left_and_right() {
    let h = harness(10, 2, 0, 5);
    h.table.refresh();
    h.table.settle().await;

    assert_eq!(h.table.active_cell().unwrap().data_column_name, "id");
    h.table.navigate(NavCommand::Right);
    h.table.navigate(NavCommand::Right);
    h.table.navigate(NavCommand::Right);
    assert_eq!(h.table.active_cell().unwrap().data_column_name, "col1");
    h.table.navigate(NavCommand::Left);
    assert_eq!(h.table.active_cell().unwrap().data_column_name, "col0");
}

#[tokio::test(start_paused = true)]
async fn test_empty_data_set_has_no_active_cell() {
    let h = harness(0, 2, 0, 10);
    h.table.refresh();
    h.table.settle().await;

    assert_eq!(h.table.row_count(), Some(0));
    assert!(h.table.active_cell().is_none());
    assert_eq!(h.table.navigate(NavCommand::Down), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_read_is_retried_on_next_navigation() {
    let h = harness(100, 1, 0, 20);
    h.source.set_fail_reads(true);
    h.table.refresh();
    h.table.settle().await;

    assert!(h.table.row(0).is_none());
    assert!(h.table.last_error().is_some());
    assert!(!h.table.is_loading());

    h.source.set_fail_reads(false);
    h.table.navigate(NavCommand::Down);
    h.table.settle().await;

    assert_eq!(h.col0(0).as_deref(), Some("R0C0"));
    assert!(h.table.last_error().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_reload_keeps_active_row() {
    let h = harness(100, 1, 0, 20);
    h.table.refresh();
    h.table.settle().await;
    h.table.scroll_to_row(12, Some("col0")).unwrap();

    let generation = h.table.generation();
    h.table.reload();
    assert_eq!(h.table.generation(), generation.next());
    assert_eq!(h.active_row(), 12);

    h.table.settle().await;
    assert_eq!(h.col0(12).as_deref(), Some("R12C0"));
}

#[tokio::test(start_paused = true)]
async fn test_dirty_flag_tracks_changes() {
    let h = harness(100, 1, 0, 20);
    assert!(h.table.is_dirty());
    h.table.clear_dirty();

    h.table.navigate(NavCommand::Down);
    assert!(h.table.is_dirty());
    h.table.clear_dirty();

    h.table.settle().await;
    assert!(h.table.is_dirty());
}
