//! Shared setup for the table integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use datatable_lib::DataTable;
use datatable_lib::cache::CacheConfig;
use datatable_lib::config::TableConfig;
use datatable_lib::config::TimingConfig;
use datatable_lib::source::HeadlessViewport;
use datatable_lib::source::MemorySource;

pub struct Harness {
    pub table: DataTable,
    pub source: Arc<MemorySource>,
    pub viewport: Arc<HeadlessViewport>,
}

impl Harness {
    /// Text of `col0` at `index`, if fetched.
    pub fn col0(&self, index: usize) -> Option<String> {
        self.table.cell_text(index, "col0").unwrap()
    }

    pub fn active_row(&self) -> usize {
        self.table.active_cell().unwrap().data_row_index
    }
}

/// Config for a [`MemorySource::grid`] with every feature enabled.
pub fn grid_config(cols: usize) -> TableConfig {
    TableConfig::new("grid", "id")
        .with_columns(MemorySource::grid_columns(cols))
        .filterable(true)
        .findable(true)
        .editable(true)
}

pub fn harness(rows: usize, cols: usize, latency_ms: u64, height: usize) -> Harness {
    harness_with(
        MemorySource::grid(rows, cols).with_latency(Duration::from_millis(latency_ms)),
        grid_config(cols),
        height,
        CacheConfig::default(),
    )
}

pub fn harness_with(
    source: MemorySource,
    config: TableConfig,
    height: usize,
    cache: CacheConfig,
) -> Harness {
    let source = Arc::new(source);
    let viewport = Arc::new(HeadlessViewport::new(height));
    let table = DataTable::builder(config)
        .source(source.clone())
        .editor(source.clone())
        .finder(source.clone())
        .viewport(viewport.clone())
        .timing(TimingConfig::default())
        .cache_config(cache)
        .build()
        .unwrap();

    Harness {
        table,
        source,
        viewport,
    }
}
