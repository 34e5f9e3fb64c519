//! Cache and fetch window configuration

/// Sizing of the row cache and of the windows requested from the source.
///
/// # Example
///
/// ```
/// use datatable_lib::cache::CacheConfig;
///
/// let config = CacheConfig::default()
///     .with_capacity(5_000)
///     .with_min_fetch_rows(100);
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of rows held; rows farthest from the latest window are
    /// evicted first.
    ///
    /// Default: 2000
    pub capacity: usize,

    /// Minimum number of rows requested per fetch.
    ///
    /// Default: 50
    pub min_fetch_rows: usize,

    /// Rows added on each side of the visible window when fetching.
    ///
    /// Default: 10
    pub overscan: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 2000,
            min_fetch_rows: 50,
            overscan: 10,
        }
    }
}

impl CacheConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the minimum fetch size.
    pub fn with_min_fetch_rows(mut self, rows: usize) -> Self {
        self.min_fetch_rows = rows;
        self
    }

    /// Sets the overscan.
    pub fn with_overscan(mut self, rows: usize) -> Self {
        self.overscan = rows;
        self
    }
}
