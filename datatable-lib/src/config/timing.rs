//! Timing configuration for deferred work.

use std::time::Duration;

/// Delays for the table's single-slot deferred tasks.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use datatable_lib::config::TimingConfig;
///
/// let timing = TimingConfig::default()
///     .filter_debounce(Duration::from_millis(150))
///     .notice_ttl(Duration::from_secs(2));
/// ```
#[derive(Debug, Clone)]
pub struct TimingConfig {
    /// Quiet period after the last filter keystroke before the filter applies.
    ///
    /// Default: 300 ms
    pub filter_debounce: Duration,

    /// How long a transient notice ("not found") stays visible.
    ///
    /// Default: 1 second
    pub notice_ttl: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            filter_debounce: Duration::from_millis(300),
            notice_ttl: Duration::from_secs(1),
        }
    }
}

impl TimingConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filter debounce.
    pub fn filter_debounce(mut self, delay: Duration) -> Self {
        self.filter_debounce = delay;
        self
    }

    /// Sets the notice lifetime.
    pub fn notice_ttl(mut self, ttl: Duration) -> Self {
        self.notice_ttl = ttl;
        self
    }

    /// Applies filters and expires notices immediately.
    pub fn immediate() -> Self {
        Self {
            filter_debounce: Duration::ZERO,
            notice_ttl: Duration::ZERO,
        }
    }
}
