//! Strategy configuration.

use crate::time::Duration;

/// Which table serves redirected interests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubscriberMode {
    /// One entry per trace name, owned by the first pending interest that
    /// carried it.
    #[default]
    Single,
    /// Additionally fan later subscribers of a known trace into the in-record
    /// set of the entry's pending interest.
    Multi,
}

/// Per-instance tuning for [`TraceForwardingStrategy`](crate::TraceForwardingStrategy).
///
/// ```
/// use kitetrace::{Duration, StrategyConfig, SubscriberMode};
///
/// let config = StrategyConfig::default()
///     .with_trace_lifetime(Duration::from_secs(10))
///     .with_subscriber_mode(SubscriberMode::Multi);
/// assert_eq!(config.trace_lifetime, Some(Duration::from_secs(10)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyConfig {
    /// Independent lifetime for trace entries. `None` ties an entry to the
    /// expiry of its pending interest only.
    pub trace_lifetime: Option<Duration>,
    pub subscriber_mode: SubscriberMode,
    /// Expected table size, used to tune shrinking.
    pub table_capacity: usize,
}

/// Default expected trace table size.
pub const DEFAULT_TABLE_CAPACITY: usize = 256;

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            trace_lifetime: None,
            subscriber_mode: SubscriberMode::Single,
            table_capacity: DEFAULT_TABLE_CAPACITY,
        }
    }
}

impl StrategyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trace_lifetime(mut self, lifetime: Duration) -> Self {
        self.trace_lifetime = Some(lifetime);
        self
    }

    pub fn with_subscriber_mode(mut self, mode: SubscriberMode) -> Self {
        self.subscriber_mode = mode;
        self
    }

    pub fn with_table_capacity(mut self, capacity: usize) -> Self {
        self.table_capacity = capacity;
        self
    }
}
