// Tracker configuration types

use super::store::SessionStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// TTL in seconds applied on every bucket write
///
/// Buckets are keyed by minute-of-hour only, so a bucket must expire
/// before the same minute slot comes around again the next hour.
pub const BUCKET_TTL_SECS: i64 = 60 * 59;

/// Window used by the aggregate queries when no timespan is given
pub const DEFAULT_TIMESPAN_MINUTES: usize = 5;

/// Tracker configuration
#[derive(Clone)]
pub struct TrackerConfig {
    /// Store the tracker issues set operations against
    pub store: Arc<dyn SessionStore>,
    /// Whether store failures during `track` are raised to the caller
    /// instead of being logged and swallowed
    pub propagate_errors: bool,
}

impl TrackerConfig {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            propagate_errors: false,
        }
    }

    pub fn propagate_errors(mut self, propagate: bool) -> Self {
        self.propagate_errors = propagate;
        self
    }
}

/// A bare store handle is accepted anywhere a config is expected
impl<S: SessionStore + 'static> From<Arc<S>> for TrackerConfig {
    fn from(store: Arc<S>) -> Self {
        Self::new(store)
    }
}

/// Options for `SessionTracker::active_friends`
#[derive(Debug, Clone)]
pub struct FriendsOptions {
    /// Number of minute buckets to walk backward through
    pub timespan_in_minutes: usize,
    /// Reference time; `None` means the current time
    pub time: Option<DateTime<Utc>>,
}

impl Default for FriendsOptions {
    fn default() -> Self {
        Self {
            timespan_in_minutes: DEFAULT_TIMESPAN_MINUTES,
            time: None,
        }
    }
}
