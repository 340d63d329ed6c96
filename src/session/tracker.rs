// Active-session tracking over sliding minute windows

use super::store::SessionStore;
use super::types::{FriendsOptions, TrackerConfig, BUCKET_TTL_SECS, DEFAULT_TIMESPAN_MINUTES};
use chrono::{DateTime, Duration, Timelike, Utc};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Tracks active sessions for one category (e.g. "customer",
/// "employee") in minute-of-hour buckets on the store
///
/// Each bucket is a set named `active_<category>_sessions_minute_<MM>`,
/// a fixed 60-slot ring reused every hour. Every write refreshes the
/// bucket's TTL so its contents are gone before the slot wraps around.
pub struct SessionTracker {
    category: String,
    store: Arc<dyn SessionStore>,
    propagate_errors: bool,
}

impl SessionTracker {
    /// Create a tracker for a category
    ///
    /// `config` accepts either a full `TrackerConfig` or a bare store
    /// handle, in which case errors are swallowed (the default policy).
    pub fn new(category: impl Into<String>, config: impl Into<TrackerConfig>) -> Self {
        let config = config.into();
        Self {
            category: category.into(),
            store: config.store,
            propagate_errors: config.propagate_errors,
        }
    }

    /// Record a session as active in the current minute bucket
    pub async fn track(&self, session_id: Option<&str>) -> Result<(), String> {
        self.track_at(session_id, Utc::now()).await
    }

    /// Record a session as active in the minute bucket of `time`
    ///
    /// A `None` session id issues no store operations. With error
    /// propagation off (the default) a store failure is logged and the
    /// call fails open.
    pub async fn track_at(
        &self,
        session_id: Option<&str>,
        time: DateTime<Utc>,
    ) -> Result<(), String> {
        let session_id = match session_id {
            Some(id) => id,
            None => return Ok(()),
        };

        let key = self.bucket_key(time);
        match self.write_bucket(&key, session_id).await {
            Err(e) if !self.propagate_errors => {
                warn!("Failed to track session in {}: {}", key, e);
                Ok(())
            }
            result => result,
        }
    }

    async fn write_bucket(&self, key: &str, session_id: &str) -> Result<(), String> {
        self.store.set_add(key, session_id).await?;
        self.store.key_expire(key, BUCKET_TTL_SECS).await?;
        debug!("Tracked session {} in {}", session_id, key);
        Ok(())
    }

    /// Count distinct sessions active within the default 5-minute window
    pub async fn active_users(&self) -> Result<usize, String> {
        self.active_users_at(DEFAULT_TIMESPAN_MINUTES, Utc::now())
            .await
    }

    /// Count distinct sessions active within the window of
    /// `timespan_in_minutes` buckets ending at `time`
    pub async fn active_users_at(
        &self,
        timespan_in_minutes: usize,
        time: DateTime<Utc>,
    ) -> Result<usize, String> {
        let members = self.active_users_data_at(timespan_in_minutes, time).await?;
        Ok(members.len())
    }

    /// The distinct session ids active within the default 5-minute window
    pub async fn active_users_data(&self) -> Result<Vec<String>, String> {
        self.active_users_data_at(DEFAULT_TIMESPAN_MINUTES, Utc::now())
            .await
    }

    /// The distinct session ids active within the window ending at `time`
    pub async fn active_users_data_at(
        &self,
        timespan_in_minutes: usize,
        time: DateTime<Utc>,
    ) -> Result<Vec<String>, String> {
        let keys = self.bucket_keys(timespan_in_minutes, time);
        self.store.set_union(&keys).await
    }

    /// Intersect the active-session window with an externally maintained
    /// friends set, returning the friends currently active
    ///
    /// The window is first union-stored under a random temporary key,
    /// which is deleted afterwards. The delete runs even when the
    /// intersect step fails; the intersect error then takes precedence
    /// in the returned result.
    pub async fn active_friends(
        &self,
        friend_set_key: &str,
        options: FriendsOptions,
    ) -> Result<Vec<String>, String> {
        let time = options.time.unwrap_or_else(Utc::now);
        let keys = self.bucket_keys(options.timespan_in_minutes, time);
        let tmp_key = self.random_key();

        self.store.set_union_store(&tmp_key, &keys).await?;
        let intersection = self
            .store
            .set_intersect(&[tmp_key.clone(), friend_set_key.to_string()])
            .await;
        let cleanup = self.store.key_delete(&tmp_key).await;

        let members = intersection?;
        cleanup?;
        Ok(members)
    }

    /// Remove a session id from every bucket in the window ending now
    pub async fn untrack(
        &self,
        session_id: &str,
        timespan_in_minutes: usize,
    ) -> Result<(), String> {
        self.untrack_at(session_id, timespan_in_minutes, Utc::now())
            .await
    }

    /// Remove a session id from every bucket in the window ending at
    /// `time`; buckets older than the window are untouched
    pub async fn untrack_at(
        &self,
        session_id: &str,
        timespan_in_minutes: usize,
        time: DateTime<Utc>,
    ) -> Result<(), String> {
        for key in self.bucket_keys(timespan_in_minutes, time) {
            self.store.set_remove(&key, session_id).await?;
        }

        debug!(
            "Untracked session {} from {} bucket(s)",
            session_id, timespan_in_minutes
        );
        Ok(())
    }

    /// Bucket key for the minute-of-hour of `time`; the hour is not part
    /// of the key
    fn bucket_key(&self, time: DateTime<Utc>) -> String {
        format!(
            "active_{}_sessions_minute_{:02}",
            self.category,
            time.minute()
        )
    }

    /// Bucket keys for the window ending at `time`, most recent first
    fn bucket_keys(&self, timespan_in_minutes: usize, time: DateTime<Utc>) -> Vec<String> {
        (0..timespan_in_minutes)
            .map(|offset| self.bucket_key(time - Duration::minutes(offset as i64)))
            .collect()
    }

    /// Collision resistance of the temporary key rests entirely on the
    /// randomness of the UUID; concurrent callers are not otherwise
    /// coordinated
    fn random_key(&self) -> String {
        format!("active_{}_sessions_tmp_{}", self.category, Uuid::new_v4())
    }
}
