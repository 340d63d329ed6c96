// In-memory session store implementation

use super::store::SessionStore;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory session store
///
/// Mirrors the Redis set semantics closely enough to stand in for
/// `RedisSessionStore` in tests and single-process deployments: missing
/// keys behave as empty sets, sets that become empty are dropped, and
/// a union-store overwrites the destination and clears its TTL.
/// Expiry is enforced lazily on access rather than by a background
/// sweep.
pub struct MemorySessionStore {
    /// Named sets of session ids
    sets: Arc<RwLock<HashMap<String, HashSet<String>>>>,
    /// Absolute expiry deadlines for keys with a TTL
    deadlines: Arc<RwLock<HashMap<String, DateTime<Utc>>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            sets: Arc::new(RwLock::new(HashMap::new())),
            deadlines: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Drop every key whose deadline has passed
    async fn purge_expired(&self) {
        let now = Utc::now();

        let expired: Vec<String> = {
            let deadlines = self.deadlines.read().await;
            deadlines
                .iter()
                .filter(|(_, deadline)| **deadline <= now)
                .map(|(key, _)| key.clone())
                .collect()
        };

        if expired.is_empty() {
            return;
        }

        {
            let mut deadlines = self.deadlines.write().await;
            for key in &expired {
                deadlines.remove(key);
            }
        }

        let mut sets = self.sets.write().await;
        for key in &expired {
            sets.remove(key);
            debug!("Expired session bucket {}", key);
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn set_add(&self, key: &str, member: &str) -> Result<(), String> {
        self.purge_expired().await;
        let mut sets = self.sets.write().await;
        sets.entry(key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn set_remove(&self, key: &str, member: &str) -> Result<(), String> {
        self.purge_expired().await;

        let emptied = {
            let mut sets = self.sets.write().await;
            match sets.get_mut(key) {
                Some(set) => {
                    set.remove(member);
                    if set.is_empty() {
                        sets.remove(key);
                        true
                    } else {
                        false
                    }
                }
                None => false,
            }
        };

        // A set removed for becoming empty takes its TTL with it
        if emptied {
            self.deadlines.write().await.remove(key);
        }

        Ok(())
    }

    async fn set_union(&self, keys: &[String]) -> Result<Vec<String>, String> {
        self.purge_expired().await;
        let sets = self.sets.read().await;

        let mut members = HashSet::new();
        for key in keys {
            if let Some(set) = sets.get(key) {
                members.extend(set.iter().cloned());
            }
        }

        Ok(members.into_iter().collect())
    }

    async fn set_union_store(&self, dest: &str, keys: &[String]) -> Result<(), String> {
        self.purge_expired().await;

        {
            let mut sets = self.sets.write().await;

            let mut members = HashSet::new();
            for key in keys {
                if let Some(set) = sets.get(key) {
                    members.extend(set.iter().cloned());
                }
            }

            // The destination is overwritten, matching SUNIONSTORE; an
            // empty union deletes it.
            if members.is_empty() {
                sets.remove(dest);
            } else {
                sets.insert(dest.to_string(), members);
            }
        }

        // The rewritten destination loses any previous TTL
        self.deadlines.write().await.remove(dest);

        Ok(())
    }

    async fn set_intersect(&self, keys: &[String]) -> Result<Vec<String>, String> {
        self.purge_expired().await;
        let sets = self.sets.read().await;

        let mut iter = keys.iter();
        let mut members: HashSet<String> = match iter.next() {
            Some(key) => match sets.get(key) {
                Some(set) => set.clone(),
                None => return Ok(Vec::new()),
            },
            None => return Ok(Vec::new()),
        };

        for key in iter {
            match sets.get(key) {
                Some(set) => members.retain(|m| set.contains(m)),
                None => return Ok(Vec::new()),
            }
        }

        Ok(members.into_iter().collect())
    }

    async fn key_delete(&self, key: &str) -> Result<(), String> {
        self.sets.write().await.remove(key);
        self.deadlines.write().await.remove(key);
        Ok(())
    }

    async fn key_expire(&self, key: &str, ttl_secs: i64) -> Result<(), String> {
        self.purge_expired().await;

        // EXPIRE on a missing key is a no-op
        let exists = self.sets.read().await.contains_key(key);
        if exists {
            self.deadlines
                .write()
                .await
                .insert(key.to_string(), Utc::now() + Duration::seconds(ttl_secs));
        }

        Ok(())
    }
}
