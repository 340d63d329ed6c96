// Redis-backed session store implementation

use super::store::SessionStore;
use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands, RedisError};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Session store backed by Redis sets
///
/// SADD, SREM, SUNION, SUNIONSTORE, SINTER, DEL and EXPIRE are each
/// atomic on the Redis side, so concurrent trackers writing to the same
/// category do not need any coordination here.
pub struct RedisSessionStore {
    /// Redis connection pool
    conn: Arc<Mutex<MultiplexedConnection>>,
}

impl RedisSessionStore {
    /// Create a new Redis session store
    pub async fn new(redis_url: &str) -> Result<Self, RedisError> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_multiplexed_tokio_connection().await?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn set_add(&self, key: &str, member: &str) -> Result<(), String> {
        let mut conn = self.conn.lock().await;
        let _: () = conn
            .sadd(key, member)
            .await
            .map_err(|e| format!("Redis error: {}", e))?;
        Ok(())
    }

    async fn set_remove(&self, key: &str, member: &str) -> Result<(), String> {
        let mut conn = self.conn.lock().await;
        let _: () = conn
            .srem(key, member)
            .await
            .map_err(|e| format!("Redis error: {}", e))?;
        Ok(())
    }

    async fn set_union(&self, keys: &[String]) -> Result<Vec<String>, String> {
        let mut conn = self.conn.lock().await;
        let members: Vec<String> = conn
            .sunion(keys)
            .await
            .map_err(|e| format!("Redis error: {}", e))?;
        Ok(members)
    }

    async fn set_union_store(&self, dest: &str, keys: &[String]) -> Result<(), String> {
        let mut conn = self.conn.lock().await;
        let _: () = conn
            .sunionstore(dest, keys)
            .await
            .map_err(|e| format!("Redis error: {}", e))?;
        Ok(())
    }

    async fn set_intersect(&self, keys: &[String]) -> Result<Vec<String>, String> {
        let mut conn = self.conn.lock().await;
        let members: Vec<String> = conn
            .sinter(keys)
            .await
            .map_err(|e| format!("Redis error: {}", e))?;
        Ok(members)
    }

    async fn key_delete(&self, key: &str) -> Result<(), String> {
        let mut conn = self.conn.lock().await;
        let _: () = conn
            .del(key)
            .await
            .map_err(|e| format!("Redis error: {}", e))?;
        Ok(())
    }

    async fn key_expire(&self, key: &str, ttl_secs: i64) -> Result<(), String> {
        let mut conn = self.conn.lock().await;
        let _: () = conn
            .expire(key, ttl_secs)
            .await
            .map_err(|e| format!("Redis error: {}", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Note: These tests require a Redis instance running
    // Skip them in CI unless Redis is available

    #[tokio::test]
    #[ignore] // Remove this to run with a local Redis instance
    async fn test_redis_set_roundtrip() {
        let store = RedisSessionStore::new("redis://127.0.0.1/")
            .await
            .expect("Failed to connect to Redis");

        store.key_delete("test_sessions_a").await.unwrap();
        store.key_delete("test_sessions_b").await.unwrap();

        store.set_add("test_sessions_a", "s1").await.unwrap();
        store.set_add("test_sessions_a", "s2").await.unwrap();
        store.set_add("test_sessions_b", "s2").await.unwrap();
        store.set_add("test_sessions_b", "s3").await.unwrap();

        let mut members = store
            .set_union(&["test_sessions_a".to_string(), "test_sessions_b".to_string()])
            .await
            .unwrap();
        members.sort();
        assert_eq!(members, vec!["s1", "s2", "s3"]);

        store.set_remove("test_sessions_a", "s1").await.unwrap();
        let members = store
            .set_union(&["test_sessions_a".to_string()])
            .await
            .unwrap();
        assert_eq!(members, vec!["s2"]);

        // Clean up
        store.key_delete("test_sessions_a").await.unwrap();
        store.key_delete("test_sessions_b").await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Remove this to run with a local Redis instance
    async fn test_redis_union_store_and_intersect() {
        let store = RedisSessionStore::new("redis://127.0.0.1/")
            .await
            .expect("Failed to connect to Redis");

        store.set_add("test_active_1", "u1").await.unwrap();
        store.set_add("test_active_2", "u2").await.unwrap();
        store.set_add("test_friends", "u2").await.unwrap();

        store
            .set_union_store(
                "test_tmp",
                &["test_active_1".to_string(), "test_active_2".to_string()],
            )
            .await
            .unwrap();

        let common = store
            .set_intersect(&["test_tmp".to_string(), "test_friends".to_string()])
            .await
            .unwrap();
        assert_eq!(common, vec!["u2"]);

        // Clean up
        for key in ["test_active_1", "test_active_2", "test_friends", "test_tmp"] {
            store.key_delete(key).await.unwrap();
        }
    }
}
