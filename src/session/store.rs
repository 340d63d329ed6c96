// Storage abstraction over the key-value store's set primitives

use async_trait::async_trait;

/// Trait for session storage backends
///
/// Each method maps to a single atomic operation on the underlying
/// store; the tracker never requires a cross-operation transaction.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Add a member to the set stored at `key`, creating the set if absent
    async fn set_add(&self, key: &str, member: &str) -> Result<(), String>;

    /// Remove a member from the set stored at `key`
    async fn set_remove(&self, key: &str, member: &str) -> Result<(), String>;

    /// Return the distinct members of the union of the sets at `keys`
    async fn set_union(&self, keys: &[String]) -> Result<Vec<String>, String>;

    /// Store the union of the sets at `keys` into `dest`, overwriting it
    async fn set_union_store(&self, dest: &str, keys: &[String]) -> Result<(), String>;

    /// Return the members present in every set at `keys`
    async fn set_intersect(&self, keys: &[String]) -> Result<Vec<String>, String>;

    /// Delete `key` and its contents
    async fn key_delete(&self, key: &str) -> Result<(), String>;

    /// Set a time-to-live in seconds on an existing `key`
    async fn key_expire(&self, key: &str, ttl_secs: i64) -> Result<(), String>;
}
