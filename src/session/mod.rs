// Session tracking module
// Provides minute-bucketed active-session tracking over a set-capable key-value store

pub mod store;
pub mod store_memory;
pub mod store_redis;
pub mod tracker;
pub mod types;

pub use store::SessionStore;
pub use store_memory::MemorySessionStore;
pub use store_redis::RedisSessionStore;
pub use tracker::SessionTracker;
pub use types::{FriendsOptions, TrackerConfig, BUCKET_TTL_SECS, DEFAULT_TIMESPAN_MINUTES};
