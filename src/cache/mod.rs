//! Read-path cache.
//!
//! A process-external key/value store holds already-serialized results for
//! the two expensive aggregates (popular posts, popular tags) with a fixed
//! TTL. The cache is strictly an accelerator:
//!
//! - entries are plain serialized data, never live database rows;
//! - every backend failure is logged and falls back to direct computation
//!   (fail-open);
//! - simultaneous misses may both recompute and overwrite each other's entry
//!   (last-write-wins), and stale reads within the TTL are correct behavior.
//!
//! The cache handle is injected into the services that use it; nothing here
//! is process-global.

mod keys;
mod memory;
mod redis;
mod store;

pub use keys::{DEFAULT_TTL, POPULAR_POSTS_KEY, POPULAR_TAGS_KEY};
pub use memory::InMemoryCache;
pub use redis::RedisCache;
pub use store::{CacheError, ReadCache, get_or_compute};
