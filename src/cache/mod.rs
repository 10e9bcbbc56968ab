//! Persistent caching with redb.
//!
//! Caches the decoded pool JSON per language so later runs can skip the
//! network fetch.

mod store;

pub use store::{CacheStats, CachedPool, PoolCache};
