//! Response cache
//!
//! A moka-backed process-local cache for hot read paths (the public blog
//! listing). Values are stored as JSON so any serialisable type fits.
//!
//! ```rust,ignore
//! let cache = MemoryCache::with_ttl(Duration::from_secs(300));
//! cache.set("blogs:published", &posts, cache.default_ttl()).await?;
//! cache.delete_pattern("blogs:*").await?;
//! ```

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

pub use memory::MemoryCache;

/// Cache operations.
///
/// The generic methods make this trait unusable as `dyn`; callers hold the
/// concrete cache.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration)
        -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete every key matching a glob (`*` and `?`)
    async fn delete_pattern(&self, pattern: &str) -> Result<()>;

    async fn clear(&self) -> Result<()>;
}
