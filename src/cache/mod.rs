pub mod key;
pub mod redis_cache;
pub mod sqlite;

use anyhow::{Result, bail};
use async_trait::async_trait;

pub use key::derive_key;
pub use redis_cache::RedisCache;
pub use sqlite::SqliteCache;

/// Where upload responses are remembered. Entries never expire on our side.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Short backend label for logs.
    fn backend(&self) -> &'static str;
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Open the store named by a connection URL.
///
/// `redis://` and `rediss://` connect to Redis. `sqlite:<path>` opens a
/// SQLite file; `sqlite::memory:` and `:memory:` are ephemeral.
pub async fn open(url: &str) -> Result<Box<dyn Cache>> {
    if url.starts_with("redis://") || url.starts_with("rediss://") {
        return Ok(Box::new(RedisCache::connect(url).await?));
    }
    if url == ":memory:" {
        return Ok(Box::new(SqliteCache::in_memory()?));
    }
    if let Some(path) = url.strip_prefix("sqlite:") {
        let path = path.strip_prefix("//").unwrap_or(path);
        if path.is_empty() {
            bail!("cache url {url:?} has no database path");
        }
        return Ok(Box::new(SqliteCache::open(path)?));
    }
    bail!("unsupported cache url {url:?} (expected redis://, rediss:// or sqlite:)")
}
