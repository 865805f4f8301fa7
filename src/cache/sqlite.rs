//! Key-value cache backed by SQLite, for single-node deployments and tests.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension};
use std::sync::{Mutex, MutexGuard};

use super::Cache;

pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Open or create the cache table in the given database.
    /// Use `":memory:"` for tests.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).context("failed to open cache database")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS cache (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
        )
        .context("failed to create cache table")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("cache connection lock poisoned"))
    }
}

#[async_trait]
impl Cache for SqliteCache {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let value: Option<String> = conn
            .query_row("SELECT value FROM cache WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO cache (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mem_cache() -> SqliteCache {
        SqliteCache::in_memory().unwrap()
    }

    #[tokio::test]
    async fn get_returns_none_for_missing_key() {
        let cache = mem_cache();
        assert!(cache.get("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_and_get() {
        let cache = mem_cache();
        cache.set("Z4OjHqv2jMwGYPk1", "{\"uuid\":\"abc\"}").await.unwrap();
        assert_eq!(
            cache.get("Z4OjHqv2jMwGYPk1").await.unwrap().unwrap(),
            "{\"uuid\":\"abc\"}"
        );
    }

    #[tokio::test]
    async fn set_overwrites_existing() {
        let cache = mem_cache();
        cache.set("key", "old").await.unwrap();
        cache.set("key", "new").await.unwrap();
        assert_eq!(cache.get("key").await.unwrap().unwrap(), "new");
    }

    #[tokio::test]
    async fn multiple_keys_independent() {
        let cache = mem_cache();
        cache.set("one", "1").await.unwrap();
        cache.set("two", "2").await.unwrap();

        assert_eq!(cache.get("one").await.unwrap().unwrap(), "1");
        assert_eq!(cache.get("two").await.unwrap().unwrap(), "2");
    }

    #[tokio::test]
    async fn persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache-test.db");
        let path_str = path.to_str().unwrap();

        {
            let cache = SqliteCache::open(path_str).unwrap();
            cache.set("key", "persisted").await.unwrap();
        }

        {
            let cache = SqliteCache::open(path_str).unwrap();
            assert_eq!(cache.get("key").await.unwrap().unwrap(), "persisted");
        }
    }
}
