
use serde_json::Value;
use std::{cell::RefCell, collections::HashMap, time::Duration};
use anyhow::{Context, Result};
use log::debug;

use rusqlite::{Connection, OptionalExtension, params};

/// Keyed store for fetched rosters and odds. Entries older than the TTL are
/// treated as missing.
pub trait LookupCache {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn put(&self, key: &str, value: &Value) -> Result<()>;
    fn evict_expired(&self) -> Result<usize>;
    fn clear(&self) -> Result<usize>;
}

pub struct SqliteCache {
    conn: Connection,
    ttl: Duration,
}

#[derive(Default)]
pub struct MemoryCache {
    entries: RefCell<HashMap<String, (i64, Value)>>,
    ttl: Duration,
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn is_expired(stored_at: i64, now: i64, ttl: Duration) -> bool {
    now - stored_at >= ttl.as_millis() as i64
}

impl SqliteCache {
    pub fn open(path: &str, ttl: Duration) -> Result<Self> {
        let conn = Connection::open(path).with_context(|| format!("failed to open cache db {}", path))?;
        Self::from_connection(conn, ttl)
    }

    #[cfg(test)]
    pub fn in_memory(ttl: Duration) -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, ttl)
    }

    fn from_connection(conn: Connection, ttl: Duration) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS lookup_cache (
                key TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                stored_at INTEGER NOT NULL
            );",
        )?;
        Ok(SqliteCache { conn, ttl })
    }
}

impl LookupCache for SqliteCache {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let row = self
            .conn
            .query_row(
                "SELECT payload, stored_at FROM lookup_cache WHERE key = ?1",
                params![key],
                |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)),
            )
            .optional()?;
        match row {
            Some((payload, stored_at)) => {
                if is_expired(stored_at, now_millis(), self.ttl) {
                    self.conn.execute("DELETE FROM lookup_cache WHERE key = ?1", params![key])?;
                    debug!("cache entry {} expired", key);
                    return Ok(None);
                }
                Ok(Some(serde_json::from_str(&payload)?))
            }
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, value: &Value) -> Result<()> {
        let payload = serde_json::to_string(value)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO lookup_cache (key, payload, stored_at) VALUES (?1, ?2, ?3)",
            params![key, payload, now_millis()],
        )?;
        Ok(())
    }

    fn evict_expired(&self) -> Result<usize> {
        let cutoff = now_millis() - self.ttl.as_millis() as i64;
        let removed = self
            .conn
            .execute("DELETE FROM lookup_cache WHERE stored_at <= ?1", params![cutoff])?;
        Ok(removed)
    }

    fn clear(&self) -> Result<usize> {
        Ok(self.conn.execute("DELETE FROM lookup_cache", [])?)
    }
}

impl MemoryCache {
    pub fn new(ttl: Duration) -> Self {
        MemoryCache { entries: RefCell::new(HashMap::new()), ttl }
    }
}

impl LookupCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut entries = self.entries.borrow_mut();
        let expired = match entries.get(key) {
            Some((stored_at, _)) => is_expired(*stored_at, now_millis(), self.ttl),
            None => return Ok(None),
        };
        if expired {
            entries.remove(key);
            return Ok(None);
        }
        Ok(entries.get(key).map(|(_, v)| v.clone()))
    }

    fn put(&self, key: &str, value: &Value) -> Result<()> {
        self.entries.borrow_mut().insert(key.to_string(), (now_millis(), value.clone()));
        Ok(())
    }

    fn evict_expired(&self) -> Result<usize> {
        let now = now_millis();
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        let ttl = self.ttl;
        entries.retain(|_, (stored_at, _)| !is_expired(*stored_at, now, ttl));
        Ok(before - entries.len())
    }

    fn clear(&self) -> Result<usize> {
        let mut entries = self.entries.borrow_mut();
        let removed = entries.len();
        entries.clear();
        Ok(removed)
    }
}

/// Get-or-fetch: serves `key` from the cache, otherwise runs `fetch` and stores its result.
pub fn cached_json<C, F>(cache: &C, key: &str, fetch: F) -> Result<Value>
where
    C: LookupCache + ?Sized,
    F: FnOnce() -> Result<Value>,
{
    if let Some(hit) = cache.get(key)? {
        debug!("cache hit {}", key);
        return Ok(hit);
    }
    debug!("cache miss {}", key);
    let fresh = fetch()?;
    cache.put(key, &fresh)?;
    Ok(fresh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn test_sqlite_round_trip() {
        let cache = SqliteCache::in_memory(HOUR).unwrap();
        assert_eq!(cache.get("roster:13").unwrap(), None);
        cache.put("roster:13", &json!([{"id": "3112335"}])).unwrap();
        assert_eq!(cache.get("roster:13").unwrap(), Some(json!([{"id": "3112335"}])));
        cache.put("roster:13", &json!([])).unwrap();
        assert_eq!(cache.get("roster:13").unwrap(), Some(json!([])));
    }

    #[test]
    fn test_sqlite_ttl_expiry() {
        let cache = SqliteCache::in_memory(Duration::from_secs(0)).unwrap();
        cache.put("market_odds:abc", &json!({"player_points": []})).unwrap();
        assert_eq!(cache.get("market_odds:abc").unwrap(), None);
        cache.put("odds_events", &json!([])).unwrap();
        assert_eq!(cache.evict_expired().unwrap(), 1);
    }

    #[test]
    fn test_sqlite_clear() {
        let cache = SqliteCache::in_memory(HOUR).unwrap();
        cache.put("a", &json!(1)).unwrap();
        cache.put("b", &json!(2)).unwrap();
        assert_eq!(cache.evict_expired().unwrap(), 0);
        assert_eq!(cache.clear().unwrap(), 2);
        assert_eq!(cache.get("a").unwrap(), None);
    }

    #[test]
    fn test_memory_ttl_expiry() {
        let fresh = MemoryCache::new(HOUR);
        fresh.put("k", &json!("v")).unwrap();
        assert_eq!(fresh.get("k").unwrap(), Some(json!("v")));

        let stale = MemoryCache::new(Duration::from_secs(0));
        stale.put("k", &json!("v")).unwrap();
        stale.put("j", &json!("w")).unwrap();
        assert_eq!(stale.evict_expired().unwrap(), 2);
        assert_eq!(stale.get("k").unwrap(), None);
    }

    #[test]
    fn test_cached_json_fetches_once() {
        let cache = MemoryCache::new(HOUR);
        let calls = RefCell::new(0);
        let fetch = || {
            *calls.borrow_mut() += 1;
            Ok(json!({"team": "Nuggets"}))
        };
        let first = cached_json(&cache, "team:7", fetch).unwrap();
        let second = cached_json(&cache, "team:7", || {
            *calls.borrow_mut() += 1;
            Ok(json!({"team": "stale"}))
        })
        .unwrap();
        assert_eq!(first, second);
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn test_cached_json_does_not_store_failures() {
        let cache = MemoryCache::new(HOUR);
        assert!(cached_json(&cache, "x", || anyhow::bail!("offline")).is_err());
        assert_eq!(cache.get("x").unwrap(), None);
    }

    #[test]
    fn test_trait_object_dispatch() {
        let boxed: Box<dyn LookupCache> = Box::new(MemoryCache::new(HOUR));
        let value = cached_json(boxed.as_ref(), "k", || Ok(json!(5))).unwrap();
        assert_eq!(value, json!(5));
    }
}
