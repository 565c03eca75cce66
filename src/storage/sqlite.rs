// Persistent run state: seen-deal identities, cached Amazon component
// prices and cached combo detail-page parses.
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::model::{Category, StorageError};

/// Cached result of a combo detail-page parse: component names with the
/// categories they resolved to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedDetail {
    pub components: Vec<CachedComponent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedComponent {
    pub name: String,
    pub category: Category,
}

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Open (or create) the database and run migrations.
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path)?;
        Self::init(conn)
    }

    /// In-memory database, mainly for tests.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS seen_deals (
                url TEXT PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS amazon_prices (
                component TEXT PRIMARY KEY,
                price REAL NOT NULL,
                cached_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS deal_details (
                url TEXT PRIMARY KEY,
                detail TEXT NOT NULL
            );
            ",
        )?;
        Ok(Self { conn })
    }

    /// Load the full set of previously-notified deal identities.
    pub fn load_seen(&self) -> Result<HashSet<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT url FROM seen_deals")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut seen = HashSet::new();
        for row in rows {
            seen.insert(row?);
        }
        Ok(seen)
    }

    /// Replace the seen-set atomically. The caller computes the new set;
    /// this never merges.
    pub fn replace_seen(&mut self, seen: &HashSet<String>) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM seen_deals", [])?;
        {
            let mut stmt = tx.prepare("INSERT INTO seen_deals (url) VALUES (?1)")?;
            for url in seen {
                stmt.execute(params![url])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Cached Amazon price for a component, if the entry is younger than
    /// `ttl_secs`. Stale entries read as a miss.
    pub fn cached_price(
        &self,
        component: &str,
        ttl_secs: i64,
    ) -> Result<Option<f64>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT price, cached_at FROM amazon_prices WHERE component = ?1")?;
        let mut rows = stmt.query(params![component])?;

        if let Some(row) = rows.next()? {
            let price: f64 = row.get(0)?;
            let cached_at_str: String = row.get(1)?;
            let cached_at: DateTime<Utc> = cached_at_str.parse().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    1,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;
            if Utc::now().signed_duration_since(cached_at) <= Duration::seconds(ttl_secs) {
                return Ok(Some(price));
            }
        }
        Ok(None)
    }

    pub fn put_cached_price(&self, component: &str, price: f64) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO amazon_prices (component, price, cached_at)
             VALUES (?1, ?2, ?3)",
            params![component, price, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Cached detail-page parse for a combo URL. Detail parses have no TTL;
    /// a combo's component list does not change under the same URL.
    pub fn deal_detail(&self, url: &str) -> Result<Option<CachedDetail>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT detail FROM deal_details WHERE url = ?1")?;
        let mut rows = stmt.query(params![url])?;

        if let Some(row) = rows.next()? {
            let json: String = row.get(0)?;
            return Ok(Some(serde_json::from_str(&json)?));
        }
        Ok(None)
    }

    pub fn put_deal_detail(&self, url: &str, detail: &CachedDetail) -> Result<(), StorageError> {
        let json = serde_json::to_string(detail)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO deal_details (url, detail) VALUES (?1, ?2)",
            params![url, json],
        )?;
        Ok(())
    }

    /// Drop all persisted state; used by the --fresh flag.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(
            "DELETE FROM seen_deals;
             DELETE FROM amazon_prices;
             DELETE FROM deal_details;",
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> SqliteStorage {
        SqliteStorage::open_in_memory().unwrap()
    }

    #[test]
    fn seen_set_round_trips_and_replaces() {
        let mut s = storage();
        assert!(s.load_seen().unwrap().is_empty());

        let first: HashSet<String> =
            ["https://a/1".to_string(), "https://a/2".to_string()].into();
        s.replace_seen(&first).unwrap();
        assert_eq!(s.load_seen().unwrap(), first);

        // Replacement drops entries missing from the new set.
        let second: HashSet<String> = ["https://a/2".to_string()].into();
        s.replace_seen(&second).unwrap();
        assert_eq!(s.load_seen().unwrap(), second);
    }

    #[test]
    fn price_cache_hits_within_ttl() {
        let s = storage();
        assert!(s.cached_price("AMD Ryzen 7 9800X3D", 3600).unwrap().is_none());

        s.put_cached_price("AMD Ryzen 7 9800X3D", 449.99).unwrap();
        assert_eq!(s.cached_price("AMD Ryzen 7 9800X3D", 3600).unwrap(), Some(449.99));
    }

    #[test]
    fn price_cache_expires_past_ttl() {
        let s = storage();
        s.put_cached_price("cpu", 100.0).unwrap();
        // A zero TTL makes any stored entry stale.
        assert!(s.cached_price("cpu", 0).unwrap().is_none());
    }

    #[test]
    fn detail_cache_round_trips() {
        let s = storage();
        let url = "https://www.newegg.com/Product/ComboDealDetails?ItemList=Combo.1";
        assert!(s.deal_detail(url).unwrap().is_none());

        let detail = CachedDetail {
            components: vec![
                CachedComponent { name: "AMD Ryzen 7 9800X3D".into(), category: Category::Cpu },
                CachedComponent {
                    name: "G.SKILL 32GB DDR5-6000".into(),
                    category: Category::Ram,
                },
            ],
        };
        s.put_deal_detail(url, &detail).unwrap();

        let loaded = s.deal_detail(url).unwrap().unwrap();
        assert_eq!(loaded.components.len(), 2);
        assert_eq!(loaded.components[0].category, Category::Cpu);
        assert_eq!(loaded.components[1].name, "G.SKILL 32GB DDR5-6000");
    }

    #[test]
    fn clear_wipes_everything() {
        let mut s = storage();
        s.replace_seen(&["https://a/1".to_string()].into()).unwrap();
        s.put_cached_price("cpu", 100.0).unwrap();
        s.clear().unwrap();
        assert!(s.load_seen().unwrap().is_empty());
        assert!(s.cached_price("cpu", i64::MAX / 2).unwrap().is_none());
    }
}
