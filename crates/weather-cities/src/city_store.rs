//! SQLite-backed city repository.
//!
//! `CityRepository` abstracts the `weather_city` table; `SqliteCityStore` is
//! the implementation used by the server and the import job. Rows are only
//! ever inserted: cities are never updated or deleted.

use rusqlite::{params, Connection};
use std::path::Path;
use thiserror::Error;

use crate::city::City;

/// Errors that can occur during city storage operations.
#[derive(Debug, Error)]
pub enum CityStoreError {
    /// A row with this external id already exists.
    #[error("City {0} already exists")]
    Duplicate(i64),

    /// SQLite error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failed to prepare the database location.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for city storage operations.
pub type CityStoreResult<T> = Result<T, CityStoreError>;

/// Persistence of `(city_id, name, country)` records.
///
/// Implementations don't need to be Sync; shared access goes through a Mutex.
pub trait CityRepository: Send {
    /// True if a row with this external id exists.
    fn exists(&self, city_id: i64) -> CityStoreResult<bool>;

    /// Append one row. No upsert: callers check `exists` first.
    ///
    /// # Errors
    /// Returns `CityStoreError::Duplicate` if the id is already stored.
    fn insert(&self, city_id: i64, name: &str, country: &str) -> CityStoreResult<()>;

    /// Total number of stored cities.
    fn count(&self) -> CityStoreResult<usize>;

    /// Cities whose name contains `query`, in storage order, at most `limit`.
    fn search_by_name(&self, query: &str, limit: usize) -> CityStoreResult<Vec<City>>;

    /// Look up a city by its external id.
    fn get(&self, city_id: i64) -> CityStoreResult<Option<City>>;

    /// A page of cities in storage order.
    fn list(&self, offset: usize, limit: usize) -> CityStoreResult<Vec<City>>;
}

/// SQLite-based city storage.
pub struct SqliteCityStore {
    conn: Connection,
}

impl SqliteCityStore {
    /// Open (or create) the store at the given path.
    ///
    /// Creates the parent directory, the database file and the schema if needed.
    pub fn new<P: AsRef<Path>>(path: P) -> CityStoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        tracing::debug!("Opened city store at {}", path.display());
        Ok(store)
    }

    /// Create an in-memory store (for tests and dry runs).
    pub fn in_memory() -> CityStoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> CityStoreResult<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS weather_city (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                city_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                country TEXT NOT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_weather_city_city_id ON weather_city(city_id);
            CREATE INDEX IF NOT EXISTS idx_weather_city_name ON weather_city(name);
            "#,
        )?;
        Ok(())
    }

    fn row_to_city(row: &rusqlite::Row) -> rusqlite::Result<City> {
        Ok(City {
            city_id: row.get(0)?,
            name: row.get(1)?,
            country: row.get(2)?,
        })
    }
}

impl CityRepository for SqliteCityStore {
    fn exists(&self, city_id: i64) -> CityStoreResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM weather_city WHERE city_id = ?1",
            params![city_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn insert(&self, city_id: i64, name: &str, country: &str) -> CityStoreResult<()> {
        let result = self.conn.execute(
            "INSERT INTO weather_city (city_id, name, country) VALUES (?1, ?2, ?3)",
            params![city_id, name, country],
        );

        match result {
            Ok(_) => {
                tracing::trace!("Inserted city {} ({})", city_id, name);
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(CityStoreError::Duplicate(city_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn count(&self) -> CityStoreResult<usize> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM weather_city", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn search_by_name(&self, query: &str, limit: usize) -> CityStoreResult<Vec<City>> {
        let pattern = format!("%{}%", query);
        let mut stmt = self.conn.prepare(
            "SELECT city_id, name, country FROM weather_city
             WHERE name LIKE ?1
             ORDER BY id
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![pattern, limit as i64], Self::row_to_city)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn get(&self, city_id: i64) -> CityStoreResult<Option<City>> {
        let mut stmt = self
            .conn
            .prepare("SELECT city_id, name, country FROM weather_city WHERE city_id = ?1")?;

        let mut rows = stmt.query(params![city_id])?;
        match rows.next()? {
            Some(row) => Ok(Some(Self::row_to_city(row)?)),
            None => Ok(None),
        }
    }

    fn list(&self, offset: usize, limit: usize) -> CityStoreResult<Vec<City>> {
        let mut stmt = self.conn.prepare(
            "SELECT city_id, name, country FROM weather_city
             ORDER BY id
             LIMIT ?1 OFFSET ?2",
        )?;

        let rows = stmt.query_map(params![limit as i64, offset as i64], Self::row_to_city)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    fn create_test_store() -> SqliteCityStore {
        SqliteCityStore::in_memory().expect("Failed to create in-memory store")
    }

    #[test]
    fn test_insert_and_exists() {
        let store = create_test_store();

        assert!(!store.exists(703448).unwrap());
        store.insert(703448, "Kyiv", "UA").unwrap();
        assert!(store.exists(703448).unwrap());
        assert!(!store.exists(706483).unwrap());
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let store = create_test_store();

        store.insert(703448, "Kyiv", "UA").unwrap();
        let result = store.insert(703448, "Kyiv", "UA");
        assert!(matches!(result, Err(CityStoreError::Duplicate(703448))));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_count() {
        let store = create_test_store();

        assert_eq!(store.count().unwrap(), 0);
        store.insert(1, "Odesa", "UA").unwrap();
        store.insert(2, "Lviv", "UA").unwrap();
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_search_substring_in_storage_order() {
        let store = create_test_store();

        store.insert(2643743, "London", "GB").unwrap();
        store.insert(6058560, "London", "CA").unwrap();
        store.insert(2950159, "Berlin", "DE").unwrap();
        store.insert(4517009, "New London", "US").unwrap();

        let found = store.search_by_name("lon", 10).unwrap();
        let ids: Vec<i64> = found.iter().map(|c| c.city_id).collect();
        assert_eq!(ids, vec![2643743, 6058560, 4517009]);
    }

    #[test]
    fn test_search_respects_limit() {
        let store = create_test_store();

        for i in 0..25 {
            store.insert(i, &format!("Town {i}"), "UA").unwrap();
        }

        assert_eq!(store.search_by_name("Town", 10).unwrap().len(), 10);
        assert!(store.search_by_name("Village", 10).unwrap().is_empty());
    }

    #[test]
    fn test_get_and_list() {
        let store = create_test_store();

        store.insert(10, "Kharkiv", "UA").unwrap();
        store.insert(20, "Dnipro", "UA").unwrap();
        store.insert(30, "Poltava", "UA").unwrap();

        let city = store.get(20).unwrap().unwrap();
        assert_eq!(city, City::new(20, "Dnipro", "UA"));
        assert!(store.get(99).unwrap().is_none());

        let page = store.list(1, 5).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].name, "Dnipro");
    }

    #[test]
    fn test_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("weather.db");

        {
            let store = SqliteCityStore::new(&path).unwrap();
            store.insert(703448, "Kyiv", "UA").unwrap();
        }

        let reopened = SqliteCityStore::new(&path).unwrap();
        assert!(reopened.exists(703448).unwrap());
    }
}
