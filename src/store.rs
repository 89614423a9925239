//! ==============================================================================
//! store.rs - local sqlite persistence for pm2.5 readings
//! ==============================================================================
//!
//! purpose:
//!     durable, append-only table of readings. the primary key is
//!     (timestamp, device_id, project_name) and inserts use `INSERT OR IGNORE`,
//!     so ingesting overlapping history again never duplicates or rewrites rows.
//!
//! relationships:
//!     - used by: pipeline.rs (ensure_schema + insert), analysis.rs (query)
//!     - stores: domain.rs (Reading)
//!
//! ==============================================================================

use crate::domain::Reading;

use rusqlite::{params, Connection};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

/// errors raised by the reading store
#[derive(Debug, Error)]
pub enum StoreError {
    /// failure reported by sqlite
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// sqlite-backed table of pm2.5 readings
pub struct ReadingStore {
    conn: Connection,
}

impl ReadingStore {
    /// open (or create) the database file at `path`
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        debug!("Opened reading store");
        Ok(Self { conn })
    }

    /// in-memory database, used by tests
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// create the readings table if it is not there yet
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS pm25_data (
                timestamp    TEXT NOT NULL,
                pm25         REAL NOT NULL,
                device_id    TEXT NOT NULL,
                project_name TEXT NOT NULL,
                PRIMARY KEY (timestamp, device_id, project_name)
            );",
        )?;
        Ok(())
    }

    /// whether the readings table has been created
    #[cfg(test)]
    pub fn table_exists(&self) -> Result<bool, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'pm25_data'",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// insert readings in one transaction, skipping keys that already exist
    ///
    /// returns how many rows were actually added.
    #[instrument(skip_all, fields(count = readings.len()))]
    pub fn insert_readings(&mut self, readings: &[Reading]) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR IGNORE INTO pm25_data (timestamp, pm25, device_id, project_name)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for r in readings {
                inserted += stmt.execute(params![r.timestamp, r.pm25, r.device_id, r.project_name])?;
            }
        }
        tx.commit()?;

        debug!("Inserted {} new readings ({} skipped)", inserted, readings.len() - inserted);
        Ok(inserted)
    }

    /// every stored reading for a device/project, in no particular order
    pub fn query_readings(&self, device_id: &str, project_name: &str) -> Result<Vec<Reading>, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT timestamp, pm25, device_id, project_name FROM pm25_data
             WHERE device_id = ?1 AND project_name = ?2",
        )?;

        let rows = stmt.query_map(params![device_id, project_name], |row| {
            Ok(Reading {
                timestamp: row.get(0)?,
                pm25: row.get(1)?,
                device_id: row.get(2)?,
                project_name: row.get(3)?,
            })
        })?;

        let readings = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(readings)
    }
}
