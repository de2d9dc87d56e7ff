//! Persistence engine: batched SQLite writer with TTL purging.
//!
//! ```text
//!   log(record) ──▶ queue (200) ──▶ writer ──▶ BatchWriter ──┐
//!                                                            ▼
//!   purge scheduler (60 s) ──────────────────────────▶ Mutex<Connection>
//!   single_row_query / query / last_position ────────────────▲
//! ```
//!
//! One connection, one mutex: batched inserts, purges and ad-hoc queries
//! are serialised, so a reader never sees half of a batch.  A failed
//! insert or purge ends the unit that ran it; there is no retry.

pub mod batch;
pub mod records;

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use futures_lite::future;
use log::{debug, info, warn};
use rusqlite::{Connection, OptionalExtension, Params, Row};

use self::batch::BatchWriter;
use self::records::{LAST_POSITION_QUERY, MANAGED_TABLES, TableSchema, sql_time};
use crate::app::ports::{InsertQuery, Insertable};
use crate::error::{Result, StorageError};
use crate::gnss::Position;

/// Records queued ahead of the writer before `log` suspends.
pub const QUEUE_DEPTH: usize = 200;

/// Time between purge cycles.
pub const PURGE_INTERVAL: Duration = Duration::from_secs(60);

pub struct PersistenceEngine {
    db: Mutex<Connection>,
    queue: Channel<CriticalSectionRawMutex, InsertQuery, QUEUE_DEPTH>,
    tables: &'static [TableSchema],
    ttl: Duration,
}

impl PersistenceEngine {
    /// Open (or create) the database file.  Call [`init`](Self::init)
    /// before running.
    pub fn open(path: impl AsRef<Path>) -> core::result::Result<Self, StorageError> {
        let path = path.as_ref();
        info!("Opening database {}", path.display());
        let conn = Connection::open(path).map_err(StorageError::Open)?;
        Ok(Self::with_connection(conn))
    }

    pub fn open_in_memory() -> core::result::Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(StorageError::Open)?;
        Ok(Self::with_connection(conn))
    }

    fn with_connection(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
            queue: Channel::new(),
            tables: MANAGED_TABLES,
            ttl: Duration::ZERO,
        }
    }

    /// Create every managed table and set the retention TTL (zero disables
    /// purging).  Any failure here must abort startup.
    pub fn init(&mut self, ttl: Duration) -> core::result::Result<(), StorageError> {
        {
            let conn = self.db.lock().map_err(|_| StorageError::Poisoned)?;
            for table in self.tables {
                conn.execute_batch(table.create)
                    .map_err(|source| StorageError::CreateTable {
                        table: table.name,
                        source,
                    })?;
            }
        }
        self.ttl = ttl;
        if ttl.is_zero() {
            info!("Database initialized, purging disabled");
        } else {
            info!(
                "Database initialized, purging rows older than {:?} every {:?}",
                ttl, PURGE_INTERVAL
            );
        }
        Ok(())
    }

    pub fn tables(&self) -> &'static [TableSchema] {
        self.tables
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // ── Write path ───────────────────────────────────────────

    /// Queue a record for batched insertion.  Suspends while the queue is full.
    pub async fn log(&self, record: &impl Insertable) {
        self.queue.send(record.insert_query()).await;
    }

    /// Queue a record without waiting; `false` if the queue is full.
    pub fn try_log(&self, record: &impl Insertable) -> bool {
        self.queue.try_send(record.insert_query()).is_ok()
    }

    /// Writer unit: drains the queue into per-shape batches.
    pub async fn run_writer(&self) -> Result<()> {
        let mut writer = BatchWriter::new();
        loop {
            let query = self.queue.receive().await;
            writer.push(&self.db, query)?;
        }
    }

    // ── Retention ────────────────────────────────────────────

    /// Delete rows older than `now - ttl` from every managed table.
    ///
    /// A TTL reaching back past the earliest representable time leaves
    /// nothing old enough to delete.
    pub fn purge(&self, ttl: Duration) -> core::result::Result<usize, StorageError> {
        let cutoff = TimeDelta::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_sub_signed(ttl));
        match cutoff {
            Some(cutoff) => self.purge_older_than(cutoff),
            None => {
                debug!("Retention {:?} predates every row, nothing to purge", ttl);
                Ok(0)
            }
        }
    }

    /// Delete rows stamped before `cutoff` from every managed table.
    pub fn purge_older_than(&self, cutoff: DateTime<Utc>) -> core::result::Result<usize, StorageError> {
        let cutoff_text = sql_time(&cutoff);
        let conn = self.db.lock().map_err(|_| StorageError::Poisoned)?;
        let mut purged = 0;
        for table in self.tables {
            purged += conn
                .execute(table.purge, [&cutoff_text])
                .map_err(|source| StorageError::Purge {
                    table: table.name,
                    source,
                })?;
        }
        info!("Purged {} rows older than {}", purged, cutoff_text);
        Ok(purged)
    }

    /// Purge scheduler unit.  Never completes when the TTL is zero.
    pub async fn run_purge(&self) -> Result<()> {
        if self.ttl.is_zero() {
            return future::pending().await;
        }
        loop {
            async_io_mini::Timer::after(PURGE_INTERVAL).await;
            self.purge(self.ttl)?;
        }
    }

    /// Writer and purge scheduler together; ends on the first failure.
    pub async fn run(&self) -> Result<()> {
        if self.ttl.is_zero() {
            warn!("Log TTL is zero, rows are kept forever");
        }
        future::try_zip(self.run_writer(), self.run_purge())
            .await
            .map(|_| ())
    }

    // ── Query surface ────────────────────────────────────────

    /// Run a query expected to yield at most one row.
    pub fn single_row_query<T, P, F>(
        &self,
        sql: &str,
        params: P,
        f: F,
    ) -> core::result::Result<Option<T>, StorageError>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        let conn = self.db.lock().map_err(|_| StorageError::Poisoned)?;
        conn.query_row(sql, params, f)
            .optional()
            .map_err(StorageError::Query)
    }

    /// Run a query, calling `f` for each row.  Returns the row count.
    pub fn query<P, F>(&self, sql: &str, params: P, mut f: F) -> core::result::Result<usize, StorageError>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<()>,
    {
        let conn = self.db.lock().map_err(|_| StorageError::Poisoned)?;
        let mut stmt = conn.prepare(sql).map_err(StorageError::Query)?;
        let mut rows = stmt.query(params).map_err(StorageError::Query)?;
        let mut count = 0;
        while let Some(row) = rows.next().map_err(StorageError::Query)? {
            f(row).map_err(StorageError::Query)?;
            count += 1;
        }
        Ok(count)
    }

    /// Most recent 2D/3D position stored in the `gnss` table.
    pub fn last_position(&self) -> core::result::Result<Option<Position>, StorageError> {
        self.single_row_query(LAST_POSITION_QUERY, [], |row| {
            Ok(Position {
                latitude: row.get(0)?,
                longitude: row.get(1)?,
                altitude: row.get(2)?,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> PersistenceEngine {
        let mut e = PersistenceEngine::open_in_memory().unwrap();
        e.init(Duration::from_secs(3600)).unwrap();
        e
    }

    #[test]
    fn init_creates_every_table() {
        let e = engine();
        let mut names = Vec::new();
        e.query(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
            [],
            |row| {
                names.push(row.get::<_, String>(0)?);
                Ok(())
            },
        )
        .unwrap();
        assert_eq!(names, vec!["direction_events", "gnss", "imu", "merged"]);
        let mut managed: Vec<_> = e.tables().iter().map(|t| t.name).collect();
        managed.sort_unstable();
        assert_eq!(managed, names);
    }

    #[test]
    fn init_is_repeatable() {
        let mut e = engine();
        assert!(e.init(Duration::ZERO).is_ok());
        assert_eq!(e.ttl(), Duration::ZERO);
    }

    #[test]
    fn empty_database_has_no_last_position() {
        assert_eq!(engine().last_position().unwrap(), None);
    }

    #[test]
    fn purge_on_empty_tables_deletes_nothing() {
        assert_eq!(engine().purge(Duration::from_secs(60)).unwrap(), 0);
    }

    #[test]
    fn bad_query_is_reported() {
        let e = engine();
        assert!(matches!(
            e.single_row_query("SELECT * FROM nowhere", [], |r| r.get::<_, i64>(0)),
            Err(StorageError::Query(_))
        ));
    }
}
