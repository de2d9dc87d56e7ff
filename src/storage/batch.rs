//! Per-shape batching of insert queries.
//!
//! Records are grouped by their base insert statement.  Each group
//! accumulates placeholder groups and flattened parameters until it holds
//! [`BATCH_SIZE`] rows, then one multi-row insert is executed and the group
//! is discarded.  There is no time-based flush: a group below the threshold
//! stays pending.

use std::collections::HashMap;
use std::sync::Mutex;

use log::debug;
use rusqlite::{Connection, params_from_iter, types::Value};

use crate::app::ports::InsertQuery;
use crate::error::StorageError;

/// Rows per multi-row insert.
pub const BATCH_SIZE: usize = 100;

#[derive(Debug, Default)]
struct Batch {
    count: usize,
    placeholders: Vec<&'static str>,
    params: Vec<Value>,
}

#[derive(Debug, Default)]
pub struct BatchWriter {
    batches: HashMap<&'static str, Batch>,
    flushes: u64,
}

impl BatchWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one row.  Returns the number of rows written when this row
    /// completed a batch, `None` while the batch is still filling.
    pub fn push(
        &mut self,
        db: &Mutex<Connection>,
        query: InsertQuery,
    ) -> Result<Option<usize>, StorageError> {
        let batch = self.batches.entry(query.statement).or_default();
        batch.count += 1;
        batch.placeholders.push(query.placeholders);
        batch.params.extend(query.values);

        if batch.count < BATCH_SIZE {
            return Ok(None);
        }

        let Some(batch) = self.batches.remove(query.statement) else {
            return Ok(None);
        };
        let sql = format!("{} {}", query.statement, batch.placeholders.join(", "));
        let written = {
            let conn = db.lock().map_err(|_| StorageError::Poisoned)?;
            conn.execute(&sql, params_from_iter(batch.params.iter()))
                .map_err(|source| StorageError::Insert {
                    statement: query.statement,
                    source,
                })?
        };
        self.flushes += 1;
        debug!("Flushed {} rows: {}", written, query.statement);
        Ok(Some(written))
    }

    /// Rows waiting in the batch for `statement`.
    pub fn pending(&self, statement: &str) -> usize {
        self.batches.get(statement).map_or(0, |b| b.count)
    }

    /// Multi-row inserts executed so far.
    pub fn flushes(&self) -> u64 {
        self.flushes
    }
}
