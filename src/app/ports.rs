//! Port traits: the boundary between the pipeline and its collaborators.
//!
//! ```text
//!   Device driver ──▶ SampleSource ──▶ RawFeed
//!   Pipeline      ──▶ EventSink    ──▶ external consumer
//!   Record kind   ──▶ Insertable   ──▶ PersistenceEngine
//! ```
//!
//! Driver adapters implement these traits; the pipeline consumes them via
//! generics, so the core never touches registers or file formats directly.

use rusqlite::types::Value;

use crate::app::events::{Event, Published};
use crate::error::AcquisitionError;
use crate::imu::RawSample;

// ───────────────────────────────────────────────────────────────
// Sample source (driven adapter: IMU → pipeline)
// ───────────────────────────────────────────────────────────────

/// Periodic acquisition of normalized inertial samples.
pub trait SampleSource {
    /// Acquire one sample.  `Ok(None)` means the source is exhausted
    /// (replays and test scripts); hardware sources never return it.
    fn read(&mut self) -> Result<Option<RawSample>, AcquisitionError>;

    /// Reinitialise the device after a transient anomaly.
    fn reinit(&mut self) -> Result<(), AcquisitionError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: pipeline → external consumer)
// ───────────────────────────────────────────────────────────────

/// External consumer of the merged event stream.  Adapters decide where
/// events go (serial log, RPC stream, snapshot writer).
pub trait EventSink {
    fn emit(&mut self, event: &Published<Event>);
}

// ───────────────────────────────────────────────────────────────
// Insertable record contract (record kind → persistence)
// ───────────────────────────────────────────────────────────────

/// One row ready for batched insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertQuery {
    /// Base insert statement, e.g. `INSERT INTO imu (time, ...) VALUES`.
    /// Records sharing this text are batched together.
    pub statement: &'static str,
    /// Placeholder group for one row, e.g. `(?, ?, ?)`.
    pub placeholders: &'static str,
    /// Parameters in column order.
    pub values: Vec<Value>,
}

/// Any record the [`PersistenceEngine`](crate::storage::PersistenceEngine)
/// can store.
pub trait Insertable {
    fn insert_query(&self) -> InsertQuery;
}
