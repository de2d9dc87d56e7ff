//! Unified error types for the data logger.
//!
//! A single `Error` enum that every pipeline unit can convert into, keeping
//! the supervisor's handling uniform.  Conditions the pipeline recovers from
//! locally (device reinitialisation) never surface here; everything that
//! does is fatal to the unit that produced it.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the pipeline funnels into this type.
#[derive(Debug)]
pub enum Error {
    /// The sample source could not be read or reinitialised.
    Acquisition(AcquisitionError),
    /// Storage could not be opened, written, purged or queried.
    Storage(StorageError),
    /// A record needed the current position fix before any was received.
    NoFixAvailable,
    /// A supervised pipeline unit terminated with an error.
    Unit {
        unit: &'static str,
        source: Box<Error>,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Acquisition(e) => write!(f, "acquisition: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::NoFixAvailable => write!(f, "no position fix available"),
            Self::Unit { unit, source } => write!(f, "{unit}: {source}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Acquisition(e) => Some(e),
            Self::Storage(e) => Some(e),
            Self::NoFixAvailable => None,
            Self::Unit { source, .. } => Some(source.as_ref()),
        }
    }
}

impl Error {
    /// Innermost error, looking through supervisor wrapping.
    pub fn root(&self) -> &Error {
        match self {
            Self::Unit { source, .. } => source.root(),
            other => other,
        }
    }
}

// ---------------------------------------------------------------------------
// Acquisition errors
// ---------------------------------------------------------------------------

/// A read from the inertial device failed.  The string carries the driver's
/// own description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionError {
    Acceleration(String),
    AngularRate(String),
    Temperature(String),
    /// Reinitialising the device after an anomaly failed.
    Reinit(String),
}

impl fmt::Display for AcquisitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Acceleration(msg) => write!(f, "getting acceleration: {msg}"),
            Self::AngularRate(msg) => write!(f, "getting angular rate: {msg}"),
            Self::Temperature(msg) => write!(f, "getting temperature: {msg}"),
            Self::Reinit(msg) => write!(f, "initializing IMU: {msg}"),
        }
    }
}

impl std::error::Error for AcquisitionError {}

impl From<AcquisitionError> for Error {
    fn from(e: AcquisitionError) -> Self {
        Self::Acquisition(e)
    }
}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum StorageError {
    /// The database file could not be opened.
    Open(rusqlite::Error),
    /// A managed table's create statement failed.
    CreateTable {
        table: &'static str,
        source: rusqlite::Error,
    },
    /// A batched multi-row insert failed.
    Insert {
        statement: &'static str,
        source: rusqlite::Error,
    },
    /// A purge statement failed.
    Purge {
        table: &'static str,
        source: rusqlite::Error,
    },
    /// An ad-hoc query failed.
    Query(rusqlite::Error),
    /// The connection mutex was poisoned by a panicking holder.
    Poisoned,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open(e) => write!(f, "opening database: {e}"),
            Self::CreateTable { table, source } => {
                write!(f, "creating table {table}: {source}")
            }
            Self::Insert { statement, source } => {
                write!(f, "inserting batch for '{statement}': {source}")
            }
            Self::Purge { table, source } => write!(f, "purging table {table}: {source}"),
            Self::Query(e) => write!(f, "querying: {e}"),
            Self::Poisoned => write!(f, "database lock poisoned"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open(e) | Self::Query(e) => Some(e),
            Self::CreateTable { source, .. }
            | Self::Insert { source, .. }
            | Self::Purge { source, .. } => Some(source),
            Self::Poisoned => None,
        }
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
