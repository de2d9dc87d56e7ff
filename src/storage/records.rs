//! Record kinds and the tables that hold them.
//!
//! Each managed table pairs a create statement with a purge statement; each
//! record kind knows its insert statement, its per-row placeholder group and
//! its parameters in column order.
//!
//! | Table              | Record                           | Source stream       |
//! |--------------------|----------------------------------|---------------------|
//! | `imu`              | [`ImuRecord`]                    | raw samples         |
//! | `merged`           | `MergedRecord<Acceleration>`     | corrected samples   |
//! | `direction_events` | `MergedRecord<MotionEvent>`      | motion events       |
//! | `gnss`             | [`GnssRecord`]                   | position fixes      |

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::types::Value;

use crate::app::events::MotionEvent;
use crate::app::ports::{InsertQuery, Insertable};
use crate::error::{Error, Result};
use crate::gnss::PositionFix;
use crate::gnss::current::CurrentFix;
use crate::imu::{Acceleration, RawSample};

/// Timestamp column format.  Fixed width, so text order is time order.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

pub fn sql_time(t: &DateTime<Utc>) -> String {
    t.format(TIME_FORMAT).to_string()
}

/// Create and purge statements for one managed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub name: &'static str,
    /// Table and index DDL, run with `execute_batch`.
    pub create: &'static str,
    /// Single `?1` parameter: the cutoff time.
    pub purge: &'static str,
}

// ── imu ──────────────────────────────────────────────────────

pub const IMU_TABLE: TableSchema = TableSchema {
    name: "imu",
    create: "CREATE TABLE IF NOT EXISTS imu (
        id INTEGER NOT NULL PRIMARY KEY,
        time TIMESTAMP NOT NULL,
        acc_x REAL NOT NULL,
        acc_y REAL NOT NULL,
        acc_z REAL NOT NULL,
        gyro_x REAL NOT NULL,
        gyro_y REAL NOT NULL,
        gyro_z REAL NOT NULL,
        temperature REAL NOT NULL
    );
    CREATE INDEX IF NOT EXISTS imu_time_idx ON imu(time);",
    purge: "DELETE FROM imu WHERE time < ?1",
};

const IMU_INSERT: &str = "INSERT INTO imu \
    (time, acc_x, acc_y, acc_z, gyro_x, gyro_y, gyro_z, temperature) VALUES";
const IMU_FIELDS: &str = "(?, ?, ?, ?, ?, ?, ?, ?)";

/// One uncorrected sample with its angular rate and temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuRecord(pub RawSample);

impl Insertable for ImuRecord {
    fn insert_query(&self) -> InsertQuery {
        let RawSample {
            acceleration: a,
            angular_rate: g,
            temperature,
        } = self.0;
        InsertQuery {
            statement: IMU_INSERT,
            placeholders: IMU_FIELDS,
            values: vec![
                Value::Text(sql_time(&a.time)),
                Value::Real(a.x),
                Value::Real(a.y),
                Value::Real(a.z),
                Value::Real(g.x),
                Value::Real(g.y),
                Value::Real(g.z),
                Value::Real(temperature),
            ],
        }
    }
}

// ── merged ───────────────────────────────────────────────────

pub const MERGED_TABLE: TableSchema = TableSchema {
    name: "merged",
    create: "CREATE TABLE IF NOT EXISTS merged (
        id INTEGER NOT NULL PRIMARY KEY,
        time TIMESTAMP NOT NULL,
        acc_x REAL NOT NULL,
        acc_y REAL NOT NULL,
        acc_z REAL NOT NULL,
        acc_magnitude REAL NOT NULL,
        fix TEXT NOT NULL,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL,
        altitude REAL NOT NULL,
        heading REAL NOT NULL,
        speed REAL NOT NULL,
        hdop REAL NOT NULL,
        satellites_used INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS merged_time_idx ON merged(time);",
    purge: "DELETE FROM merged WHERE time < ?1",
};

const MERGED_INSERT: &str = "INSERT INTO merged \
    (time, acc_x, acc_y, acc_z, acc_magnitude, fix, latitude, longitude, altitude, \
    heading, speed, hdop, satellites_used) VALUES";
const MERGED_FIELDS: &str = "(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

// ── direction_events ─────────────────────────────────────────

pub const DIRECTION_TABLE: TableSchema = TableSchema {
    name: "direction_events",
    create: "CREATE TABLE IF NOT EXISTS direction_events (
        id INTEGER NOT NULL PRIMARY KEY,
        time TIMESTAMP NOT NULL,
        kind TEXT NOT NULL,
        magnitude REAL NOT NULL,
        fix TEXT NOT NULL,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL,
        altitude REAL NOT NULL,
        heading REAL NOT NULL,
        speed REAL NOT NULL
    );
    CREATE INDEX IF NOT EXISTS direction_events_time_idx ON direction_events(time);",
    purge: "DELETE FROM direction_events WHERE time < ?1",
};

const DIRECTION_INSERT: &str = "INSERT INTO direction_events \
    (time, kind, magnitude, fix, latitude, longitude, altitude, heading, speed) VALUES";
const DIRECTION_FIELDS: &str = "(?, ?, ?, ?, ?, ?, ?, ?, ?)";

/// An item paired with the position fix current when it was recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord<T> {
    pub item: T,
    pub fix: Arc<PositionFix>,
}

impl<T> MergedRecord<T> {
    /// Pair `item` with the current fix.  Fails if no fix was ever received;
    /// an empty position is never written.
    pub fn pair(item: T, current: &CurrentFix) -> Result<Self> {
        let fix = current.snapshot().ok_or(Error::NoFixAvailable)?;
        Ok(Self { item, fix })
    }
}

impl Insertable for MergedRecord<Acceleration> {
    fn insert_query(&self) -> InsertQuery {
        let a = &self.item;
        let f = &self.fix;
        InsertQuery {
            statement: MERGED_INSERT,
            placeholders: MERGED_FIELDS,
            values: vec![
                Value::Text(sql_time(&a.time)),
                Value::Real(a.x),
                Value::Real(a.y),
                Value::Real(a.z),
                Value::Real(a.magnitude),
                Value::Text(f.fix.as_str().to_string()),
                Value::Real(f.latitude),
                Value::Real(f.longitude),
                Value::Real(f.altitude),
                Value::Real(f.heading),
                Value::Real(f.speed),
                Value::Real(f.dop.hdop),
                Value::from(f.satellites.used),
            ],
        }
    }
}

impl Insertable for MergedRecord<MotionEvent> {
    fn insert_query(&self) -> InsertQuery {
        let e = &self.item;
        let f = &self.fix;
        InsertQuery {
            statement: DIRECTION_INSERT,
            placeholders: DIRECTION_FIELDS,
            values: vec![
                Value::Text(sql_time(&e.occurred_at)),
                Value::Text(e.kind.name().to_string()),
                Value::Real(e.triggering_magnitude),
                Value::Text(f.fix.as_str().to_string()),
                Value::Real(f.latitude),
                Value::Real(f.longitude),
                Value::Real(f.altitude),
                Value::Real(f.heading),
                Value::Real(f.speed),
            ],
        }
    }
}

// ── gnss ─────────────────────────────────────────────────────

pub const GNSS_TABLE: TableSchema = TableSchema {
    name: "gnss",
    create: "CREATE TABLE IF NOT EXISTS gnss (
        id INTEGER NOT NULL PRIMARY KEY,
        time TIMESTAMP NOT NULL,
        system_time TIMESTAMP NOT NULL,
        fix TEXT NOT NULL,
        eph INTEGER NOT NULL,
        sep INTEGER NOT NULL,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL,
        altitude REAL NOT NULL,
        heading REAL NOT NULL,
        speed REAL NOT NULL,
        gdop REAL NOT NULL,
        hdop REAL NOT NULL,
        pdop REAL NOT NULL,
        tdop REAL NOT NULL,
        vdop REAL NOT NULL,
        xdop REAL NOT NULL,
        ydop REAL NOT NULL,
        seen INTEGER NOT NULL,
        used INTEGER NOT NULL,
        ttff INTEGER NOT NULL,
        rf_jamming_state TEXT NOT NULL,
        rf_ant_status TEXT NOT NULL,
        rf_ant_power TEXT NOT NULL,
        rf_post_status INTEGER NOT NULL,
        rf_noise_per_ms INTEGER NOT NULL,
        rf_agc_cnt INTEGER NOT NULL,
        rf_jam_ind INTEGER NOT NULL,
        rf_ofsi INTEGER NOT NULL,
        rf_magi INTEGER NOT NULL,
        rf_ofsq INTEGER NOT NULL,
        rf_magq INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS gnss_time_idx ON gnss(time);",
    purge: "DELETE FROM gnss WHERE time < ?1",
};

const GNSS_INSERT: &str = "INSERT INTO gnss \
    (time, system_time, fix, eph, sep, latitude, longitude, altitude, heading, speed, \
    gdop, hdop, pdop, tdop, vdop, xdop, ydop, seen, used, ttff, \
    rf_jamming_state, rf_ant_status, rf_ant_power, rf_post_status, rf_noise_per_ms, \
    rf_agc_cnt, rf_jam_ind, rf_ofsi, rf_magi, rf_ofsq, rf_magq) VALUES";
const GNSS_FIELDS: &str = "(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, \
    ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, \
    ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

/// Latest 2D/3D position, newest first.
pub const LAST_POSITION_QUERY: &str = "SELECT latitude, longitude, altitude \
    FROM gnss WHERE fix = '3D' OR fix = '2D' ORDER BY time DESC LIMIT 1";

/// A full position fix.
#[derive(Debug, Clone, PartialEq)]
pub struct GnssRecord(pub Arc<PositionFix>);

impl Insertable for GnssRecord {
    fn insert_query(&self) -> InsertQuery {
        let f = &self.0;
        InsertQuery {
            statement: GNSS_INSERT,
            placeholders: GNSS_FIELDS,
            values: vec![
                Value::Text(sql_time(&f.timestamp)),
                Value::Text(sql_time(&f.system_time)),
                Value::Text(f.fix.as_str().to_string()),
                Value::from(f.eph),
                Value::from(f.sep),
                Value::Real(f.latitude),
                Value::Real(f.longitude),
                Value::Real(f.altitude),
                Value::Real(f.heading),
                Value::Real(f.speed),
                Value::Real(f.dop.gdop),
                Value::Real(f.dop.hdop),
                Value::Real(f.dop.pdop),
                Value::Real(f.dop.tdop),
                Value::Real(f.dop.vdop),
                Value::Real(f.dop.xdop),
                Value::Real(f.dop.ydop),
                Value::from(f.satellites.seen),
                Value::from(f.satellites.used),
                Value::Integer(f.ttff),
                Value::Text(f.rf.jamming_state.clone()),
                Value::Text(f.rf.ant_status.clone()),
                Value::Text(f.rf.ant_power.clone()),
                Value::from(f.rf.post_status),
                Value::from(f.rf.noise_per_ms),
                Value::from(f.rf.agc_cnt),
                Value::from(f.rf.jam_ind),
                Value::from(f.rf.ofs_i),
                Value::from(f.rf.mag_i),
                Value::from(f.rf.ofs_q),
                Value::from(f.rf.mag_q),
            ],
        }
    }
}

/// Every table the logger manages, in creation order.
pub const MANAGED_TABLES: &[TableSchema] = &[IMU_TABLE, MERGED_TABLE, DIRECTION_TABLE, GNSS_TABLE];
