//! Positioning subsystem: fix records and the position side stream.
//!
//! The positioning receiver itself is an outside collaborator; it hands
//! decoded [`PositionFix`]es to the [`PositionFeed`](feed::PositionFeed),
//! which keeps the [`CurrentFix`](current::CurrentFix) register up to date,
//! persists the fix, and republishes it for merging.

pub mod current;
pub mod feed;

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Categorical confidence of a position reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FixQuality {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "2D")]
    TwoD,
    #[serde(rename = "3D")]
    ThreeD,
}

impl FixQuality {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::TwoD => "2D",
            Self::ThreeD => "3D",
        }
    }

    /// True for 2D and 3D fixes.
    pub fn is_valid(self) -> bool {
        self != Self::None
    }
}

impl fmt::Display for FixQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dilution-of-precision set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Dop {
    pub gdop: f64,
    pub hdop: f64,
    pub pdop: f64,
    pub tdop: f64,
    pub vdop: f64,
    pub xdop: f64,
    pub ydop: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Satellites {
    pub seen: u32,
    pub used: u32,
}

/// RF front-end health as reported by the receiver's monitor message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RfStatus {
    pub jamming_state: String,
    pub ant_status: String,
    pub ant_power: String,
    pub post_status: u32,
    pub noise_per_ms: u32,
    pub agc_cnt: u32,
    pub jam_ind: u32,
    pub ofs_i: i32,
    pub mag_i: u32,
    pub ofs_q: i32,
    pub mag_q: u32,
}

/// One decoded navigation solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    /// Receiver (GNSS) time of the solution.
    pub timestamp: DateTime<Utc>,
    /// Host clock when the solution was decoded.
    pub system_time: DateTime<Utc>,
    pub fix: FixQuality,
    /// Estimated horizontal position error (mm).
    pub eph: u32,
    /// Estimated spherical position error (mm).
    pub sep: u32,
    pub latitude: f64,
    pub longitude: f64,
    /// Metres above mean sea level.
    pub altitude: f64,
    /// Degrees from true north.
    pub heading: f64,
    /// Ground speed (m/s).
    pub speed: f64,
    pub dop: Dop,
    pub satellites: Satellites,
    /// Time to first fix (ms).
    pub ttff: i64,
    pub rf: RfStatus,
}

impl PositionFix {
    /// A fix carrying only quality and coordinates; every health field is zero.
    pub fn at(
        timestamp: DateTime<Utc>,
        fix: FixQuality,
        latitude: f64,
        longitude: f64,
        altitude: f64,
    ) -> Self {
        Self {
            timestamp,
            system_time: timestamp,
            fix,
            eph: 0,
            sep: 0,
            latitude,
            longitude,
            altitude,
            heading: 0.0,
            speed: 0.0,
            dop: Dop::default(),
            satellites: Satellites::default(),
            ttff: 0,
            rf: RfStatus::default(),
        }
    }
}

/// Latitude / longitude / altitude triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}
