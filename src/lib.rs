//! Datalogger library.
//!
//! The onboard event pipeline: inertial sampling, motion classification,
//! named-subscription buses, stream merging and batched SQLite persistence
//! with TTL purging.  Device drivers and the positioning receiver plug in
//! through the traits in [`app::ports`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod bus;
pub mod config;
pub mod error;
pub mod gnss;
pub mod imu;
pub mod pipeline;
pub mod recorder;
pub mod storage;
