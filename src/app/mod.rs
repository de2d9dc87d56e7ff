//! Application core: event types and port traits.
//!
//! The pipeline stages in [`imu`](crate::imu), [`gnss`](crate::gnss),
//! [`bus`](crate::bus) and [`storage`](crate::storage) exchange the types
//! in [`events`] and reach their collaborators only through [`ports`],
//! keeping every stage testable without real devices.

pub mod events;
pub mod ports;
