//! Merged-stream recorder.
//!
//! Subscribes to the merged bus and turns each event into a persisted
//! record:
//!
//! | Event       | Record                                   | Needs a fix |
//! |-------------|------------------------------------------|-------------|
//! | `Raw`       | `imu` row (if `persist_raw_samples`)     | no          |
//! | `Corrected` | `merged` row (if `persist_merged_samples`)| yes        |
//! | `Motion`    | `direction_events` row                   | yes         |
//! | `Position`  | nothing (the position feed stores fixes) | -           |
//!
//! Pairing with a fix before any was received is fatal to the recorder.

use crate::app::events::{Event, Published};
use crate::bus::Subscription;
use crate::error::Result;
use crate::gnss::current::CurrentFix;
use crate::storage::PersistenceEngine;
use crate::storage::records::{ImuRecord, MergedRecord};

pub struct Recorder<'a> {
    engine: &'a PersistenceEngine,
    current: &'a CurrentFix,
    persist_raw: bool,
    persist_merged: bool,
}

impl<'a> Recorder<'a> {
    pub fn new(engine: &'a PersistenceEngine, current: &'a CurrentFix) -> Self {
        Self {
            engine,
            current,
            persist_raw: true,
            persist_merged: true,
        }
    }

    pub fn persist_raw(mut self, enabled: bool) -> Self {
        self.persist_raw = enabled;
        self
    }

    pub fn persist_merged(mut self, enabled: bool) -> Self {
        self.persist_merged = enabled;
        self
    }

    pub async fn run(&self, merged: Subscription<Event>) -> Result<()> {
        loop {
            let delivered = merged.recv().await;
            self.handle(&delivered).await?;
        }
    }

    /// Persist one delivered event.
    pub async fn handle(&self, delivered: &Published<Event>) -> Result<()> {
        match &delivered.event {
            Event::Raw(sample) => {
                if self.persist_raw {
                    self.engine.log(&ImuRecord(*sample)).await;
                }
            }
            Event::Corrected(acceleration) => {
                if self.persist_merged {
                    let record = MergedRecord::pair(*acceleration, self.current)?;
                    self.engine.log(&record).await;
                }
            }
            Event::Motion(motion) => {
                let record = MergedRecord::pair(*motion, self.current)?;
                self.engine.log(&record).await;
            }
            Event::Position(_) => {}
        }
        Ok(())
    }
}
