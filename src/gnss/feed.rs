//! Position side stream.
//!
//! The positioning collaborator runs on its own thread and hands fixes to
//! [`PositionFeed::submit_blocking`] (or `submit` from async code).  The
//! feed unit then, for each fix in arrival order:
//!
//! 1. replaces the [`CurrentFix`] register,
//! 2. persists the fix once storing has started (first fix with a
//!    quality other than `none`),
//! 3. publishes it on the position bus for merging.

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use futures_lite::future;
use log::info;

use super::PositionFix;
use super::current::CurrentFix;
use crate::app::events::Event;
use crate::bus::{EventBus, Subscription};
use crate::storage::PersistenceEngine;
use crate::storage::records::GnssRecord;

/// Fixes buffered between the collaborator and the feed unit.
pub const INBOX_DEPTH: usize = 8;

pub struct PositionFeed {
    inbox: Channel<CriticalSectionRawMutex, PositionFix, INBOX_DEPTH>,
    bus: EventBus<Event>,
    storing: AtomicBool,
}

impl Default for PositionFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionFeed {
    pub fn new() -> Self {
        Self {
            inbox: Channel::new(),
            bus: EventBus::new("position"),
            storing: AtomicBool::new(false),
        }
    }

    pub fn bus(&self) -> &EventBus<Event> {
        &self.bus
    }

    pub async fn subscribe(&self, name: impl Into<String>) -> Subscription<Event> {
        self.bus.subscribe(name).await
    }

    /// Hand a fix to the feed.  Suspends while the inbox is full.
    pub async fn submit(&self, fix: PositionFix) {
        self.inbox.send(fix).await;
    }

    /// [`submit`](Self::submit) for collaborator threads outside the executor.
    pub fn submit_blocking(&self, fix: PositionFix) {
        future::block_on(self.inbox.send(fix));
    }

    /// Hand a fix to the feed without waiting; `false` if the inbox is full.
    pub fn try_submit(&self, fix: PositionFix) -> bool {
        self.inbox.try_send(fix).is_ok()
    }

    /// True once a valid fix has been seen; fixes are persisted from then on.
    pub fn is_storing(&self) -> bool {
        self.storing.load(Ordering::Acquire)
    }

    pub async fn run(&self, current: &CurrentFix, engine: &PersistenceEngine) {
        loop {
            let fix = Arc::new(self.inbox.receive().await);

            if fix.fix.is_valid() && !self.storing.swap(true, Ordering::AcqRel) {
                info!(
                    "Start storing: first {} fix at {:.6},{:.6}",
                    fix.fix, fix.latitude, fix.longitude
                );
            }

            current.replace(fix.clone());
            if self.is_storing() {
                engine.log(&GnssRecord(fix.clone())).await;
            }
            self.bus.publish(Event::Position(fix)).await;
        }
    }
}
