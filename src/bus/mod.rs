//! Named-subscription fan-out bus.
//!
//! ```text
//!   publish(e) ──┐                          ┌──▶ Subscription "recorder"
//!                ├──▶ commands ──▶ run() ───┼──▶ Subscription "merger"
//!   subscribe ───┘   (bounded)    (owner)   └──▶ Subscription "sink"
//! ```
//!
//! The subscriber registry lives inside [`EventBus::run`]; `subscribe` and
//! `publish` are messages to that owner, so fan-out never races with
//! registration.  Each event is stamped once, when `publish` is called,
//! and delivered to every subscriber in publish order.  A full subscriber channel stalls the
//! owner, which stalls the command queue, which stalls `publish`: a slow
//! consumer slows the producer instead of losing events.

pub mod merger;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{debug, trace};

use crate::app::events::Published;

/// Pending commands (publish / subscribe) per bus.
pub const COMMAND_DEPTH: usize = 16;
/// Undelivered events buffered per subscriber.
pub const SUBSCRIBER_DEPTH: usize = 16;

type Delivery<T> = Channel<CriticalSectionRawMutex, Published<T>, SUBSCRIBER_DEPTH>;

enum BusCommand<T> {
    Subscribe {
        name: String,
        channel: Arc<Delivery<T>>,
    },
    Publish {
        published_at: DateTime<Utc>,
        event: T,
    },
}

// ───────────────────────────────────────────────────────────────
// Bus
// ───────────────────────────────────────────────────────────────

pub struct EventBus<T> {
    name: &'static str,
    commands: Channel<CriticalSectionRawMutex, BusCommand<T>, COMMAND_DEPTH>,
}

impl<T: Clone> EventBus<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            commands: Channel::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Register a delivery endpoint under `name`.
    ///
    /// A later registration under the same name replaces the earlier one;
    /// the replaced endpoint receives nothing further.
    pub async fn subscribe(&self, name: impl Into<String>) -> Subscription<T> {
        let name = name.into();
        let channel = Arc::new(Channel::new());
        self.commands
            .send(BusCommand::Subscribe {
                name: name.clone(),
                channel: channel.clone(),
            })
            .await;
        Subscription { name, channel }
    }

    /// Stamp `event` and queue it for fan-out.  Suspends while the bus is
    /// backed up; the stamp is the call time, not the delivery time.
    pub async fn publish(&self, event: T) {
        let published_at = Utc::now();
        self.commands
            .send(BusCommand::Publish {
                published_at,
                event,
            })
            .await;
    }

    /// Owner loop: applies registrations and fans events out.  Runs for the
    /// life of the pipeline.
    pub async fn run(&self) {
        let mut subscribers: BTreeMap<String, Arc<Delivery<T>>> = BTreeMap::new();

        loop {
            match self.commands.receive().await {
                BusCommand::Subscribe { name, channel } => {
                    debug!("[{}] subscribe '{}'", self.name, name);
                    subscribers.insert(name, channel);
                }
                BusCommand::Publish {
                    published_at,
                    event,
                } => {
                    if subscribers.is_empty() {
                        trace!("[{}] no subscribers, dropped", self.name);
                        continue;
                    }
                    for channel in subscribers.values() {
                        channel
                            .send(Published {
                                published_at,
                                event: event.clone(),
                            })
                            .await;
                    }
                }
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Subscription
// ───────────────────────────────────────────────────────────────

/// A subscriber's end of the bus.
pub struct Subscription<T> {
    name: String,
    channel: Arc<Delivery<T>>,
}

impl<T> Subscription<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Next delivered event, waiting if none is ready.
    pub async fn recv(&self) -> Published<T> {
        self.channel.receive().await
    }

    /// Next delivered event if one is already buffered.
    pub fn try_recv(&self) -> Option<Published<T>> {
        self.channel.try_receive().ok()
    }
}
