//! Stream merger.
//!
//! Joins any number of upstream subscriptions onto one bus.  Events are
//! forwarded verbatim (the [`Event`] variant is the origin tag); order per
//! upstream is preserved, interleaving across upstreams is whatever the
//! executor delivers.  No re-sequencing by timestamp.

use core::future::Future;
use core::pin::Pin;

use futures_lite::future;
use log::trace;

use super::{EventBus, Subscription};
use crate::app::events::Event;

pub struct StreamMerger {
    bus: EventBus<Event>,
}

impl Default for StreamMerger {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamMerger {
    pub fn new() -> Self {
        Self {
            bus: EventBus::new("merged"),
        }
    }

    /// The merged output bus.  Its owner loop must be running.
    pub fn bus(&self) -> &EventBus<Event> {
        &self.bus
    }

    pub async fn subscribe(&self, name: impl Into<String>) -> Subscription<Event> {
        self.bus.subscribe(name).await
    }

    /// Forward every upstream onto the merged bus until dropped.
    pub async fn run(&self, upstreams: Vec<Subscription<Event>>) {
        let mut forwarders: Pin<Box<dyn Future<Output = ()> + '_>> = Box::pin(future::pending());
        for upstream in upstreams {
            forwarders = Box::pin(future::race(forwarders, self.forward(upstream)));
        }
        forwarders.await;
    }

    async fn forward(&self, upstream: Subscription<Event>) {
        loop {
            let delivered = upstream.recv().await;
            trace!(
                "merge {} from '{}'",
                delivered.event.origin(),
                upstream.name()
            );
            self.bus.publish(delivered.event).await;
        }
    }
}
