//! Raw sample poller.
//!
//! Acquires one sample per tick from the [`SampleSource`] and publishes it
//! on the raw bus.  An angular rate beyond [`ANGULAR_RATE_BOUND`] on any
//! axis means the device has wedged: it is reinitialised and the sample is
//! discarded.  A read error is fatal to the poller.
//!
//! With `interval = None` the poller only yields between reads, so tests
//! can push scripted samples through without real timers.

use core::time::Duration;

use futures_lite::future;
use log::{info, warn};

use crate::app::events::Event;
use crate::app::ports::SampleSource;
use crate::bus::{EventBus, Subscription};
use crate::error::Result;

/// Angular-rate safety bound (degrees per second).
pub const ANGULAR_RATE_BOUND: f64 = 2000.0;

pub struct RawFeed {
    bus: EventBus<Event>,
}

impl Default for RawFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl RawFeed {
    pub fn new() -> Self {
        Self {
            bus: EventBus::new("raw"),
        }
    }

    pub fn bus(&self) -> &EventBus<Event> {
        &self.bus
    }

    pub async fn subscribe(&self, name: impl Into<String>) -> Subscription<Event> {
        self.bus.subscribe(name).await
    }

    /// Poll `source` until it is exhausted or fails.
    pub async fn run<S: SampleSource>(&self, mut source: S, interval: Option<Duration>) -> Result<()> {
        let mut reinits: u32 = 0;

        loop {
            match interval {
                Some(period) => {
                    async_io_mini::Timer::after(period).await;
                }
                None => future::yield_now().await,
            }

            let Some(sample) = source.read()? else {
                info!("Sample source exhausted after {} reinit(s)", reinits);
                return Ok(());
            };

            let rate = sample.angular_rate.peak();
            if rate > ANGULAR_RATE_BOUND {
                reinits += 1;
                warn!(
                    "Angular rate {:.0} dps beyond {:.0}, reinitialising IMU (#{})",
                    rate, ANGULAR_RATE_BOUND, reinits
                );
                source.reinit()?;
                continue;
            }

            self.bus.publish(Event::Raw(sample)).await;
        }
    }
}
