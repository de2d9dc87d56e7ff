//! EventBus and StreamMerger behaviour under fan-out and backpressure.

use futures_lite::future;

use datalogger::app::events::Event;
use datalogger::bus::merger::StreamMerger;
use datalogger::bus::{EventBus, SUBSCRIBER_DEPTH};
use datalogger::imu::Acceleration;

use crate::mock_io::sample_time;

#[test]
fn fan_out_to_many_subscribers() {
    const SUBSCRIBERS: usize = 7;
    const EVENTS: u32 = 12;

    let bus = EventBus::new("fan-out");
    future::block_on(future::or(
        async {
            let mut subs = Vec::new();
            for i in 0..SUBSCRIBERS {
                subs.push(bus.subscribe(format!("sub-{i}")).await);
            }
            for e in 0..EVENTS {
                bus.publish(e).await;
            }
            for sub in &subs {
                let mut got = Vec::new();
                for _ in 0..EVENTS {
                    got.push(sub.recv().await.event);
                }
                assert_eq!(got, (0..EVENTS).collect::<Vec<_>>(), "{}", sub.name());
                assert!(sub.try_recv().is_none());
            }
        },
        bus.run(),
    ));
}

#[test]
fn slow_subscriber_throttles_publisher_without_loss() {
    const EVENTS: u32 = (SUBSCRIBER_DEPTH as u32) * 10;

    let bus = EventBus::new("backpressure");
    future::block_on(future::or(
        async {
            let fast = bus.subscribe("fast").await;
            let slow = bus.subscribe("slow").await;

            let publisher = async {
                for e in 0..EVENTS {
                    bus.publish(e).await;
                }
            };
            let consumers = async {
                for expected in 0..EVENTS {
                    assert_eq!(fast.recv().await.event, expected);
                    // The slow one reads every event, just later.
                    future::yield_now().await;
                    future::yield_now().await;
                    assert_eq!(slow.recv().await.event, expected);
                }
            };
            future::zip(publisher, consumers).await;
        },
        bus.run(),
    ));
}

#[test]
fn merger_keeps_per_upstream_order() {
    let a = EventBus::new("a");
    let b = EventBus::new("b");
    let merger = StreamMerger::new();

    let buses = future::or(future::or(a.run(), b.run()), merger.bus().run());
    let test = async {
        let out = merger.subscribe("out").await;
        let upstreams = vec![a.subscribe("merger").await, b.subscribe("merger").await];

        let body = async {
            for i in 0..8 {
                a.publish(Event::Corrected(Acceleration::new(sample_time(i), 1.0, 0.0, 1.0)))
                    .await;
                b.publish(Event::Corrected(Acceleration::new(sample_time(i), 2.0, 0.0, 1.0)))
                    .await;
            }
            let mut from_a = Vec::new();
            let mut from_b = Vec::new();
            for _ in 0..16 {
                let Event::Corrected(s) = out.recv().await.event else {
                    panic!("unexpected event kind");
                };
                if s.x < 1.5 {
                    from_a.push(s.time);
                } else {
                    from_b.push(s.time);
                }
            }
            let expected: Vec<_> = (0..8).map(sample_time).collect();
            assert_eq!(from_a, expected);
            assert_eq!(from_b, expected);
        };
        future::or(body, merger.run(upstreams)).await;
    };
    future::block_on(future::or(test, buses));
}
