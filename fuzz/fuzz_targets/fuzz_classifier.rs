//! Fuzz target: `MotionClassifier`
//!
//! Feeds arbitrary sample streams (including NaN, infinities and backward
//! time jumps) through the five trackers and verifies:
//! - No panics under arbitrary input
//! - At most one event per tracker kind per sample
//! - Every event is stamped with the time of the sample that produced it
//! - Samples that do not advance time never produce events
//!
//! cargo fuzz run fuzz_classifier

#![no_main]

use chrono::{DateTime, TimeDelta, Utc};
use libfuzzer_sys::fuzz_target;

use datalogger::config::ImuConfig;
use datalogger::imu::Acceleration;
use datalogger::imu::direction::MotionClassifier;

fuzz_target!(|data: &[u8]| {
    let Some((&window, rest)) = data.split_first() else {
        return;
    };

    let config = ImuConfig {
        turn_continuous_count_window: u32::from(window % 8) + 1,
        acceleration_continuous_count_window: u32::from(window % 5) + 1,
        deceleration_continuous_count_window: u32::from(window % 7) + 1,
        stop_continuous_count_window: u32::from(window % 3) + 1,
        stop_end_continuous_count_window: u32::from(window % 4) + 1,
        ..ImuConfig::default()
    };
    let mut classifier = MotionClassifier::from_config(&config);
    let mut last: Option<DateTime<Utc>> = None;

    // 10 bytes per sample: i16 time step (ms), f32 x, f32 y.
    let mut time = DateTime::<Utc>::UNIX_EPOCH + TimeDelta::days(1);
    for chunk in rest.chunks_exact(10) {
        let step = i16::from_le_bytes([chunk[0], chunk[1]]);
        let x = f32::from_le_bytes([chunk[2], chunk[3], chunk[4], chunk[5]]);
        let y = f32::from_le_bytes([chunk[6], chunk[7], chunk[8], chunk[9]]);
        time += TimeDelta::milliseconds(i64::from(step));

        let sample = Acceleration::new(time, f64::from(x), f64::from(y), 1.0);
        let advances = sample.is_finite() && last.is_none_or(|l| time > l);
        let events = classifier.classify(&sample);

        if !advances {
            assert!(events.is_empty(), "stale or non-finite sample emitted");
            continue;
        }
        last = Some(time);

        for (i, e) in events.iter().enumerate() {
            assert_eq!(e.occurred_at, time);
            assert!(events[..i].iter().all(|other| other.kind != e.kind));
        }
    }
});
