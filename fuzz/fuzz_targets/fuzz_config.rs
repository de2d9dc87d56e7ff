//! Fuzz target: `LoggerConfig::from_json`
//!
//! Parses arbitrary bytes as a configuration document and verifies:
//! - No panics under arbitrary input
//! - Anything accepted also passes `validate`
//! - Anything accepted survives a serialise / parse round-trip unchanged
//!
//! cargo fuzz run fuzz_config

#![no_main]

use libfuzzer_sys::fuzz_target;

use datalogger::config::LoggerConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(config) = LoggerConfig::from_json(text) else {
        return;
    };

    assert!(config.validate().is_ok());

    let json = serde_json::to_string(&config).expect("config serialises");
    let reparsed = LoggerConfig::from_json(&json).expect("accepted config must re-parse");
    assert_eq!(config, reparsed);
});
