//! Fuzz target for stored unlock record decoding
//!
//! Whatever sits in the store, reading it must degrade to "locked" instead of
//! failing.
//!
//! # Strategy
//!
//! - Raw bytes: arbitrary strings stored under the record key
//! - Near misses: valid records with extra fields, wrong types, negative or
//!   fractional timestamps
//! - Clock: arbitrary "now" and window, including records from the future
//!
//! # Invariants
//!
//! - NEVER panic on any stored value
//! - `check_access` agrees with `UnlockRecord::parse` plus the window rule
//! - `unlocked_until` is `Some` exactly when `check_access` is true

#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use gatehouse_core::{
    AccessController, ControllerConfig, DEFAULT_RECORD_KEY, MemoryStore, Store, UnlockRecord,
};
use gatehouse_harness::SimEnv;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum StoredValue {
    Raw(String),
    Timestamp { timestamp: i64, extra: Option<String> },
    Float(f64),
}

impl StoredValue {
    fn render(&self) -> String {
        match self {
            Self::Raw(raw) => raw.clone(),
            Self::Timestamp { timestamp, extra: Some(extra) } => {
                format!("{{\"timestamp\":{timestamp},\"note\":{extra:?}}}")
            },
            Self::Timestamp { timestamp, extra: None } => format!("{{\"timestamp\":{timestamp}}}"),
            Self::Float(value) => format!("{{\"timestamp\":{value}}}"),
        }
    }
}

#[derive(Debug, Arbitrary)]
struct Input {
    value: StoredValue,
    now_ms: u64,
    window_hours: u16,
}

fuzz_target!(|input: Input| {
    let raw = input.value.render();
    let window = Duration::from_secs(u64::from(input.window_hours) * 60 * 60);

    let store = MemoryStore::new();
    store.set(DEFAULT_RECORD_KEY, &raw).expect("memory store accepts writes");

    let controller = AccessController::with_config(
        SimEnv::starting_at(input.now_ms),
        store,
        ControllerConfig::default().with_unlock_duration(window),
    );

    let expected =
        UnlockRecord::parse(&raw).is_ok_and(|record| record.is_valid_at(input.now_ms, window));
    let unlocked = controller.check_access();

    assert_eq!(unlocked, expected, "stored {raw:?}");
    assert_eq!(controller.unlocked_until().is_some(), unlocked);
});
