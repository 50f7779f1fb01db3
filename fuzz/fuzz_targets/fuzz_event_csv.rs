//! Fuzz target for error-event CSV parsing.
//!
//! Tests that `parse_events_content` and aggregation handle arbitrary input
//! without panicking.

#![no_main]

use dt_core::aggregate::aggregate_events;
use dt_core::ingest::parse_events_content;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    if let Ok(outcome) = parse_events_content("events.csv", data, true) {
        let _ = aggregate_events(&outcome.records);
    }
});
