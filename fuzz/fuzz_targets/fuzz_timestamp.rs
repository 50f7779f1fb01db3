//! Fuzz target for timestamp parsing, including the year-0001 remap.

#![no_main]

use dt_core::ingest::parse_timestamp;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let _ = parse_timestamp(data, true);
    let _ = parse_timestamp(data, false);
});
