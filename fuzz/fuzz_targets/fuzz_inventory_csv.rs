//! Fuzz target for inventory CSV parsing.

#![no_main]

use dt_core::ingest::{parse_inventory_content, Inventory};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    if let Ok(outcome) = parse_inventory_content("inventory.csv", data) {
        let _ = Inventory::from_records(outcome.records);
    }
});
