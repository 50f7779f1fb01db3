//! Fuzz target for classifier.json parsing and validation.

#![no_main]

use dt_config::validate::validate_config;
use dt_config::ClassifierConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(config) = serde_json::from_slice::<ClassifierConfig>(data) {
        let _ = validate_config(&config);
    }
});
