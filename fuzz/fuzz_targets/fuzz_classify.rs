//! Fuzz target for the classifier.
//!
//! Arbitrary failing-cell sets must always yield exactly one label per device.

#![no_main]

use arbitrary::Arbitrary;
use chrono::{Duration, NaiveDate};
use dt_common::{DeviceId, ErrorKind, ErrorKindSet, FailingCell};
use dt_config::ClassifierOptions;
use dt_core::classify::Classifier;
use dt_core::profile::DeviceFailureProfile;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct FuzzCell {
    rank: u8,
    bank: u8,
    row: u32,
    col: u16,
    start: u16,
    len: u16,
    scrub: bool,
}

#[derive(Debug, Arbitrary)]
struct FuzzDevice {
    server: u8,
    module: u8,
    cells: Vec<FuzzCell>,
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    msocket: bool,
    mrank: bool,
    workers: u8,
    devices: Vec<FuzzDevice>,
}

fuzz_target!(|input: FuzzInput| {
    let base = NaiveDate::from_ymd_opt(2020, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid base date");
    let mut seen = std::collections::BTreeSet::new();
    let profiles: Vec<DeviceFailureProfile> = input
        .devices
        .iter()
        .filter(|d| seen.insert((d.server, d.module)))
        .filter_map(|d| {
            let device = DeviceId::new(format!("srv{}", d.server), u32::from(d.module));
            let cells = d
                .cells
                .iter()
                .map(|c| FailingCell {
                    device: device.clone(),
                    rank: u32::from(c.rank % 4),
                    bank: u32::from(c.bank % 16),
                    row: c.row,
                    col: u32::from(c.col),
                    first_seen: base + Duration::hours(i64::from(c.start)),
                    last_seen: base + Duration::hours(i64::from(c.start) + i64::from(c.len)),
                    count: 1,
                    kinds: ErrorKindSet::single(if c.scrub { ErrorKind::Scrub } else { ErrorKind::Read }),
                })
                .collect();
            DeviceFailureProfile::new(device, "A1", "M1", cells)
        })
        .collect();

    let classifier = Classifier::new(ClassifierOptions {
        msocket: input.msocket,
        mrank: input.mrank,
        workers: usize::from(input.workers % 8).max(1),
        ..ClassifierOptions::default()
    });
    let labels = classifier.classify(&profiles).expect("classifier never fails on valid profiles");
    assert_eq!(labels.len(), profiles.len());
});
