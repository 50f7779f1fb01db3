//! Property-based tests for classifier invariants.

use std::collections::{BTreeMap, BTreeSet};

use dt_common::{Category, DeviceId, ErrorEvent, ErrorKind, FailingCell, LogicalClass};
use dt_config::ClassifierOptions;
use dt_core::aggregate::aggregate_events;
use dt_core::classify::{group_by_category, Classifier};
use dt_core::profile::DeviceFailureProfile;
use dt_core::test_utils::{profile_at, profile_from_rows, ProfileBuilder};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

type Coord = (u32, u32, u32, u32);

fn coords_strategy() -> impl Strategy<Value = BTreeSet<Coord>> {
    prop::collection::btree_set(
        (
            0u32..2,
            0u32..3,
            prop_oneof![0u32..64, 0u32..80_000],
            0u32..4,
        ),
        1..12,
    )
}

fn population_strategy() -> impl Strategy<Value = Vec<DeviceFailureProfile>> {
    prop::collection::vec(
        (0u8..3, 0u32..4, 0i64..100, 0i64..100, any::<bool>(), coords_strategy()),
        1..10,
    )
    .prop_map(|devices| {
        let mut seen = BTreeSet::new();
        let mut profiles = Vec::new();
        for (sid, mem, a, b, scrub, coords) in devices {
            if !seen.insert((sid, mem)) {
                continue;
            }
            let mut builder = ProfileBuilder::new(&format!("srv{}", sid), mem)
                .model(if mem % 2 == 0 { "A1" } else { "B1" })
                .window(a.min(b), a.max(b));
            if scrub {
                builder = builder.kind(ErrorKind::Scrub);
            }
            for (rank, bank, row, col) in coords {
                builder = builder.cell(rank, bank, row, col);
            }
            profiles.push(builder.build());
        }
        profiles
    })
}

/// Rebuild profiles from synthetic events at each cell's first and last sighting.
fn regenerate(profiles: &[&DeviceFailureProfile]) -> Vec<DeviceFailureProfile> {
    let mut events = Vec::new();
    for profile in profiles {
        for cell in profile.cells() {
            for kind in cell.kinds.iter() {
                for timestamp in [cell.first_seen, cell.last_seen] {
                    events.push(ErrorEvent {
                        device: cell.device.clone(),
                        rank: cell.rank,
                        bank: cell.bank,
                        row: cell.row,
                        col: cell.col,
                        kind,
                        timestamp,
                    });
                }
            }
        }
    }

    let mut by_device: BTreeMap<DeviceId, Vec<FailingCell>> = BTreeMap::new();
    for cell in aggregate_events(&events) {
        by_device.entry(cell.device.clone()).or_default().push(cell);
    }
    profiles
        .iter()
        .map(|p| {
            let cells = by_device.remove(p.device()).unwrap_or_default();
            DeviceFailureProfile::new(
                p.device().clone(),
                p.dram_model(),
                p.server_manufacturer(),
                cells,
            )
            .expect("regenerated profile has cells")
        })
        .collect()
}

fn default_classifier() -> Classifier {
    Classifier::new(ClassifierOptions::default())
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    /// Every profile lands in exactly one bucket.
    #[test]
    fn labels_partition_the_input(profiles in population_strategy()) {
        let labels = default_classifier().classify(&profiles).unwrap();
        prop_assert_eq!(labels.len(), profiles.len());
        let groups = group_by_category(&profiles, &labels);
        let total: usize = groups.values().map(Vec::len).sum();
        prop_assert_eq!(total, profiles.len());
    }

    /// Fewer than three distinct locations is exactly the single-bit bucket.
    #[test]
    fn multi_bit_threshold(profiles in population_strategy()) {
        let labels = default_classifier().classify(&profiles).unwrap();
        for (profile, label) in profiles.iter().zip(&labels) {
            let single_bit = profile.features().distinct_locations < 3;
            prop_assert_eq!(single_bit, *label == Category::MultipleSingleBitFailures);
        }
    }

    /// Geometric labels agree with the address shape they describe.
    #[test]
    fn labels_match_address_shape(profiles in population_strategy()) {
        let labels = default_classifier().classify(&profiles).unwrap();
        for (profile, label) in profiles.iter().zip(&labels) {
            let f = profile.features();
            match label.logical_class() {
                LogicalClass::SingleColumn => {
                    prop_assert!(f.distinct_cols == 1 && f.distinct_banks == 1);
                }
                LogicalClass::SingleRow => {
                    prop_assert!(f.distinct_rows() == 1 && f.distinct_banks == 1 && f.distinct_cols > 1);
                }
                LogicalClass::SingleBank => {
                    prop_assert!(f.distinct_banks == 1 && f.distinct_cols > 1 && f.distinct_rows() > 1);
                }
                LogicalClass::MultiBank => prop_assert!(f.distinct_banks > 1),
                LogicalClass::MultiRank => prop_assert!(f.distinct_ranks > 1),
                _ => {}
            }
        }
    }

    /// Re-classifying one category's devices from regenerated events gives the same label.
    #[test]
    fn classification_is_idempotent(profiles in population_strategy()) {
        let classifier = default_classifier();
        let labels = classifier.classify(&profiles).unwrap();
        for (category, members) in group_by_category(&profiles, &labels) {
            let rerun = classifier.classify(&regenerate(&members)).unwrap();
            prop_assert!(
                rerun.iter().all(|l| *l == category),
                "{} re-classified as {:?}", category, rerun
            );
        }
    }

    /// Worker count never changes the result.
    #[test]
    fn parallel_run_matches_sequential(profiles in population_strategy(), workers in 2usize..6) {
        let sequential = default_classifier().classify(&profiles).unwrap();
        let parallel = Classifier::new(ClassifierOptions {
            workers,
            ..ClassifierOptions::default()
        })
        .classify(&profiles)
        .unwrap();
        prop_assert_eq!(sequential, parallel);
    }

    /// Disabled stages never produce their label.
    #[test]
    fn disabled_stages_are_silent(profiles in population_strategy()) {
        let labels = Classifier::new(ClassifierOptions {
            msocket: false,
            mrank: false,
            ..ClassifierOptions::default()
        })
        .classify(&profiles)
        .unwrap();
        prop_assert!(labels
            .iter()
            .all(|l| *l != Category::MultiSocket && *l != Category::MultiRank));
    }
}

// ============================================================================
// Worked examples
// ============================================================================

#[test]
fn sense_amp_cluster_example() {
    let p = profile_from_rows("s", 0, &[0, 1, 2, 1024, 1025], 9);
    assert_eq!(
        default_classifier().classify(&[p]).unwrap(),
        vec![Category::SingleSenseAmp]
    );
}

#[test]
fn decoder_stride_example() {
    let p = profile_from_rows("s", 0, &[0, 2000, 64512], 9);
    assert_eq!(
        default_classifier().classify(&[p]).unwrap(),
        vec![Category::DecoderSingleCol]
    );
}

#[test]
fn bank_control_example() {
    let five = ProfileBuilder::new("s", 0)
        .cell(0, 0, 1, 5)
        .cell(0, 1, 2, 9)
        .cell(0, 2, 3, 5)
        .cell(0, 0, 4, 9)
        .cell(0, 1, 5, 5)
        .build();
    let three = ProfileBuilder::new("t", 0)
        .cell(0, 0, 1, 5)
        .cell(0, 1, 2, 9)
        .cell(0, 2, 3, 5)
        .build();
    assert_eq!(
        default_classifier().classify(&[five, three]).unwrap(),
        vec![Category::BankControl, Category::NotClusteredMultiBank]
    );
}

#[test]
fn multi_socket_overlap_example() {
    let classifier = default_classifier();
    let overlapping = [
        profile_at("s", 0, &[1, 2, 3], 0, 5),
        profile_at("s", 1, &[1, 2, 3], 2, 7),
    ];
    assert_eq!(
        classifier.classify(&overlapping).unwrap(),
        vec![Category::MultiSocket, Category::MultiSocket]
    );

    let disjoint = [
        profile_at("s", 0, &[1, 2, 3], 0, 1),
        profile_at("s", 1, &[1, 2, 3], 5, 7),
    ];
    assert!(classifier
        .classify(&disjoint)
        .unwrap()
        .iter()
        .all(|l| *l != Category::MultiSocket));
}
