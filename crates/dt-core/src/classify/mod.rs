//! Failure-mechanism classifier.
//!
//! Stages, applied to one population of device profiles:
//! 1. Multi-bit filter: fewer than three distinct locations is not a
//!    structural failure.
//! 2. Multi-socket: correlated windows across modules of one server.
//! 3. Multi-rank: failures spanning more than one rank.
//! 4. Geometric cascade over the remaining single-rank pool.
//! 5. Server-level refinement of `bank_control` devices.
//!
//! Every profile receives exactly one [`Category`]; labels are returned in
//! input order.

pub mod bank;
pub mod geometric;
pub mod socket;

use std::collections::BTreeMap;
use std::thread;

use dt_common::{Category, Error, Result};
use dt_config::{ClassifierOptions, Geometry};
use tracing::{debug, error};

use crate::profile::{DeviceFailureProfile, DeviceFeatures};

pub use bank::refine_bank_control;
pub use geometric::{classify_geometric, shape_of, Shape};
pub use socket::{overlapping_devices, Window};

/// Immutable classifier: geometry facts plus run options.
#[derive(Debug, Clone)]
pub struct Classifier {
    geometry: Geometry,
    options: ClassifierOptions,
}

impl Classifier {
    pub fn new(options: ClassifierOptions) -> Self {
        Self::with_geometry(Geometry::STANDARD, options)
    }

    pub fn with_geometry(geometry: Geometry, options: ClassifierOptions) -> Self {
        Classifier { geometry, options }
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn options(&self) -> &ClassifierOptions {
        &self.options
    }

    /// Label every profile. Output index `i` belongs to `profiles[i]`.
    ///
    /// Fails only if a geometric worker thread panics.
    pub fn classify(&self, profiles: &[DeviceFailureProfile]) -> Result<Vec<Category>> {
        let features: Vec<DeviceFeatures> = profiles.iter().map(|p| p.features()).collect();
        let mut labels: Vec<Option<Category>> = vec![None; profiles.len()];

        let mut multi_bit = Vec::new();
        for (i, f) in features.iter().enumerate() {
            if f.distinct_locations < self.geometry.multi_bit_min_locations {
                labels[i] = Some(Category::MultipleSingleBitFailures);
            } else {
                multi_bit.push(i);
            }
        }

        if self.options.msocket {
            for i in overlapping_devices(profiles, &multi_bit) {
                labels[i] = Some(Category::MultiSocket);
            }
        }

        let mut pool = Vec::new();
        for i in multi_bit {
            if labels[i].is_some() {
                continue;
            }
            if self.options.mrank && features[i].distinct_ranks > 1 {
                labels[i] = Some(Category::MultiRank);
            } else {
                pool.push(i);
            }
        }

        for (i, category) in self.classify_pool(profiles, &features, &pool)? {
            labels[i] = Some(category);
        }

        let mut labels: Vec<Category> = labels
            .into_iter()
            .map(|l| l.ok_or_else(|| Error::Classification("device left unlabeled".to_string())))
            .collect::<Result<_>>()?;

        let refined = refine_bank_control(profiles, &mut labels, &self.geometry);
        debug!(
            devices = profiles.len(),
            geometric = pool.len(),
            refined,
            "classification pass finished"
        );
        Ok(labels)
    }

    fn classify_one(&self, profile: &DeviceFailureProfile, features: &DeviceFeatures) -> Category {
        let csl_limit = self
            .geometry
            .csl_limit(profile.dram_model(), &self.options.narrow_csl_models);
        classify_geometric(features, &self.geometry, csl_limit)
    }

    /// Geometric cascade over `pool`, chunked over scoped threads when
    /// more than one worker is configured.
    fn classify_pool(
        &self,
        profiles: &[DeviceFailureProfile],
        features: &[DeviceFeatures],
        pool: &[usize],
    ) -> Result<Vec<(usize, Category)>> {
        let workers = self.options.workers.max(1);
        if workers == 1 || pool.len() < 2 {
            return Ok(pool
                .iter()
                .map(|&i| (i, self.classify_one(&profiles[i], &features[i])))
                .collect());
        }

        let chunk_size = pool.len().div_ceil(workers);
        thread::scope(|s| {
            let handles: Vec<_> = pool
                .chunks(chunk_size)
                .map(|chunk| {
                    s.spawn(move || {
                        chunk
                            .iter()
                            .map(|&i| (i, self.classify_one(&profiles[i], &features[i])))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            let mut merged = Vec::with_capacity(pool.len());
            for handle in handles {
                match handle.join() {
                    Ok(part) => merged.extend(part),
                    Err(_) => {
                        error!("classifier worker thread panicked");
                        return Err(Error::Classification("worker thread panicked".to_string()));
                    }
                }
            }
            Ok(merged)
        })
    }
}

/// Bucket profiles by label.
pub fn group_by_category<'a>(
    profiles: &'a [DeviceFailureProfile],
    labels: &[Category],
) -> BTreeMap<Category, Vec<&'a DeviceFailureProfile>> {
    let mut groups: BTreeMap<Category, Vec<&DeviceFailureProfile>> = BTreeMap::new();
    for (profile, label) in profiles.iter().zip(labels) {
        groups.entry(*label).or_default().push(profile);
    }
    groups
}
