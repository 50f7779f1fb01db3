//! Server-level refinement of `bank_control` devices.
//!
//! Bank-control devices carrying any non-read error kind are pooled per
//! server. A small pooled cell count points at a sense amplifier, a large
//! one at a column-select line. Read-only devices keep their label.

use std::collections::BTreeMap;

use dt_common::{Category, ErrorKind, ServerId};
use dt_config::Geometry;

use crate::profile::DeviceFailureProfile;

/// Rewrite `BankControl` labels in place. Returns the number of devices relabeled.
pub fn refine_bank_control(
    profiles: &[DeviceFailureProfile],
    labels: &mut [Category],
    geometry: &Geometry,
) -> usize {
    let eligible: Vec<usize> = labels
        .iter()
        .enumerate()
        .filter(|(i, label)| {
            **label == Category::BankControl && !profiles[*i].kinds().is_only(ErrorKind::Read)
        })
        .map(|(i, _)| i)
        .collect();

    let mut cells_per_server: BTreeMap<&ServerId, usize> = BTreeMap::new();
    for &i in &eligible {
        *cells_per_server.entry(&profiles[i].device().sid).or_default() += profiles[i].cell_count();
    }

    for &i in &eligible {
        let total = cells_per_server
            .get(&profiles[i].device().sid)
            .copied()
            .unwrap_or(0);
        labels[i] = if total <= geometry.refine_cell_budget {
            Category::PotentialSenseAmp
        } else {
            Category::PotentialCslColumn
        };
    }
    eligible.len()
}
