//! Per-device failure profiles.
//!
//! A [`DeviceFailureProfile`] owns the failing cells of one memory module
//! together with the inventory attributes the classifier needs. Profiles are
//! never empty: the constructor refuses an empty cell list, so every derived
//! view (row span, observation window) is total.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDateTime};
use dt_common::{DeviceId, ErrorKindSet, FailingCell, Permanency};
use dt_config::ClassifierOptions;
use serde::Serialize;

use crate::ingest::Inventory;
use crate::log_event;
use crate::logging::{event_names, LogContext, Stage};

/// Devices whose failures stop within this window are transient.
pub const TRANSIENT_WINDOW_HOURS: i64 = 24;

/// All failing cells of one device plus its hardware attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFailureProfile {
    device: DeviceId,
    dram_model: String,
    server_manufacturer: String,
    cells: Vec<FailingCell>,
}

impl DeviceFailureProfile {
    /// Returns `None` for an empty cell list or cells of another device.
    pub fn new(
        device: DeviceId,
        dram_model: impl Into<String>,
        server_manufacturer: impl Into<String>,
        cells: Vec<FailingCell>,
    ) -> Option<Self> {
        if cells.is_empty() || cells.iter().any(|c| c.device != device) {
            return None;
        }
        Some(DeviceFailureProfile {
            device,
            dram_model: dram_model.into(),
            server_manufacturer: server_manufacturer.into(),
            cells,
        })
    }

    pub fn device(&self) -> &DeviceId {
        &self.device
    }

    pub fn dram_model(&self) -> &str {
        &self.dram_model
    }

    pub fn server_manufacturer(&self) -> &str {
        &self.server_manufacturer
    }

    pub fn cells(&self) -> &[FailingCell] {
        &self.cells
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Earliest first occurrence over all cells.
    pub fn first_seen(&self) -> NaiveDateTime {
        self.cells
            .iter()
            .map(|c| c.first_seen)
            .min()
            .unwrap_or(NaiveDateTime::MIN)
    }

    /// Latest last occurrence over all cells.
    pub fn last_seen(&self) -> NaiveDateTime {
        self.cells
            .iter()
            .map(|c| c.last_seen)
            .max()
            .unwrap_or(NaiveDateTime::MIN)
    }

    /// Union of error kinds over all cells.
    pub fn kinds(&self) -> ErrorKindSet {
        self.cells
            .iter()
            .fold(ErrorKindSet::EMPTY, |acc, c| acc.union(c.kinds))
    }

    /// Total raw events behind this profile.
    pub fn event_count(&self) -> u64 {
        self.cells.iter().map(|c| c.count).sum()
    }

    /// Transient when the observation window is shorter than 24 hours.
    pub fn permanency(&self) -> Permanency {
        if self.last_seen() - self.first_seen() < Duration::hours(TRANSIENT_WINDOW_HOURS) {
            Permanency::Transient
        } else {
            Permanency::Permanent
        }
    }

    /// Address-shape summary consumed by the classification rules.
    pub fn features(&self) -> DeviceFeatures {
        DeviceFeatures::from_cells(&self.cells)
    }
}

/// Distinct-value views over a profile's cells.
///
/// `rows` is private so it stays sorted and deduplicated; the gap and span
/// arithmetic in the geometric rules relies on that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceFeatures {
    rows: Vec<u32>,
    pub distinct_cols: usize,
    pub distinct_banks: usize,
    pub distinct_ranks: usize,
    /// Distinct (row, col, rank, bank) tuples.
    pub distinct_locations: usize,
    pub cell_count: usize,
}

impl DeviceFeatures {
    pub fn from_cells(cells: &[FailingCell]) -> Self {
        let rows: BTreeSet<u32> = cells.iter().map(|c| c.row).collect();
        let cols: BTreeSet<u32> = cells.iter().map(|c| c.col).collect();
        let banks: BTreeSet<u32> = cells.iter().map(|c| c.bank).collect();
        let ranks: BTreeSet<u32> = cells.iter().map(|c| c.rank).collect();
        let locations: BTreeSet<_> = cells.iter().map(|c| c.coord()).collect();
        DeviceFeatures {
            rows: rows.into_iter().collect(),
            distinct_cols: cols.len(),
            distinct_banks: banks.len(),
            distinct_ranks: ranks.len(),
            distinct_locations: locations.len(),
            cell_count: cells.len(),
        }
    }

    /// Single-column, single-bank, single-rank view over `rows`, one cell
    /// per distinct row. Callers adjust the public counters as needed.
    pub fn from_rows(rows: impl IntoIterator<Item = u32>) -> Self {
        let rows: BTreeSet<u32> = rows.into_iter().collect();
        DeviceFeatures {
            distinct_cols: 1,
            distinct_banks: 1,
            distinct_ranks: 1,
            distinct_locations: rows.len(),
            cell_count: rows.len(),
            rows: rows.into_iter().collect(),
        }
    }

    /// Sorted distinct rows.
    pub fn rows(&self) -> &[u32] {
        &self.rows
    }

    pub fn distinct_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn min_row(&self) -> u32 {
        self.rows.first().copied().unwrap_or(0)
    }

    pub fn max_row(&self) -> u32 {
        self.rows.last().copied().unwrap_or(0)
    }

    /// max row - min row.
    pub fn row_span(&self) -> u32 {
        self.max_row() - self.min_row()
    }
}

/// Result of joining aggregated cells with the inventory.
#[derive(Debug, Clone, Default)]
pub struct ProfileSet {
    pub profiles: Vec<DeviceFailureProfile>,
    /// Devices with errors but no inventory row.
    pub missing_inventory: Vec<DeviceId>,
    /// Devices dropped because their DRAM model is excluded.
    pub excluded: Vec<DeviceId>,
}

/// Group cells by device and inner-join with the inventory.
///
/// Output is ordered by device id.
pub fn build_profiles(
    cells: Vec<FailingCell>,
    inventory: &Inventory,
    options: &ClassifierOptions,
    ctx: &LogContext,
) -> ProfileSet {
    let mut by_device: BTreeMap<DeviceId, Vec<FailingCell>> = BTreeMap::new();
    for cell in cells {
        by_device.entry(cell.device.clone()).or_default().push(cell);
    }

    let mut set = ProfileSet::default();
    for (device, cells) in by_device {
        let Some(info) = inventory.lookup(&device) else {
            log_event!(
                ctx,
                DEBUG,
                event_names::PROFILE_NO_INVENTORY,
                Stage::Profile,
                "device has no inventory row",
                device = device.to_string().as_str()
            );
            set.missing_inventory.push(device);
            continue;
        };
        if options.is_excluded(&info.dram_model) {
            log_event!(
                ctx,
                DEBUG,
                event_names::PROFILE_EXCLUDED_MODEL,
                Stage::Profile,
                "device model excluded",
                device = device.to_string().as_str(),
                dram_model = info.dram_model.as_str()
            );
            set.excluded.push(device);
            continue;
        }
        if let Some(profile) = DeviceFailureProfile::new(
            device,
            info.dram_model.clone(),
            info.server_manufacturer.clone(),
            cells,
        ) {
            set.profiles.push(profile);
        }
    }

    log_event!(
        ctx,
        INFO,
        event_names::PROFILE_FINISHED,
        Stage::Profile,
        "profiles built",
        devices = set.profiles.len() as u64,
        missing_inventory = set.missing_inventory.len() as u64,
        excluded = set.excluded.len() as u64
    );
    set
}
