//! Address-geometry rules.
//!
//! Each rule is a pure predicate over [`DeviceFeatures`]; [`classify_geometric`]
//! evaluates them in a fixed priority order and the first match wins. A rule
//! that needs "the first row past a threshold" simply does not match when no
//! such row exists.

use dt_common::Category;
use dt_config::{Band, Geometry};

use crate::profile::DeviceFeatures;

// ============================================================================
// Shape classes
// ============================================================================

/// Coarse address shape, decided before any leaf rule runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    SingleColumn,
    SingleRow,
    SingleBank,
    MultiBank,
}

pub fn shape_of(f: &DeviceFeatures) -> Shape {
    if f.distinct_banks > 1 {
        Shape::MultiBank
    } else if f.distinct_cols == 1 {
        Shape::SingleColumn
    } else if f.distinct_rows() == 1 {
        Shape::SingleRow
    } else {
        Shape::SingleBank
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Smallest row that is at least `min + offset`.
fn first_row_at_or_beyond(f: &DeviceFeatures, offset: u32) -> Option<u32> {
    let threshold = f.min_row().saturating_add(offset);
    f.rows().iter().copied().find(|&r| r >= threshold)
}

/// Span of the rows strictly above `min + offset`; 0 when there are none.
fn span_beyond(f: &DeviceFeatures, offset: u32) -> u32 {
    let threshold = f.min_row().saturating_add(offset);
    let mut above = f.rows().iter().copied().filter(|&r| r > threshold);
    match above.next() {
        Some(first) => above.last().map(|last| last - first).unwrap_or(0),
        None => 0,
    }
}

/// Every gap between sorted distinct rows, taken modulo `period`, falls in a band.
fn gaps_within_bands(f: &DeviceFeatures, period: u32, bands: &[Band; 2]) -> bool {
    f.rows().windows(2).all(|w| {
        let gap = (w[1] - w[0]) % period;
        bands.iter().any(|b| b.contains(gap))
    })
}

// ============================================================================
// Single column
// ============================================================================

pub fn is_single_sense_amp(f: &DeviceFeatures, g: &Geometry) -> bool {
    f.row_span() <= g.bank_rows
        && f.distinct_rows() <= g.sense_amp_max_rows
        && span_beyond(f, g.subarray_rows) <= g.subarray_rows
}

pub fn is_decoder_single_col(f: &DeviceFeatures, g: &Geometry) -> bool {
    f.row_span() >= g.decoder_stride
}

pub fn is_single_csl_column(f: &DeviceFeatures, csl_limit: u32) -> bool {
    f.row_span() <= csl_limit
}

fn classify_single_column(f: &DeviceFeatures, g: &Geometry, csl_limit: u32) -> Category {
    if is_single_sense_amp(f, g) {
        Category::SingleSenseAmp
    } else if is_decoder_single_col(f, g) {
        Category::DecoderSingleCol
    } else if is_single_csl_column(f, csl_limit) {
        Category::SingleCslColumn
    } else {
        Category::NotClusteredSingleColumn
    }
}

// ============================================================================
// Single bank
// ============================================================================

pub fn is_lwl_two_clusters(f: &DeviceFeatures, g: &Geometry) -> bool {
    f.distinct_rows() == 2 && f.distinct_cols > 2 && f.row_span() == g.bank_rows
}

pub fn is_consecutive_rows(f: &DeviceFeatures, g: &Geometry) -> bool {
    f.row_span() <= g.consecutive_rows_span && f.distinct_cols > 2
}

pub fn is_subarray_row_decoder(f: &DeviceFeatures, g: &Geometry) -> bool {
    f.row_span() <= g.subarray_rows && f.distinct_cols > 2
}

pub fn is_subarray_two_clusters(f: &DeviceFeatures, g: &Geometry) -> bool {
    f.distinct_cols > 2
        && first_row_at_or_beyond(f, g.subarray_rows)
            .is_some_and(|m| m - f.min_row() >= g.two_cluster_gap)
}

pub fn is_lwl_sel(f: &DeviceFeatures, g: &Geometry) -> bool {
    f.distinct_rows() > 2
        && f.distinct_cols > 2
        && gaps_within_bands(f, g.lwl_sel_period, &g.lwl_sel_bands)
        && f.row_span() >= g.bank_rows
}

pub fn is_lwl_sel2(f: &DeviceFeatures, g: &Geometry) -> bool {
    f.distinct_rows() > 2
        && f.distinct_cols > 2
        && gaps_within_bands(f, g.lwl_sel2_period, &g.lwl_sel2_bands)
        && f.row_span() >= g.bank_rows
}

pub fn is_global_row_decoder_two_clusters(f: &DeviceFeatures, g: &Geometry) -> bool {
    if f.distinct_cols <= 2 {
        return false;
    }
    match first_row_at_or_beyond(f, g.subbank_rows) {
        Some(m) => f
            .rows()
            .iter()
            .take_while(|&&r| r < m)
            .all(|&r| m - r >= g.two_cluster_gap),
        None => false,
    }
}

pub fn is_decoder_multi_col(f: &DeviceFeatures, g: &Geometry) -> bool {
    f.distinct_cols == 2
        && first_row_at_or_beyond(f, g.subbank_rows)
            .is_some_and(|m| m - f.min_row() >= g.decoder_stride)
}

pub fn is_single_csl_bank(f: &DeviceFeatures, csl_limit: u32) -> bool {
    f.distinct_cols == 2 && f.row_span() <= csl_limit
}

pub fn is_multi_csls(f: &DeviceFeatures, csl_limit: u32) -> bool {
    f.row_span() <= csl_limit
}

fn classify_single_bank(f: &DeviceFeatures, g: &Geometry, csl_limit: u32) -> Category {
    if is_lwl_two_clusters(f, g) {
        Category::LocalWordlineTwoClusters
    } else if is_consecutive_rows(f, g) {
        Category::ConsecutiveRows
    } else if is_subarray_row_decoder(f, g) {
        Category::SubarrayRowDecoder
    } else if is_subarray_two_clusters(f, g) {
        Category::SubarrayRowDecoderTwoClusters
    } else if is_lwl_sel(f, g) {
        Category::LwlSel
    } else if is_lwl_sel2(f, g) {
        Category::LwlSel2
    } else if is_global_row_decoder_two_clusters(f, g) {
        Category::GlobalRowDecoderTwoClusters
    } else if is_decoder_multi_col(f, g) {
        Category::DecoderMultiCol
    } else if is_single_csl_bank(f, csl_limit) {
        Category::SingleCslBank
    } else if is_multi_csls(f, csl_limit) {
        Category::MultiCsls
    } else {
        Category::NotClusteredSingleBank
    }
}

// ============================================================================
// Multi bank
// ============================================================================

pub fn is_bank_control(f: &DeviceFeatures, g: &Geometry) -> bool {
    f.distinct_cols <= g.bank_control_max_cols && f.cell_count >= g.bank_control_min_cells
}

/// Run the geometric cascade for one device.
pub fn classify_geometric(f: &DeviceFeatures, g: &Geometry, csl_limit: u32) -> Category {
    match shape_of(f) {
        Shape::SingleColumn => classify_single_column(f, g, csl_limit),
        Shape::SingleRow => Category::LocalWordline,
        Shape::SingleBank => classify_single_bank(f, g, csl_limit),
        Shape::MultiBank if is_bank_control(f, g) => Category::BankControl,
        Shape::MultiBank => Category::NotClusteredMultiBank,
    }
}
