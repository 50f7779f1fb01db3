//! DRAM array geometry constants.
//!
//! These values describe the physical layout of the studied DRAM parts
//! (rows per subarray, column-select-line granularity, master wordline
//! period, bank height). They are facts about the hardware, so they are
//! not loadable from classifier.json: [`Geometry::STANDARD`] is the only
//! instance the CLI ever uses. Tests may build variants to probe a rule.

use serde::{Deserialize, Serialize};

/// Inclusive band of residues, used by the wordline-select periodicity tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    pub lo: u32,
    pub hi: u32,
}

impl Band {
    pub const fn new(lo: u32, hi: u32) -> Self {
        Band { lo, hi }
    }

    pub fn contains(&self, value: u32) -> bool {
        (self.lo..=self.hi).contains(&value)
    }
}

/// Geometry thresholds consumed by the classification cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    /// Minimum distinct (row, col, rank, bank) tuples for a genuine multi-bit fault.
    pub multi_bit_min_locations: usize,
    /// Rows per subarray (2^10).
    pub subarray_rows: u32,
    /// Maximum distinct rows a single sense amplifier can affect (2^11).
    pub sense_amp_max_rows: usize,
    /// Rows per bank (2^16).
    pub bank_rows: u32,
    /// Row span of a column-select-line remap region (2^14 + 1024).
    pub csl_span: u32,
    /// Alternative CSL span admitted for the models in `narrow_csl_models` (2^13 + 1024).
    pub csl_span_narrow: u32,
    /// Row stride at which column-decoder faults recur (63 * 1024).
    pub decoder_stride: u32,
    /// Gap separating the two clusters of a decoder fault (62 * 1024).
    pub two_cluster_gap: u32,
    /// Offset past which the second global-decoder cluster starts (2^14).
    pub subbank_rows: u32,
    /// Maximum row span of the adjacent-row artifact.
    pub consecutive_rows_span: u32,
    /// Local wordline-select period and accepted residue bands.
    pub lwl_sel_period: u32,
    pub lwl_sel_bands: [Band; 2],
    /// Subbank-level wordline-select period and accepted residue bands.
    pub lwl_sel2_period: u32,
    pub lwl_sel2_bands: [Band; 2],
    /// Bank-control admission: at most this many distinct columns...
    pub bank_control_max_cols: usize,
    /// ...and at least this many failing cells.
    pub bank_control_min_cells: usize,
    /// Per-server failing-cell budget separating sense-amp from CSL refinements.
    pub refine_cell_budget: usize,
}

impl Geometry {
    pub const STANDARD: Geometry = Geometry {
        multi_bit_min_locations: 3,
        subarray_rows: 1 << 10,
        sense_amp_max_rows: 1 << 11,
        bank_rows: 1 << 16,
        csl_span: (1 << 14) + 1024,
        csl_span_narrow: (1 << 13) + 1024,
        decoder_stride: 63 * 1024,
        two_cluster_gap: 62 * 1024,
        subbank_rows: 1 << 14,
        consecutive_rows_span: 4,
        lwl_sel_period: 1 << 10,
        lwl_sel_bands: [Band::new(0, 63), Band::new(960, 1023)],
        lwl_sel2_period: 1 << 14,
        lwl_sel2_bands: [Band::new(0, 1023), Band::new(15360, 16383)],
        bank_control_max_cols: 2,
        bank_control_min_cells: 4,
        refine_cell_budget: 2048,
    };

    /// Row-span limit for CSL categories on a given DRAM model.
    ///
    /// A span matches when `span <= csl_span`, or when the model is listed
    /// and `span <= csl_span_narrow`. The listed models therefore get the
    /// larger of the two limits; with the standard values both clauses
    /// collapse to `csl_span`.
    pub fn csl_limit(&self, dram_model: &str, narrow_models: &[String]) -> u32 {
        if narrow_models.iter().any(|m| m == dram_model) {
            self.csl_span.max(self.csl_span_narrow)
        } else {
            self.csl_span
        }
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Geometry::STANDARD
    }
}
