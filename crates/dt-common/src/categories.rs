//! Failure-mechanism taxonomy.
//!
//! Every device is assigned exactly one [`Category`]. Categories are grouped
//! two ways for reporting:
//! - [`LogicalClass`]: the coarse address-space shape of the failure
//!   (single column, single bank, multi bank, ...)
//! - [`Mechanism`]: the physical structure most likely at fault
//!   (sub-wordline driver, bitline sense amp, column-select line, ...)
//!
//! Names are stable and appear verbatim in every output format.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Schema version for the category taxonomy.
pub const CATEGORIES_SCHEMA_VERSION: &str = "1.0.0";

/// Leaf failure-mechanism labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Two or fewer distinct failing locations: independent single-bit errors.
    MultipleSingleBitFailures,
    /// Correlated failures across modules of one server.
    MultiSocket,
    /// Failing cells span more than one rank.
    MultiRank,

    // Single column, single bank
    SingleSenseAmp,
    DecoderSingleCol,
    SingleCslColumn,
    NotClusteredSingleColumn,

    // Single row, single bank
    LocalWordline,

    // Single bank, several rows and columns
    LocalWordlineTwoClusters,
    ConsecutiveRows,
    SubarrayRowDecoder,
    SubarrayRowDecoderTwoClusters,
    LwlSel,
    LwlSel2,
    GlobalRowDecoderTwoClusters,
    DecoderMultiCol,
    SingleCslBank,
    MultiCsls,
    NotClusteredSingleBank,

    // Multi bank
    BankControl,
    PotentialSenseAmp,
    PotentialCslColumn,
    NotClusteredMultiBank,
}

impl Category {
    /// All labels in cascade order.
    pub fn all() -> &'static [Category] {
        &[
            Category::MultipleSingleBitFailures,
            Category::MultiSocket,
            Category::MultiRank,
            Category::SingleSenseAmp,
            Category::DecoderSingleCol,
            Category::SingleCslColumn,
            Category::NotClusteredSingleColumn,
            Category::LocalWordline,
            Category::LocalWordlineTwoClusters,
            Category::ConsecutiveRows,
            Category::SubarrayRowDecoder,
            Category::SubarrayRowDecoderTwoClusters,
            Category::LwlSel,
            Category::LwlSel2,
            Category::GlobalRowDecoderTwoClusters,
            Category::DecoderMultiCol,
            Category::SingleCslBank,
            Category::MultiCsls,
            Category::NotClusteredSingleBank,
            Category::BankControl,
            Category::PotentialSenseAmp,
            Category::PotentialCslColumn,
            Category::NotClusteredMultiBank,
        ]
    }

    /// Position in [`Category::all`].
    pub fn index(&self) -> usize {
        Self::all().iter().position(|c| c == self).unwrap_or(0)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Category::MultipleSingleBitFailures => "multiple_single_bit_failures",
            Category::MultiSocket => "multi_socket",
            Category::MultiRank => "multi_rank",
            Category::SingleSenseAmp => "single_sense_amp",
            Category::DecoderSingleCol => "decoder_single_col",
            Category::SingleCslColumn => "single_csl_column",
            Category::NotClusteredSingleColumn => "not_clustered_single_column",
            Category::LocalWordline => "local_wordline",
            Category::LocalWordlineTwoClusters => "local_wordline_two_clusters",
            Category::ConsecutiveRows => "consecutive_rows",
            Category::SubarrayRowDecoder => "subarray_row_decoder",
            Category::SubarrayRowDecoderTwoClusters => "subarray_row_decoder_two_clusters",
            Category::LwlSel => "lwl_sel",
            Category::LwlSel2 => "lwl_sel2",
            Category::GlobalRowDecoderTwoClusters => "global_row_decoder_two_clusters",
            Category::DecoderMultiCol => "decoder_multi_col",
            Category::SingleCslBank => "single_csl_bank",
            Category::MultiCsls => "multi_csls",
            Category::NotClusteredSingleBank => "not_clustered_single_bank",
            Category::BankControl => "bank_control",
            Category::PotentialSenseAmp => "potential_sense_amp",
            Category::PotentialCslColumn => "potential_csl_column",
            Category::NotClusteredMultiBank => "not_clustered_multi_bank",
        }
    }

    /// Logical (address-shape) class this label belongs to.
    pub fn logical_class(&self) -> LogicalClass {
        match self {
            Category::MultipleSingleBitFailures => LogicalClass::MultipleSingleBitFailures,
            Category::MultiSocket => LogicalClass::MultiSocket,
            Category::MultiRank => LogicalClass::MultiRank,
            Category::SingleSenseAmp
            | Category::DecoderSingleCol
            | Category::SingleCslColumn
            | Category::NotClusteredSingleColumn => LogicalClass::SingleColumn,
            Category::LocalWordline => LogicalClass::SingleRow,
            Category::LocalWordlineTwoClusters
            | Category::ConsecutiveRows
            | Category::SubarrayRowDecoder
            | Category::SubarrayRowDecoderTwoClusters
            | Category::LwlSel
            | Category::LwlSel2
            | Category::GlobalRowDecoderTwoClusters
            | Category::DecoderMultiCol
            | Category::SingleCslBank
            | Category::MultiCsls
            | Category::NotClusteredSingleBank => LogicalClass::SingleBank,
            Category::BankControl
            | Category::PotentialSenseAmp
            | Category::PotentialCslColumn
            | Category::NotClusteredMultiBank => LogicalClass::MultiBank,
        }
    }

    /// Coarse physical mechanism, if the label maps onto one.
    pub fn mechanism(&self) -> Option<Mechanism> {
        match self {
            Category::LocalWordline
            | Category::LocalWordlineTwoClusters
            | Category::ConsecutiveRows
            | Category::SubarrayRowDecoder
            | Category::SubarrayRowDecoderTwoClusters => Some(Mechanism::Swd),
            Category::SingleSenseAmp => Some(Mechanism::Blsa),
            Category::DecoderSingleCol | Category::DecoderMultiCol => Some(Mechanism::ColDecoder),
            Category::SingleCslColumn | Category::SingleCslBank | Category::MultiCsls => {
                Some(Mechanism::Csl)
            }
            Category::GlobalRowDecoderTwoClusters | Category::LwlSel | Category::LwlSel2 => {
                Some(Mechanism::RowDecoder)
            }
            Category::BankControl => Some(Mechanism::BankPatterns),
            Category::NotClusteredMultiBank => Some(Mechanism::MultiBank),
            _ => None,
        }
    }

    /// Name used in roll-ups: the mechanism name, or the label itself.
    pub fn coarse_name(&self) -> &'static str {
        self.mechanism().map(|m| m.name()).unwrap_or_else(|| self.name())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::all()
            .iter()
            .copied()
            .find(|c| c.name() == s)
            .ok_or_else(|| format!("unknown category: {}", s))
    }
}

/// Address-shape classes ("logical result" groups).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalClass {
    MultipleSingleBitFailures,
    MultiSocket,
    MultiRank,
    SingleColumn,
    SingleRow,
    SingleBank,
    MultiBank,
}

impl LogicalClass {
    pub fn all() -> &'static [LogicalClass] {
        &[
            LogicalClass::MultipleSingleBitFailures,
            LogicalClass::MultiSocket,
            LogicalClass::MultiRank,
            LogicalClass::SingleColumn,
            LogicalClass::SingleRow,
            LogicalClass::SingleBank,
            LogicalClass::MultiBank,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            LogicalClass::MultipleSingleBitFailures => "multiple_single_bit_failures",
            LogicalClass::MultiSocket => "multi_socket",
            LogicalClass::MultiRank => "multi_rank",
            LogicalClass::SingleColumn => "single_column",
            LogicalClass::SingleRow => "single_row",
            LogicalClass::SingleBank => "single_bank",
            LogicalClass::MultiBank => "multi_bank",
        }
    }
}

impl fmt::Display for LogicalClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Coarse physical mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Mechanism {
    /// Sub-wordline driver.
    #[serde(rename = "SWD")]
    Swd,
    /// Bitline sense amplifier.
    #[serde(rename = "BLSA")]
    Blsa,
    #[serde(rename = "Col_decoder")]
    ColDecoder,
    /// Column-select line.
    #[serde(rename = "CSL")]
    Csl,
    #[serde(rename = "Row_decoder")]
    RowDecoder,
    #[serde(rename = "Bank_patterns")]
    BankPatterns,
    #[serde(rename = "multi_bank")]
    MultiBank,
}

impl Mechanism {
    pub fn all() -> &'static [Mechanism] {
        &[
            Mechanism::Swd,
            Mechanism::Blsa,
            Mechanism::ColDecoder,
            Mechanism::Csl,
            Mechanism::RowDecoder,
            Mechanism::BankPatterns,
            Mechanism::MultiBank,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mechanism::Swd => "SWD",
            Mechanism::Blsa => "BLSA",
            Mechanism::ColDecoder => "Col_decoder",
            Mechanism::Csl => "CSL",
            Mechanism::RowDecoder => "Row_decoder",
            Mechanism::BankPatterns => "Bank_patterns",
            Mechanism::MultiBank => "multi_bank",
        }
    }

    /// Leaf labels rolled up into this mechanism.
    pub fn members(&self) -> Vec<Category> {
        Category::all()
            .iter()
            .copied()
            .filter(|c| c.mechanism() == Some(*self))
            .collect()
    }
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a device's failures persisted past the transient window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permanency {
    /// Observation span shorter than 24 hours.
    Transient,
    #[default]
    Permanent,
}

impl Permanency {
    pub fn name(&self) -> &'static str {
        match self {
            Permanency::Transient => "transient",
            Permanency::Permanent => "permanent",
        }
    }

    /// Single-letter suffix used in combined `category-p` labels.
    pub fn initial(&self) -> char {
        match self {
            Permanency::Transient => 't',
            Permanency::Permanent => 'p',
        }
    }
}

impl fmt::Display for Permanency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
