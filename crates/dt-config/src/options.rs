//! Classifier configuration types.
//!
//! These types describe classifier.json. Every section is optional in the
//! file; missing sections and fields take the defaults below.

use serde::{Deserialize, Serialize};

use crate::validate::ValidationError;

/// Complete classifier configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub schema_version: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub classifier: ClassifierOptions,

    #[serde(default)]
    pub ingest: IngestOptions,

    #[serde(default)]
    pub fleet: FleetParams,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            description: None,
            classifier: ClassifierOptions::default(),
            ingest: IngestOptions::default(),
            fleet: FleetParams::default(),
        }
    }
}

impl ClassifierConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }
}

/// Toggles and model-specific rules of the classification cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierOptions {
    /// Run the cross-module time-overlap test.
    pub msocket: bool,

    /// Separate devices touching several ranks.
    pub mrank: bool,

    /// DRAM models whose CSL remap region is half height.
    pub narrow_csl_models: Vec<String>,

    /// Classify transient and permanent devices as independent populations.
    pub split_by_permanency: bool,

    /// Re-run `multi_socket` and `bank_control` devices with the socket
    /// test disabled and adopt the resulting labels.
    pub refine_multi_socket: bool,

    /// DRAM models dropped right after the inventory join.
    pub excluded_models: Vec<String>,

    /// Worker threads for the per-device geometric stage (1 = sequential).
    pub workers: usize,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        ClassifierOptions {
            msocket: true,
            mrank: true,
            narrow_csl_models: vec!["A1".to_string(), "A2".to_string()],
            split_by_permanency: true,
            refine_multi_socket: false,
            excluded_models: Vec::new(),
            workers: 1,
        }
    }
}

impl ClassifierOptions {
    pub fn is_excluded(&self, dram_model: &str) -> bool {
        self.excluded_models.iter().any(|m| m == dram_model)
    }
}

/// Input normalisation options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestOptions {
    /// Map placeholder dates `0001-01 .. 0001-08` onto `2019-10 .. 2020-05`.
    pub remap_placeholder_epoch: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        IngestOptions {
            remap_placeholder_epoch: true,
        }
    }
}

/// Fleet exposure used to turn category counts into FIT rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetParams {
    /// Modules in the observed fleet.
    pub num_dimms: u64,
    /// Observation window in hours.
    pub hours: f64,
    /// DRAM chips per rank.
    pub chips_per_rank: u32,
}

impl Default for FleetParams {
    fn default() -> Self {
        FleetParams {
            num_dimms: 3_000_000,
            hours: 5856.0,
            chips_per_rank: 18,
        }
    }
}

impl FleetParams {
    /// Total chip-hours of exposure.
    pub fn device_hours(&self) -> f64 {
        self.num_dimms as f64 * self.chips_per_rank as f64 * self.hours
    }
}
