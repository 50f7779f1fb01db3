//! DRAM fault triage configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for classifier.json
//! - The fixed DRAM array geometry used by the classification rules
//! - Config resolution (CLI → env → XDG → /etc → defaults)
//! - Semantic validation
//! - Config snapshots embedded in run outputs

pub mod geometry;
pub mod options;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use geometry::{Band, Geometry};
pub use options::{ClassifierConfig, ClassifierOptions, FleetParams, IngestOptions};
pub use resolve::{resolve_config, ConfigPaths, ConfigSource};
pub use snapshot::ConfigSnapshot;
pub use validate::{ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
