//! Configuration snapshots for run outputs and reproducibility.
//!
//! A snapshot captures the exact configuration state at the start of a run,
//! so a category table can be traced back to the options that produced it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::geometry::Geometry;
use crate::options::ClassifierConfig;
use crate::resolve::{ConfigPaths, ConfigSource};

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the configuration.
    pub schema_version: String,

    /// SHA-256 hash of the classifier.json content.
    #[serde(default)]
    pub config_hash: Option<String>,

    /// Path where the config was loaded from.
    #[serde(default)]
    pub config_path: Option<String>,

    /// Source of the configuration.
    pub config_source: String,

    /// Hash over the effective options and geometry (for quick comparison).
    pub combined_hash: String,

    /// Key configuration values for quick reference.
    pub summary: ConfigSummary,
}

/// Summary of key configuration values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub msocket: bool,
    pub mrank: bool,
    pub split_by_permanency: bool,
    pub refine_multi_socket: bool,
    pub narrow_csl_models: Vec<String>,
    pub excluded_models: Vec<String>,
    pub remap_placeholder_epoch: bool,
    pub num_dimms: u64,
    pub hours: f64,
    pub chips_per_rank: u32,
}

impl ConfigSummary {
    fn from_config(config: &ClassifierConfig) -> Self {
        ConfigSummary {
            msocket: config.classifier.msocket,
            mrank: config.classifier.mrank,
            split_by_permanency: config.classifier.split_by_permanency,
            refine_multi_socket: config.classifier.refine_multi_socket,
            narrow_csl_models: config.classifier.narrow_csl_models.clone(),
            excluded_models: config.classifier.excluded_models.clone(),
            remap_placeholder_epoch: config.ingest.remap_placeholder_epoch,
            num_dimms: config.fleet.num_dimms,
            hours: config.fleet.hours,
            chips_per_rank: config.fleet.chips_per_rank,
        }
    }
}

impl ConfigSnapshot {
    /// Create a new snapshot from the effective configuration.
    ///
    /// `raw_json` is the file content the config was parsed from, when any.
    pub fn new(
        config: &ClassifierConfig,
        geometry: &Geometry,
        paths: &ConfigPaths,
        raw_json: Option<&str>,
    ) -> Self {
        let config_hash = raw_json.map(hash_content);

        // CLI overrides change behaviour without touching the file, so the
        // combined hash covers the effective values rather than the file.
        let effective = serde_json::to_string(config).unwrap_or_default();
        let geometry_json = serde_json::to_string(geometry).unwrap_or_default();
        let combined_hash = hash_content(&format!("{}:{}", effective, geometry_json));

        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            config_hash,
            config_path: paths.classifier.as_ref().map(|p| p.display().to_string()),
            config_source: paths.source.to_string(),
            combined_hash,
            summary: ConfigSummary::from_config(config),
        }
    }

    /// Create a snapshot with only defaults (no config file loaded).
    pub fn defaults_only() -> Self {
        let paths = ConfigPaths {
            classifier: None,
            source: ConfigSource::BuiltinDefault,
        };
        ConfigSnapshot::new(
            &ClassifierConfig::default(),
            &Geometry::STANDARD,
            &paths,
            None,
        )
    }

    /// Serialize snapshot to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check if this snapshot matches another (same effective config).
    pub fn matches(&self, other: &ConfigSnapshot) -> bool {
        self.combined_hash == other.combined_hash
    }

    /// Get a short identifier for this snapshot (first 12 chars of hash).
    pub fn short_id(&self) -> &str {
        &self.combined_hash[..12.min(self.combined_hash.len())]
    }
}

/// Hash content with SHA-256 and return hex string.
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_snapshot() {
        let snapshot = ConfigSnapshot::defaults_only();
        assert_eq!(snapshot.schema_version, crate::CONFIG_SCHEMA_VERSION);
        assert!(snapshot.config_hash.is_none());
        assert_eq!(snapshot.config_source, "builtin default");
        assert!(snapshot.summary.msocket);
    }

    #[test]
    fn test_snapshot_short_id() {
        let snapshot = ConfigSnapshot::defaults_only();
        assert_eq!(snapshot.short_id().len(), 12);
    }

    #[test]
    fn test_snapshot_matches_same_options() {
        let s1 = ConfigSnapshot::defaults_only();
        let s2 = ConfigSnapshot::defaults_only();
        assert!(s1.matches(&s2));
    }

    #[test]
    fn test_snapshot_differs_on_override() {
        let mut config = ClassifierConfig::default();
        config.classifier.mrank = false;
        let changed = ConfigSnapshot::new(
            &config,
            &Geometry::STANDARD,
            &ConfigPaths::default(),
            None,
        );
        assert!(!changed.matches(&ConfigSnapshot::defaults_only()));
    }

    #[test]
    fn test_hash_content() {
        let hash1 = hash_content("test");
        let hash2 = hash_content("test");
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_snapshot_json_roundtrip() {
        let snapshot = ConfigSnapshot::defaults_only();
        let json = snapshot.to_json().unwrap();
        let restored = ConfigSnapshot::from_json(&json).unwrap();
        assert!(snapshot.matches(&restored));
    }
}
