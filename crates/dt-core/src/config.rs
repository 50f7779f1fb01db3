//! Configuration loading and validation for dt-core.
//!
//! This module handles:
//! - Locating classifier.json (CLI > env > XDG > /etc > defaults)
//! - Schema validation (shape/type checking via serde)
//! - Semantic validation (positive fleet parameters, model lists)
//! - Config snapshot generation for run outputs

pub use dt_config::validate::ValidationError;
pub use dt_config::{ClassifierConfig, ConfigPaths, ConfigSnapshot, ConfigSource, Geometry};

use dt_config::resolve::resolve_config;
use dt_config::snapshot::hash_content;
use dt_config::validate::validate_config;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid JSON in config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Semantic validation failed: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<ConfigError> for dt_common::Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ValidationError(inner) => dt_common::Error::InvalidOptions(inner.to_string()),
            other => dt_common::Error::Config(other.to_string()),
        }
    }
}

/// Configuration resolution options.
#[derive(Debug, Default)]
pub struct ConfigOptions {
    /// Explicit classifier.json, or a directory containing one.
    pub config_path: Option<PathBuf>,
}

/// Resolved configuration with provenance information.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Effective configuration; CLI flags are applied on top of the file.
    pub config: ClassifierConfig,
    /// Where the file was found.
    pub paths: ConfigPaths,
    /// SHA-256 hash of the file content (None if using defaults).
    pub file_hash: Option<String>,
    raw: Option<String>,
}

impl ResolvedConfig {
    /// Snapshot of the effective configuration for run outputs.
    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot::new(
            &self.config,
            &Geometry::STANDARD,
            &self.paths,
            self.raw.as_deref(),
        )
    }

    /// Path of the loaded file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.paths.classifier.as_deref()
    }

    /// Re-run semantic validation after CLI overrides.
    pub fn revalidate(&self) -> Result<(), ConfigError> {
        validate_config(&self.config)?;
        Ok(())
    }
}

/// Load configuration with the standard resolution order.
///
/// An explicit path that does not exist is an error rather than a silent
/// fall-through to the next source.
pub fn load_config(options: &ConfigOptions) -> Result<ResolvedConfig, ConfigError> {
    if let Some(path) = &options.config_path {
        if !path.exists() {
            return Err(ConfigError::NotFound { path: path.clone() });
        }
    }

    let paths = resolve_config(options.config_path.as_deref());
    let Some(path) = paths.classifier.clone() else {
        return Ok(ResolvedConfig {
            config: ClassifierConfig::default(),
            paths,
            file_hash: None,
            raw: None,
        });
    };

    let raw = std::fs::read_to_string(&path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound { path: path.clone() }
        } else {
            ConfigError::IoError {
                path: path.clone(),
                source,
            }
        }
    })?;
    let config: ClassifierConfig =
        serde_json::from_str(&raw).map_err(|source| ConfigError::ParseError {
            path: path.clone(),
            source,
        })?;
    validate_config(&config)?;

    Ok(ResolvedConfig {
        config,
        paths,
        file_hash: Some(hash_content(&raw)),
        raw: Some(raw),
    })
}
