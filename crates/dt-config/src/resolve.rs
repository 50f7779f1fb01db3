//! Configuration resolution and path discovery.
//!
//! Resolution order: CLI arguments → environment variables → XDG paths →
//! system config → defaults.

use std::path::{Path, PathBuf};

/// Discovered configuration file path.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Path to classifier.json (or None if not found).
    pub classifier: Option<PathBuf>,

    /// Where classifier.json was found (for diagnostics).
    pub source: ConfigSource,
}

/// Where a configuration file was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Found in /etc/dram-triage/.
    SystemConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::SystemConfig => write!(f, "system config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Environment variable names.
pub const ENV_CONFIG_PATH: &str = "DRAM_TRIAGE_CONFIG";
pub const ENV_CONFIG_DIR: &str = "DRAM_TRIAGE_CONFIG_DIR";

/// Standard config file name.
pub const CLASSIFIER_FILENAME: &str = "classifier.json";

/// Application name for XDG directories.
const APP_NAME: &str = "dram-triage";

/// Resolve the classifier.json path using the standard resolution order.
///
/// 1. Explicit CLI path: a file, or a directory containing classifier.json
/// 2. DRAM_TRIAGE_CONFIG (direct path)
/// 3. DRAM_TRIAGE_CONFIG_DIR + filename
/// 4. XDG config directory (~/.config/dram-triage/)
/// 5. System config (/etc/dram-triage/)
/// 6. Built-in defaults (None)
pub fn resolve_config(cli_path: Option<&Path>) -> ConfigPaths {
    let mut paths = ConfigPaths::default();

    // 1. CLI argument
    if let Some(path) = cli_path {
        let candidate = if path.is_dir() {
            path.join(CLASSIFIER_FILENAME)
        } else {
            path.to_path_buf()
        };
        if candidate.exists() {
            paths.classifier = Some(candidate);
            paths.source = ConfigSource::CliArgument;
            return paths;
        }
    }

    // 2. Environment variable (direct path)
    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            paths.classifier = Some(path);
            paths.source = ConfigSource::Environment;
            return paths;
        }
    }

    // 3. Environment variable (config dir)
    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = PathBuf::from(config_dir).join(CLASSIFIER_FILENAME);
        if path.exists() {
            paths.classifier = Some(path);
            paths.source = ConfigSource::Environment;
            return paths;
        }
    }

    // 4. XDG config directory
    if let Some(dir) = xdg_config_dir() {
        let path = dir.join(CLASSIFIER_FILENAME);
        if path.exists() {
            paths.classifier = Some(path);
            paths.source = ConfigSource::XdgConfig;
            return paths;
        }
    }

    // 5. System config
    let system_path = system_config_dir().join(CLASSIFIER_FILENAME);
    if system_path.exists() {
        paths.classifier = Some(system_path);
        paths.source = ConfigSource::SystemConfig;
        return paths;
    }

    paths.source = ConfigSource::BuiltinDefault;
    paths
}

/// Get the XDG config directory for dram-triage.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Get the system config directory.
pub fn system_config_dir() -> PathBuf {
    PathBuf::from("/etc").join(APP_NAME)
}
