//! Structured event definitions for logging.
//!
//! Events follow a consistent schema for machine-parseable JSONL output.
//! All events carry the run id, the config id and the pipeline stage.

use serde::{Deserialize, Serialize};

/// Log levels for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Processing stages in the classification pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// CSV parsing and timestamp normalisation.
    Ingest,
    /// Collapsing events into failing cells.
    Aggregate,
    /// Building per-device profiles and the inventory join.
    Profile,
    /// Multi-bit, socket, rank and geometric classification.
    Classify,
    /// Table, summary and FIT rendering.
    Report,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Ingest => "ingest",
            Stage::Aggregate => "aggregate",
            Stage::Profile => "profile",
            Stage::Classify => "classify",
            Stage::Report => "report",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    // Ingest stage
    pub const INGEST_FILE_LOADED: &str = "ingest.file_loaded";
    pub const INGEST_REJECTED_ROW: &str = "ingest.rejected_row";

    // Aggregate / profile stages
    pub const AGGREGATE_FINISHED: &str = "aggregate.finished";
    pub const PROFILE_NO_INVENTORY: &str = "profile.no_inventory";
    pub const PROFILE_EXCLUDED_MODEL: &str = "profile.excluded_model";
    pub const PROFILE_FINISHED: &str = "profile.finished";

    // Classify stage
    pub const CLASSIFY_STARTED: &str = "classify.started";
    pub const CLASSIFY_POPULATION: &str = "classify.population";
    pub const CLASSIFY_REFINED: &str = "classify.refined";
    pub const CLASSIFY_FINISHED: &str = "classify.finished";

    // Report stage
    pub const REPORT_WRITTEN: &str = "report.written";

    // Config/init events
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
    pub const CONFIG_ERROR: &str = "config.error";

    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// Run identity attached to every event.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub run_id: String,
    /// Short id of the effective configuration snapshot, once resolved.
    pub config_id: Option<String>,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
            config_id: None,
        }
    }

    pub fn with_config_id(mut self, config_id: impl Into<String>) -> Self {
        self.config_id = Some(config_id.into());
        self
    }

    /// Config id for event fields; `-` until a snapshot exists.
    pub fn config_field(&self) -> &str {
        self.config_id.as_deref().unwrap_or("-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_context() {
        let ctx = LogContext::new("run-abc");
        assert_eq!(ctx.config_field(), "-");

        let ctx = ctx.with_config_id("0123456789ab");
        assert_eq!(ctx.run_id, "run-abc");
        assert_eq!(ctx.config_field(), "0123456789ab");
    }

    #[test]
    fn test_level_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Level::Warn).unwrap(), "\"warn\"");
    }

    #[test]
    fn test_stage_display_matches_serde() {
        for stage in [
            Stage::Init,
            Stage::Ingest,
            Stage::Aggregate,
            Stage::Profile,
            Stage::Classify,
            Stage::Report,
        ] {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{}\"", stage));
        }
    }

    #[test]
    fn test_event_names() {
        assert_eq!(event_names::RUN_STARTED, "run.started");
        assert_eq!(event_names::CLASSIFY_FINISHED, "classify.finished");
    }
}
