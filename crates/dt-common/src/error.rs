//! Error types for DRAM fault triage.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints for automation
//! - Remediation suggestions for humans
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Missing Input Column
//!   Reason: events.csv is missing required column 'error_time'
//!   Fix: Check the CSV header against the documented input layout.
//! ```
//!
//! # Agent-Facing Output
//!
//! ```json
//! {
//!   "code": 21,
//!   "category": "input",
//!   "message": "events.csv is missing required column 'error_time'",
//!   "recoverable": true,
//!   "suggested_action": "fix_input"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for triage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration file errors.
    Config,
    /// Input table errors (events, inventory, tickets).
    Input,
    /// Classification pipeline errors.
    Classification,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Input => write!(f, "input"),
            ErrorCategory::Classification => write!(f, "classification"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Suggested actions for agents to take in response to errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    /// Retry the operation.
    Retry,
    /// Run `config validate`.
    RunCheck,
    /// Correct the input file and rerun.
    FixInput,
    /// Skip this item and continue.
    Skip,
    /// Abort the operation.
    Abort,
    /// Manual intervention required.
    ManualIntervention,
}

impl std::fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestedAction::Retry => write!(f, "retry"),
            SuggestedAction::RunCheck => write!(f, "run_check"),
            SuggestedAction::FixInput => write!(f, "fix_input"),
            SuggestedAction::Skip => write!(f, "skip"),
            SuggestedAction::Abort => write!(f, "abort"),
            SuggestedAction::ManualIntervention => write!(f, "manual_intervention"),
        }
    }
}

/// Unified error type for DRAM fault triage.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid classifier options: {0}")]
    InvalidOptions(String),

    // Input errors (20-29)
    #[error("input file not found: {path}")]
    InputNotFound { path: String },

    #[error("{file} is missing required column '{column}'")]
    MissingColumn { file: String, column: String },

    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("input contains no usable records: {0}")]
    EmptyInput(String),

    // Classification errors (30-39)
    #[error("classification failed: {0}")]
    Classification(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Input errors
    /// - 30-39: Classification errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidOptions(_) => 11,
            Error::InputNotFound { .. } => 20,
            Error::MissingColumn { .. } => 21,
            Error::MalformedRecord { .. } => 22,
            Error::EmptyInput(_) => 23,
            Error::Classification(_) => 30,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidOptions(_) => ErrorCategory::Config,

            Error::InputNotFound { .. }
            | Error::MissingColumn { .. }
            | Error::MalformedRecord { .. }
            | Error::EmptyInput(_) => ErrorCategory::Input,

            Error::Classification(_) => ErrorCategory::Classification,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable by the user.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) | Error::InvalidOptions(_) => true,
            Error::InputNotFound { .. } => true,
            Error::MissingColumn { .. } => true,
            // The rest of the batch still classifies; the row itself is lost.
            Error::MalformedRecord { .. } => false,
            Error::EmptyInput(_) => true,
            Error::Classification(_) => false,
            Error::Io(_) => true,
            Error::Json(_) => false,
        }
    }

    /// Returns the suggested action for automated handling.
    pub fn suggested_action(&self) -> SuggestedAction {
        match self {
            Error::Config(_) | Error::InvalidOptions(_) => SuggestedAction::RunCheck,
            Error::InputNotFound { .. } | Error::MissingColumn { .. } => SuggestedAction::FixInput,
            Error::MalformedRecord { .. } => SuggestedAction::Skip,
            Error::EmptyInput(_) => SuggestedAction::FixInput,
            Error::Classification(_) => SuggestedAction::ManualIntervention,
            Error::Io(_) => SuggestedAction::Retry,
            Error::Json(_) => SuggestedAction::Abort,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => {
                "Run 'dt-core config validate' to check classifier.json, or remove it to use defaults."
            }
            Error::InvalidOptions(_) => {
                "Fix the offending field in classifier.json; 'dt-core config show' prints the effective values."
            }
            Error::InputNotFound { .. } => "Check the path passed to --events/--inventory/--tickets.",
            Error::MissingColumn { .. } => {
                "Check the CSV header against the documented input layout (column names are case-sensitive)."
            }
            Error::MalformedRecord { .. } => {
                "The row was skipped. Correct it in the source file and rerun to include it."
            }
            Error::EmptyInput(_) => {
                "No device survived ingest and the inventory join. Check that sids match between files."
            }
            Error::Classification(_) => "Internal classifier failure. Report it with the input that triggered it.",
            Error::Io(_) => "Check disk space and permissions, then retry.",
            Error::Json(_) => "Output could not be serialized. Report it with the input that triggered it.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::InvalidOptions(_) => "Invalid Classifier Options",
            Error::InputNotFound { .. } => "Input Not Found",
            Error::MissingColumn { .. } => "Missing Input Column",
            Error::MalformedRecord { .. } => "Malformed Record",
            Error::EmptyInput(_) => "Empty Input",
            Error::Classification(_) => "Classification Error",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Error",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Suggested action for agents.
    pub suggested_action: SuggestedAction,

    /// Additional structured context (e.g., file, line).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::InputNotFound { path } => {
                context.insert("path".to_string(), serde_json::json!(path));
            }
            Error::MissingColumn { file, column } => {
                context.insert("file".to_string(), serde_json::json!(file));
                context.insert("column".to_string(), serde_json::json!(column));
            }
            Error::MalformedRecord { line, .. } => {
                context.insert("line".to_string(), serde_json::json!(line));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action(),
            context,
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

/// Format an error for human-readable stderr output.
///
/// Output format:
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        red = red,
        cyan = cyan,
        reset = reset,
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}
