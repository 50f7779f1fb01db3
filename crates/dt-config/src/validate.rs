//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::options::{ClassifierConfig, FleetParams};

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 63,
            ValidationError::MissingField(_) => 64,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

/// Validate classifier configuration semantically.
pub fn validate_config(config: &ClassifierConfig) -> ValidationResult<()> {
    if config.schema_version.is_empty() {
        return Err(ValidationError::MissingField("schema_version".to_string()));
    }
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    let opts = &config.classifier;
    if opts.workers == 0 {
        return Err(ValidationError::InvalidValue {
            field: "classifier.workers".to_string(),
            message: "Must be at least 1".to_string(),
        });
    }
    validate_model_list("classifier.narrow_csl_models", &opts.narrow_csl_models)?;
    validate_model_list("classifier.excluded_models", &opts.excluded_models)?;

    if opts.refine_multi_socket && !opts.msocket {
        return Err(ValidationError::SemanticError(
            "classifier.refine_multi_socket requires classifier.msocket".to_string(),
        ));
    }

    validate_fleet(&config.fleet)?;

    Ok(())
}

fn validate_model_list(field: &str, models: &[String]) -> ValidationResult<()> {
    for (idx, model) in models.iter().enumerate() {
        if model.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: format!("{}[{}]", field, idx),
                message: "Model name must not be empty".to_string(),
            });
        }
        if models[..idx].contains(model) {
            return Err(ValidationError::InvalidValue {
                field: format!("{}[{}]", field, idx),
                message: format!("Duplicate model {}", model),
            });
        }
    }
    Ok(())
}

fn validate_fleet(fleet: &FleetParams) -> ValidationResult<()> {
    if fleet.num_dimms == 0 {
        return Err(ValidationError::InvalidValue {
            field: "fleet.num_dimms".to_string(),
            message: "Must be positive".to_string(),
        });
    }
    if !fleet.hours.is_finite() || fleet.hours <= 0.0 {
        return Err(ValidationError::InvalidValue {
            field: "fleet.hours".to_string(),
            message: format!("Must be positive, got {}", fleet.hours),
        });
    }
    if fleet.chips_per_rank == 0 {
        return Err(ValidationError::InvalidValue {
            field: "fleet.chips_per_rank".to_string(),
            message: "Must be positive".to_string(),
        });
    }
    Ok(())
}
