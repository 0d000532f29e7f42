//! Error types for Vitaspan

use thiserror::Error;

/// Errors that can occur during prediction
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("Failed to load model artifact: {0}")]
    ModelLoad(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Feature list mismatch: model expects [{expected}], builder produces [{actual}]")]
    FeatureMismatch { expected: String, actual: String },

    #[error("Unknown feature in model order: {0}")]
    UnknownFeature(String),

    #[error("Indicator {field} = {value} outside valid range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Indicator {0} is not a finite number")]
    NonFinite(&'static str),

    #[error("Invalid schema version: expected {expected}, got {actual}")]
    InvalidSchemaVersion { expected: String, actual: String },

    #[error("Malformed model artifact: {0}")]
    InvalidModel(String),

    #[error("Chart rendering failed: {0}")]
    RenderError(String),
}
