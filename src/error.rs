//! Error types for the calorie predictor

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, CalorieError>;

/// Main error type for the loader, trainer and inference layers
#[derive(Error, Debug)]
pub enum CalorieError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Training error in {model}: {reason}")]
    TrainingError { model: String, reason: String },

    #[error("Inference error: {0}")]
    InferenceError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CalorieError {
    /// Attribute a lower-level failure to the model that was being fitted
    pub fn training(model: impl Into<String>, source: CalorieError) -> Self {
        match source {
            // already attributed
            err @ CalorieError::TrainingError { .. } => err,
            other => CalorieError::TrainingError {
                model: model.into(),
                reason: other.to_string(),
            },
        }
    }
}

impl From<polars::error::PolarsError> for CalorieError {
    fn from(err: polars::error::PolarsError) -> Self {
        CalorieError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for CalorieError {
    fn from(err: serde_json::Error) -> Self {
        CalorieError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for CalorieError {
    fn from(err: ndarray::ShapeError) -> Self {
        CalorieError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
