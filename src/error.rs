//! Error types for the rainfall predictor
//!
//! Loading failures and prediction failures are kept apart: the first is
//! fatal at startup, the second is reported on the page and the server keeps
//! accepting new attempts.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, PredictorError>;

#[derive(Error, Debug)]
pub enum PredictorError {
    /// The classifier artifact could not be loaded
    #[error("Failed to load model from {path}: {reason}")]
    ModelLoad { path: PathBuf, reason: String },

    /// The classifier rejected the input or produced an unusable output
    #[error("Prediction error: {0}")]
    Inference(String),

    /// A form field is missing, unparsable or outside its domain
    #[error("Invalid input for {field}: {reason}")]
    Validation { field: &'static str, reason: String },
}

impl PredictorError {
    pub fn model_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ModelLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn inference(reason: impl ToString) -> Self {
        Self::Inference(reason.to_string())
    }

    pub fn validation(field: &'static str, reason: impl ToString) -> Self {
        Self::Validation {
            field,
            reason: reason.to_string(),
        }
    }

    /// Whether the server can keep serving after this error
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::ModelLoad { .. })
    }
}
