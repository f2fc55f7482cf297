//! Rainfall Predictor Library
//!
//! Serves a weather form, sends seven of its measurements to a pretrained
//! binary classifier and shows the predicted probability of rain.

pub mod animations;
pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod render;
pub mod session;
pub mod types;
pub mod web;

pub use config::AppConfig;
pub use error::PredictorError;
pub use feature_extractor::FeatureExtractor;
pub use models::inference::InferenceEngine;
pub use render::RenderedResult;
pub use types::{
    observation::{WeatherForm, WeatherObservation},
    prediction::{PredictionResult, RainOutcome},
};
