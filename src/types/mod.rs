//! Type definitions for the rainfall predictor

pub mod observation;
pub mod prediction;

pub use observation::{WeatherForm, WeatherObservation};
pub use prediction::{PredictionResult, RainOutcome};
