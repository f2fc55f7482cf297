//! Feature extraction for rainfall model inference.
//!
//! The classifier was trained on seven columns in a fixed order. Reordering
//! them would be silently misread by the model, so the order lives here and
//! nowhere else.

use crate::types::observation::WeatherObservation;

/// Training column names, in training order.
pub const FEATURE_NAMES: [&str; 7] = [
    "pressure",
    "dewpoint",
    "humidity",
    "cloud",
    "sunshine",
    "winddirection",
    "windspeed",
];

/// Feature extractor that turns an observation into model input features.
///
/// Temperature is not a training column and never appears in the output.
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Create a new feature extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract features from an observation, in `FEATURE_NAMES` order.
    pub fn extract(&self, obs: &WeatherObservation) -> Vec<f32> {
        let mut features = Vec::with_capacity(FEATURE_NAMES.len());

        features.push(obs.pressure as f32);
        features.push(obs.dewpoint as f32);
        features.push(obs.humidity as f32);
        features.push(obs.cloud as f32);
        features.push(obs.sunshine as f32);
        features.push(obs.winddirection as f32);
        features.push(obs.windspeed as f32);

        features
    }

    /// Pair each feature value with its column name.
    pub fn labelled(&self, obs: &WeatherObservation) -> Vec<(&'static str, f32)> {
        FEATURE_NAMES
            .iter()
            .copied()
            .zip(self.extract(obs))
            .collect()
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        FEATURE_NAMES.len()
    }

    /// Get feature names (matching training order).
    pub fn feature_names(&self) -> Vec<&'static str> {
        FEATURE_NAMES.to_vec()
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}
