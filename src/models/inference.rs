//! Inference engine for rainfall prediction

use crate::config::AppConfig;
use crate::error::{PredictorError, Result};
use crate::feature_extractor::FeatureExtractor;
use crate::models::classifier::Classifier;
use crate::models::loader::ModelLoader;
use crate::types::observation::WeatherObservation;
use crate::types::prediction::{PredictionResult, RainOutcome};
use tracing::{debug, info};

/// Wraps the loaded classifier. Built once at startup and shared read-only.
pub struct InferenceEngine {
    classifier: Box<dyn Classifier>,
    extractor: FeatureExtractor,
}

impl InferenceEngine {
    /// Load the configured artifact. Any failure here is fatal for the server.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let loader = ModelLoader::with_threads(config.model.onnx_threads);
        let classifier = loader.load(&config.model.path, config.model.format)?;

        info!(
            model = %classifier.name(),
            path = %config.model.path.display(),
            "Inference engine initialized"
        );

        Ok(Self::with_classifier(classifier))
    }

    /// Create an engine around an already loaded classifier
    pub fn with_classifier(classifier: Box<dyn Classifier>) -> Self {
        Self {
            classifier,
            extractor: FeatureExtractor::new(),
        }
    }

    pub fn model_name(&self) -> &str {
        self.classifier.name()
    }

    pub fn feature_names(&self) -> Vec<&'static str> {
        self.extractor.feature_names()
    }

    /// The features that would be sent to the model for this observation
    pub fn model_input(&self, observation: &WeatherObservation) -> Vec<(&'static str, f32)> {
        self.extractor.labelled(observation)
    }

    /// Run one prediction
    pub fn predict(&self, observation: &WeatherObservation) -> Result<PredictionResult> {
        let features = self.extractor.extract(observation);
        let (outcome, probabilities) = self.predict_features(&features)?;

        debug!(
            model = %self.model_name(),
            outcome = ?outcome,
            rain_probability = probabilities[1],
            "Prediction complete"
        );

        Ok(PredictionResult::new(outcome, probabilities, *observation))
    }

    /// Run the classifier on a raw feature vector.
    ///
    /// The label is taken from the classifier as is; it is never derived from
    /// the probability.
    pub fn predict_features(&self, features: &[f32]) -> Result<(RainOutcome, [f64; 2])> {
        if let Some(width) = self.classifier.input_width() {
            if features.len() != width {
                return Err(PredictorError::inference(format!(
                    "model expects {} features, got {}",
                    width,
                    features.len()
                )));
            }
        }

        let (label, probabilities) = self.classifier.predict_with_proba(features)?;

        let outcome = RainOutcome::from_label(label).ok_or_else(|| {
            PredictorError::inference(format!("model returned unknown class label {}", label))
        })?;

        if probabilities
            .iter()
            .any(|p| !p.is_finite() || !(0.0..=1.0).contains(p))
        {
            return Err(PredictorError::inference(format!(
                "model returned invalid probabilities {:?}",
                probabilities
            )));
        }

        Ok((outcome, probabilities))
    }
}
