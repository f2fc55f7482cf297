//! Classifier backends
//!
//! A classifier is a black box exposing a discrete prediction and a class
//! probability distribution. Two artifact kinds are supported: ONNX exports
//! run through ONNX Runtime, and a native JSON logistic model.

use crate::error::{PredictorError, Result};
use ort::memory::Allocator;
use ort::session::Session;
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, Tensor};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::debug;

/// Binary classifier loaded from an artifact
pub trait Classifier: Send + Sync {
    /// Model name for logs and the health endpoint
    fn name(&self) -> &str;

    /// Number of input features, when the artifact declares it
    fn input_width(&self) -> Option<usize>;

    /// Discrete prediction: 0 = no rain, 1 = rain
    fn predict(&self, features: &[f32]) -> Result<i64>;

    /// Class distribution `[p_no_rain, p_rain]`
    fn predict_proba(&self, features: &[f32]) -> Result<[f64; 2]>;

    /// Both outputs from one call. Backends that produce them together override this.
    fn predict_with_proba(&self, features: &[f32]) -> Result<(i64, [f64; 2])> {
        Ok((self.predict(features)?, self.predict_proba(features)?))
    }
}

/// Native artifact formats, tagged by `kind`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NativeArtifact {
    Logistic(LogisticModel),
}

/// Logistic regression exported as JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    /// Display name
    #[serde(default = "default_logistic_name")]
    pub name: String,
    /// Training column names, in training order
    pub feature_names: Vec<String>,
    /// One coefficient per feature
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// Decision threshold on the rain probability
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_logistic_name() -> String {
    "logistic".to_string()
}

fn default_threshold() -> f64 {
    0.5
}

impl LogisticModel {
    fn decision(&self, features: &[f32]) -> Result<f64> {
        if features.len() != self.coefficients.len() {
            return Err(PredictorError::inference(format!(
                "model expects {} features, got {}",
                self.coefficients.len(),
                features.len()
            )));
        }

        let z = self
            .coefficients
            .iter()
            .zip(features)
            .map(|(c, &x)| c * x as f64)
            .sum::<f64>()
            + self.intercept;

        if !z.is_finite() {
            return Err(PredictorError::inference("decision function is not finite"));
        }
        Ok(z)
    }

    fn rain_probability(&self, features: &[f32]) -> Result<f64> {
        let z = self.decision(features)?;
        Ok(1.0 / (1.0 + (-z).exp()))
    }
}

impl Classifier for LogisticModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_width(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }

    fn predict(&self, features: &[f32]) -> Result<i64> {
        let p = self.rain_probability(features)?;
        Ok(if p >= self.threshold { 1 } else { 0 })
    }

    fn predict_proba(&self, features: &[f32]) -> Result<[f64; 2]> {
        let p = self.rain_probability(features)?;
        Ok([1.0 - p, p])
    }
}

/// Classifier exported to ONNX (e.g. via skl2onnx)
pub struct OnnxModel {
    pub(crate) name: String,
    /// `run` needs exclusive access to the session
    pub(crate) session: Mutex<Session>,
    pub(crate) input_name: String,
    pub(crate) label_output: String,
    pub(crate) proba_output: String,
}

impl OnnxModel {
    fn run(&self, features: &[f32]) -> Result<(i64, [f64; 2])> {
        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features.to_vec()))
            .map_err(|e| PredictorError::inference(format!("failed to create input tensor: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| PredictorError::inference(format!("lock error: {}", e)))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])
            .map_err(PredictorError::inference)?;

        let label_value = outputs.get(self.label_output.as_str()).ok_or_else(|| {
            PredictorError::inference(format!("model has no '{}' output", self.label_output))
        })?;
        let label = extract_label(label_value)?;

        let proba_value = outputs.get(self.proba_output.as_str()).ok_or_else(|| {
            PredictorError::inference(format!("model has no '{}' output", self.proba_output))
        })?;
        let rain = extract_rain_probability(proba_value, &self.name)?;

        Ok((label, [1.0 - rain, rain]))
    }
}

impl Classifier for OnnxModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_width(&self) -> Option<usize> {
        None
    }

    fn predict(&self, features: &[f32]) -> Result<i64> {
        self.run(features).map(|(label, _)| label)
    }

    fn predict_proba(&self, features: &[f32]) -> Result<[f64; 2]> {
        self.run(features).map(|(_, proba)| proba)
    }

    fn predict_with_proba(&self, features: &[f32]) -> Result<(i64, [f64; 2])> {
        self.run(features)
    }
}

/// Read the first label from an int64 label tensor
fn extract_label(output: &DynValue) -> Result<i64> {
    let (_, data) = output
        .try_extract_tensor::<i64>()
        .map_err(|e| PredictorError::inference(format!("label output is not int64: {}", e)))?;

    first_label(data)
}

/// Extract rain probability from either a probability tensor or a
/// seq(map(int64, float)) ZipMap output
fn extract_rain_probability(output: &DynValue, model_name: &str) -> Result<f64> {
    if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
        let dims: Vec<i64> = shape.iter().copied().collect();
        let rain = rain_from_tensor(&dims, data)?;
        debug!(model = %model_name, prob = rain, "Extracted from tensor");
        return Ok(rain);
    }

    let dtype = output.dtype();
    if DynSequenceValueType::can_downcast(dtype) {
        return extract_from_sequence_map(output, model_name);
    }

    Err(PredictorError::inference(format!(
        "unsupported probability output type: {:?}",
        dtype
    )))
}

fn extract_from_sequence_map(output: &DynValue, model_name: &str) -> Result<f64> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| PredictorError::inference(format!("failed to downcast to sequence: {}", e)))?;

    let maps = sequence
        .try_extract_sequence::<DynMapValueType>(&allocator)
        .map_err(PredictorError::inference)?;

    // One map per row; we only ever send one row
    let map_value = maps
        .first()
        .ok_or_else(|| PredictorError::inference("empty probability sequence"))?;

    let kv_pairs = map_value
        .try_extract_key_values::<i64, f32>()
        .map_err(PredictorError::inference)?;

    let rain = rain_from_class_map(&kv_pairs)?;
    debug!(model = %model_name, prob = rain, "Extracted from seq(map)");
    Ok(rain)
}

fn first_label(data: &[i64]) -> Result<i64> {
    data.first()
        .copied()
        .ok_or_else(|| PredictorError::inference("empty label output"))
}

/// Rain probability from a `[rows, classes]` tensor; the model must be binary
fn rain_from_tensor(shape: &[i64], data: &[f32]) -> Result<f64> {
    let num_classes = shape.last().copied().unwrap_or(0);
    if num_classes != 2 || data.len() < 2 {
        return Err(PredictorError::inference(format!(
            "expected 2 class probabilities, got shape {:?}",
            shape
        )));
    }
    Ok(data[1] as f64)
}

/// Rain probability from one ZipMap row of `(class, probability)` pairs
fn rain_from_class_map(pairs: &[(i64, f32)]) -> Result<f64> {
    if pairs.len() != 2 {
        return Err(PredictorError::inference(format!(
            "expected 2 class probabilities, got {}",
            pairs.len()
        )));
    }
    pairs
        .iter()
        .find(|(class_id, _)| *class_id == 1)
        .map(|(_, prob)| *prob as f64)
        .ok_or_else(|| PredictorError::inference("no probability for class 1"))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::feature_extractor::FEATURE_NAMES;

    /// Logistic model over the seven training columns
    pub(crate) fn sample_model() -> LogisticModel {
        LogisticModel {
            name: "sample".to_string(),
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            // pressure, dewpoint, humidity, cloud, sunshine, winddirection, windspeed
            coefficients: vec![-0.02, 0.05, 0.04, 0.03, -0.3, 0.001, 0.02],
            intercept: 15.0,
            threshold: 0.5,
        }
    }

    #[test]
    fn test_logistic_probabilities_sum_to_one() {
        let model = sample_model();
        let features = [1012.0, 15.0, 60.0, 50.0, 6.0, 90.0, 12.0];

        let [p_no, p_rain] = model.predict_proba(&features).unwrap();
        assert!((p_no + p_rain - 1.0).abs() < 1e-12);
        assert!((0.0..=1.0).contains(&p_rain));
    }

    #[test]
    fn test_logistic_label_follows_threshold() {
        let model = sample_model();
        let features = [1012.0, 15.0, 60.0, 50.0, 6.0, 90.0, 12.0];

        let p = model.predict_proba(&features).unwrap()[1];
        let label = model.predict(&features).unwrap();
        assert_eq!(label, if p >= 0.5 { 1 } else { 0 });
    }

    #[test]
    fn test_logistic_rejects_wrong_width() {
        let model = sample_model();
        let err = model.predict(&[1012.0, 15.0]).unwrap_err();
        assert!(matches!(err, PredictorError::Inference(_)));
    }

    #[test]
    fn test_native_artifact_parsing() {
        let json = r#"{
            "kind": "logistic",
            "feature_names": ["pressure", "dewpoint", "humidity", "cloud",
                              "sunshine", "winddirection", "windspeed"],
            "coefficients": [0, 0, 0, 0, 0, 0, 0],
            "intercept": 0.0
        }"#;

        let artifact: NativeArtifact = serde_json::from_str(json).unwrap();
        let NativeArtifact::Logistic(model) = artifact;
        assert_eq!(model.name, "logistic");
        assert_eq!(model.threshold, 0.5);
        assert_eq!(model.predict_proba(&[0.0; 7]).unwrap(), [0.5, 0.5]);
        assert_eq!(model.predict(&[0.0; 7]).unwrap(), 1);
    }

    #[test]
    fn test_first_label() {
        assert_eq!(first_label(&[1]).unwrap(), 1);
        assert_eq!(first_label(&[0, 1]).unwrap(), 0);
        assert!(matches!(first_label(&[]), Err(PredictorError::Inference(_))));
    }

    #[test]
    fn test_rain_from_two_class_tensor() {
        let rain = rain_from_tensor(&[1, 2], &[0.25, 0.75]).unwrap();
        assert!((rain - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_rain_from_tensor_rejects_other_class_counts() {
        let err = rain_from_tensor(&[1, 3], &[0.2, 0.3, 0.5]).unwrap_err();
        assert!(err.to_string().contains("expected 2 class probabilities"));

        assert!(rain_from_tensor(&[1, 1], &[0.9]).is_err());
        assert!(rain_from_tensor(&[], &[]).is_err());
    }

    #[test]
    fn test_rain_from_class_map() {
        let rain = rain_from_class_map(&[(0, 0.4), (1, 0.6)]).unwrap();
        assert!((rain - 0.6).abs() < 1e-6);

        // Order of the pairs does not matter
        let rain = rain_from_class_map(&[(1, 0.1), (0, 0.9)]).unwrap();
        assert!((rain - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_class_map_without_rain_class_rejected() {
        let err = rain_from_class_map(&[(0, 0.4), (2, 0.6)]).unwrap_err();
        assert!(err.to_string().contains("no probability for class 1"));

        assert!(rain_from_class_map(&[(0, 0.2), (1, 0.3), (2, 0.5)]).is_err());
        assert!(rain_from_class_map(&[]).is_err());
    }
}
