//! Classifier artifact loader

use crate::config::ModelFormat;
use crate::error::{PredictorError, Result};
use crate::feature_extractor::FEATURE_NAMES;
use crate::models::classifier::{Classifier, LogisticModel, NativeArtifact, OnnxModel};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

/// Loader for classifier artifacts
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with default settings (1 thread)
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    /// Create a new model loader with specified number of ONNX threads
    pub fn with_threads(onnx_threads: usize) -> Self {
        Self {
            onnx_threads: onnx_threads.max(1),
        }
    }

    /// Load the classifier at `path`.
    ///
    /// Fails on a missing file, an unreadable artifact, or a native model
    /// whose columns do not match the feature extractor.
    pub fn load<P: AsRef<Path>>(&self, path: P, format: ModelFormat) -> Result<Box<dyn Classifier>> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(PredictorError::model_load(path, "file not found"));
        }

        match resolve_format(path, format)? {
            ArtifactKind::Onnx => Ok(Box::new(self.load_onnx(path)?)),
            ArtifactKind::Native => Ok(Box::new(load_native(path)?)),
        }
    }

    /// Load an ONNX classifier
    pub fn load_onnx(&self, path: &Path) -> Result<OnnxModel> {
        let name = model_name(path);
        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        ort::init()
            .commit()
            .map_err(|e| PredictorError::model_load(path, format!("ONNX Runtime init failed: {}", e)))?;

        let session =
            build_session(path, self.onnx_threads).map_err(|e| PredictorError::model_load(path, e))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| PredictorError::model_load(path, "model declares no inputs"))?;

        let (label_output, proba_output) =
            select_outputs(session.outputs.iter().map(|o| o.name.as_str()))
                .map_err(|reason| PredictorError::model_load(path, reason))?;

        info!(
            model = %name,
            input = %input_name,
            label = %label_output,
            probabilities = %proba_output,
            "Model loaded successfully"
        );

        Ok(OnnxModel {
            name,
            session: Mutex::new(session),
            input_name,
            label_output,
            proba_output,
        })
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Load a native JSON artifact and check it against the training columns
pub fn load_native(path: &Path) -> Result<LogisticModel> {
    info!(path = %path.display(), "Loading native model");

    let raw = std::fs::read_to_string(path).map_err(|e| PredictorError::model_load(path, e))?;
    let artifact: NativeArtifact =
        serde_json::from_str(&raw).map_err(|e| PredictorError::model_load(path, e))?;

    let NativeArtifact::Logistic(model) = artifact;

    if model.feature_names != FEATURE_NAMES {
        return Err(PredictorError::model_load(
            path,
            format!(
                "feature names {:?} do not match expected {:?}",
                model.feature_names, FEATURE_NAMES
            ),
        ));
    }
    if model.coefficients.len() != model.feature_names.len() {
        return Err(PredictorError::model_load(
            path,
            format!(
                "{} coefficients for {} features",
                model.coefficients.len(),
                model.feature_names.len()
            ),
        ));
    }
    if !model.intercept.is_finite() || model.coefficients.iter().any(|c| !c.is_finite()) {
        return Err(PredictorError::model_load(path, "non-finite model parameters"));
    }

    info!(model = %model.name, features = model.coefficients.len(), "Model loaded successfully");
    Ok(model)
}

fn build_session(path: &Path, threads: usize) -> ort::Result<Session> {
    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(threads)?
        .commit_from_file(path)?;
    Ok(session)
}

/// Pick the label and probability outputs of a classifier export
/// (`output_label` / `output_probability` in skl2onnx naming)
fn select_outputs<'a>(
    names: impl IntoIterator<Item = &'a str>,
) -> std::result::Result<(String, String), &'static str> {
    let names: Vec<&str> = names.into_iter().collect();
    let label = names
        .iter()
        .find(|n| n.contains("label"))
        .ok_or("model has no label output")?;
    let proba = names
        .iter()
        .find(|n| n.contains("prob"))
        .ok_or("model has no probability output")?;
    Ok((label.to_string(), proba.to_string()))
}

enum ArtifactKind {
    Onnx,
    Native,
}

fn resolve_format(path: &Path, format: ModelFormat) -> Result<ArtifactKind> {
    match format {
        ModelFormat::Onnx => return Ok(ArtifactKind::Onnx),
        ModelFormat::Native => return Ok(ArtifactKind::Native),
        ModelFormat::Auto => {}
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some("onnx") => Ok(ArtifactKind::Onnx),
        Some("json") => Ok(ArtifactKind::Native),
        other => Err(PredictorError::model_load(
            path,
            format!("cannot infer model format from extension {:?}", other),
        )),
    }
}

fn model_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("model")
        .to_string()
}
