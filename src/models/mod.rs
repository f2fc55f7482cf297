//! Classifier loading and inference

pub mod classifier;
pub mod inference;
pub mod loader;

pub use classifier::{Classifier, LogisticModel, OnnxModel};
pub use inference::InferenceEngine;
pub use loader::ModelLoader;
