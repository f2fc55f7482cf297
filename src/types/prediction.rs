//! Prediction results produced by the inference engine

use crate::types::observation::WeatherObservation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discrete classifier output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RainOutcome {
    NoRain,
    Rain,
}

impl RainOutcome {
    /// Map a class label to an outcome. Anything other than 0 or 1 is rejected.
    pub fn from_label(label: i64) -> Option<Self> {
        match label {
            0 => Some(RainOutcome::NoRain),
            1 => Some(RainOutcome::Rain),
            _ => None,
        }
    }

    pub fn label(self) -> i64 {
        match self {
            RainOutcome::NoRain => 0,
            RainOutcome::Rain => 1,
        }
    }
}

/// Result of one inference call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Discrete prediction, the only input to message selection
    pub outcome: RainOutcome,
    /// Probability of the positive (rain) class
    pub rain_probability: f64,
    /// Full class distribution `[p_no_rain, p_rain]`
    pub probabilities: [f64; 2],
    /// Record sent to the model
    pub observation: WeatherObservation,
    /// When the prediction was made
    pub predicted_at: DateTime<Utc>,
}

impl PredictionResult {
    pub fn new(
        outcome: RainOutcome,
        probabilities: [f64; 2],
        observation: WeatherObservation,
    ) -> Self {
        Self {
            outcome,
            rain_probability: probabilities[1],
            probabilities,
            observation,
            predicted_at: Utc::now(),
        }
    }

    /// Compare model outputs, ignoring the timestamp
    pub fn same_output(&self, other: &PredictionResult) -> bool {
        self.outcome == other.outcome
            && self.probabilities == other.probabilities
            && self.observation == other.observation
    }
}
