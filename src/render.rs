//! Turns a prediction into the text shown on the page

use crate::types::prediction::{PredictionResult, RainOutcome};
use serde::Serialize;

/// Format a probability in [0, 1] as a percentage with one decimal
pub fn percentage(probability: f64) -> String {
    format!("{:.1}%", probability * 100.0)
}

/// User-facing rendering of one prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedResult {
    pub outcome: RainOutcome,
    /// e.g. `"73.4%"`
    pub probability: String,
    pub message: String,
}

impl RenderedResult {
    /// Build the display text. The message is chosen by the label only.
    pub fn from_prediction(result: &PredictionResult) -> Self {
        let probability = percentage(result.rain_probability);
        let message = match result.outcome {
            RainOutcome::Rain => format!(
                "Rain is likely to occur ({} chance). Don't forget your umbrella!",
                probability
            ),
            RainOutcome::NoRain => {
                format!("No rain expected ({} chance). Enjoy your day!", probability)
            }
        };

        Self {
            outcome: result.outcome,
            probability,
            message,
        }
    }

    pub fn is_rain(&self) -> bool {
        self.outcome == RainOutcome::Rain
    }
}
