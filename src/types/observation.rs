//! Weather measurements collected from the form

use crate::error::{PredictorError, Result};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const PRESSURE_RANGE: RangeInclusive<f64> = 900.0..=3000.0;
pub const TEMPERATURE_RANGE: RangeInclusive<f64> = -10.0..=60.0;
pub const HUMIDITY_RANGE: RangeInclusive<i64> = 0..=100;
pub const CLOUD_RANGE: RangeInclusive<i64> = 0..=100;
pub const SUNSHINE_RANGE: RangeInclusive<i64> = 0..=24;
pub const WIND_DIRECTION_RANGE: RangeInclusive<i64> = 0..=360;

/// Everything the user enters on the page.
///
/// `temperature` is collected and shown back but never reaches the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherForm {
    /// Atmospheric pressure (hPa)
    pub pressure: f64,
    /// Air temperature (°C), display only
    pub temperature: f64,
    /// Dew point (°C)
    pub dewpoint: f64,
    /// Relative humidity (%)
    pub humidity: i64,
    /// Cloud cover (%)
    pub cloud: i64,
    /// Expected sunshine (hours)
    pub sunshine: i64,
    /// Wind speed (km/h)
    pub windspeed: f64,
    /// Wind direction (degrees)
    pub winddirection: i64,
}

impl Default for WeatherForm {
    fn default() -> Self {
        Self {
            pressure: 1012.0,
            temperature: 22.0,
            dewpoint: 15.0,
            humidity: 60,
            cloud: 50,
            sunshine: 6,
            windspeed: 12.0,
            winddirection: 90,
        }
    }
}

impl WeatherForm {
    /// Check every field against the widget bounds and build the model record.
    pub fn validate(&self) -> Result<WeatherObservation> {
        check_float("pressure", self.pressure, Some(&PRESSURE_RANGE))?;
        check_float("temperature", self.temperature, Some(&TEMPERATURE_RANGE))?;
        check_float("dewpoint", self.dewpoint, None)?;
        check_int("humidity", self.humidity, &HUMIDITY_RANGE)?;
        check_int("cloud", self.cloud, &CLOUD_RANGE)?;
        check_int("sunshine", self.sunshine, &SUNSHINE_RANGE)?;
        check_float("windspeed", self.windspeed, None)?;
        check_int("winddirection", self.winddirection, &WIND_DIRECTION_RANGE)?;

        Ok(WeatherObservation {
            pressure: self.pressure,
            dewpoint: self.dewpoint,
            humidity: self.humidity,
            cloud: self.cloud,
            sunshine: self.sunshine,
            winddirection: self.winddirection,
            windspeed: self.windspeed,
        })
    }
}

fn check_float(
    field: &'static str,
    value: f64,
    range: Option<&RangeInclusive<f64>>,
) -> Result<()> {
    if !value.is_finite() {
        return Err(PredictorError::validation(field, "must be a finite number"));
    }
    match range {
        Some(range) if !range.contains(&value) => Err(PredictorError::validation(
            field,
            format!(
                "{} is outside [{}, {}]",
                value,
                range.start(),
                range.end()
            ),
        )),
        _ => Ok(()),
    }
}

fn check_int(field: &'static str, value: i64, range: &RangeInclusive<i64>) -> Result<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(PredictorError::validation(
            field,
            format!("{} is outside [{}, {}]", value, range.start(), range.end()),
        ))
    }
}

/// The seven measurements the classifier was trained on.
///
/// Field order matches the training columns; see
/// [`FeatureExtractor`](crate::feature_extractor::FeatureExtractor).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub pressure: f64,
    pub dewpoint: f64,
    pub humidity: i64,
    pub cloud: i64,
    pub sunshine: i64,
    pub winddirection: i64,
    pub windspeed: f64,
}
