//! Form field definitions and parsing of submitted values

use crate::error::{PredictorError, Result};
use crate::types::observation::WeatherForm;
use serde::{Deserialize, Serialize};

/// One input widget on the page
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub min: Option<i32>,
    pub max: Option<i32>,
    pub step: &'static str,
    pub help: &'static str,
}

/// Inputs in page order
pub const FIELDS: [FormField; 8] = [
    FormField {
        name: "pressure",
        label: "Pressure (hPa)",
        min: Some(900),
        max: Some(3000),
        step: "0.1",
        help: "Atmospheric pressure in hPa (lower = more likely to rain)",
    },
    FormField {
        name: "temperature",
        label: "Temperature (°C)",
        min: Some(-10),
        max: Some(60),
        step: "0.1",
        help: "Current temperature in Celsius",
    },
    FormField {
        name: "dewpoint",
        label: "Dew point (°C)",
        min: None,
        max: None,
        step: "0.1",
        help: "Temperature at which dew forms (closer to air temp = more humid)",
    },
    FormField {
        name: "humidity",
        label: "Humidity (%)",
        min: Some(0),
        max: Some(100),
        step: "1",
        help: "Relative humidity percentage",
    },
    FormField {
        name: "cloud",
        label: "Cloud cover (%)",
        min: Some(0),
        max: Some(100),
        step: "1",
        help: "Percentage of sky covered by clouds",
    },
    FormField {
        name: "sunshine",
        label: "Sunshine (hours)",
        min: Some(0),
        max: Some(24),
        step: "1",
        help: "Hours of sunshine expected",
    },
    FormField {
        name: "windspeed",
        label: "Wind speed (km/h)",
        min: None,
        max: None,
        step: "0.1",
        help: "Wind speed in km/h",
    },
    FormField {
        name: "winddirection",
        label: "Wind direction (degrees 0-360)",
        min: Some(0),
        max: Some(360),
        step: "1",
        help: "Wind direction in degrees (0-360)",
    },
];

/// Submitted form, as typed by the user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawForm {
    pub pressure: Option<String>,
    pub temperature: Option<String>,
    pub dewpoint: Option<String>,
    pub humidity: Option<String>,
    pub cloud: Option<String>,
    pub sunshine: Option<String>,
    pub windspeed: Option<String>,
    pub winddirection: Option<String>,
}

impl RawForm {
    /// Parse every field into a typed form. Domains are checked later by
    /// [`WeatherForm::validate`].
    pub fn parse(&self) -> Result<WeatherForm> {
        Ok(WeatherForm {
            pressure: parse_float("pressure", &self.pressure)?,
            temperature: parse_float("temperature", &self.temperature)?,
            dewpoint: parse_float("dewpoint", &self.dewpoint)?,
            humidity: parse_int("humidity", &self.humidity)?,
            cloud: parse_int("cloud", &self.cloud)?,
            sunshine: parse_int("sunshine", &self.sunshine)?,
            windspeed: parse_float("windspeed", &self.windspeed)?,
            winddirection: parse_int("winddirection", &self.winddirection)?,
        })
    }

    /// Value to put back into the named input
    pub fn value(&self, name: &str) -> &str {
        let value = match name {
            "pressure" => self.pressure.as_deref(),
            "temperature" => self.temperature.as_deref(),
            "dewpoint" => self.dewpoint.as_deref(),
            "humidity" => self.humidity.as_deref(),
            "cloud" => self.cloud.as_deref(),
            "sunshine" => self.sunshine.as_deref(),
            "windspeed" => self.windspeed.as_deref(),
            "winddirection" => self.winddirection.as_deref(),
            _ => None,
        };
        value.unwrap_or("")
    }
}

impl From<&WeatherForm> for RawForm {
    fn from(form: &WeatherForm) -> Self {
        Self {
            pressure: Some(format!("{:.1}", form.pressure)),
            temperature: Some(format!("{:.1}", form.temperature)),
            dewpoint: Some(format!("{:.1}", form.dewpoint)),
            humidity: Some(form.humidity.to_string()),
            cloud: Some(form.cloud.to_string()),
            sunshine: Some(form.sunshine.to_string()),
            windspeed: Some(format!("{:.1}", form.windspeed)),
            winddirection: Some(form.winddirection.to_string()),
        }
    }
}

fn required<'a>(field: &'static str, value: &'a Option<String>) -> Result<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(PredictorError::validation(field, "a value is required")),
    }
}

fn parse_float(field: &'static str, value: &Option<String>) -> Result<f64> {
    let raw = required(field, value)?;
    raw.parse::<f64>()
        .map_err(|_| PredictorError::validation(field, format!("'{}' is not a number", raw)))
}

fn parse_int(field: &'static str, value: &Option<String>) -> Result<i64> {
    let raw = required(field, value)?;
    raw.parse::<i64>()
        .map_err(|_| PredictorError::validation(field, format!("'{}' is not a whole number", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_round_trip_through_raw_form() {
        let form = WeatherForm::default();
        let raw = RawForm::from(&form);

        assert_eq!(raw.value("pressure"), "1012.0");
        assert_eq!(raw.value("winddirection"), "90");
        assert_eq!(raw.parse().unwrap(), form);
    }

    #[test]
    fn test_missing_field() {
        let raw = RawForm {
            humidity: None,
            ..RawForm::from(&WeatherForm::default())
        };
        match raw.parse() {
            Err(PredictorError::Validation { field, .. }) => assert_eq!(field, "humidity"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_unparsable_values() {
        let raw = RawForm {
            dewpoint: Some("warm".to_string()),
            ..RawForm::from(&WeatherForm::default())
        };
        assert!(raw.parse().unwrap_err().to_string().contains("not a number"));

        let raw = RawForm {
            sunshine: Some("6.5".to_string()),
            ..RawForm::from(&WeatherForm::default())
        };
        assert!(raw.parse().unwrap_err().to_string().contains("not a whole number"));
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let raw = RawForm {
            cloud: Some(" 75 ".to_string()),
            ..RawForm::from(&WeatherForm::default())
        };
        assert_eq!(raw.parse().unwrap().cloud, 75);
    }

    #[test]
    fn test_field_table_covers_form() {
        let raw = RawForm::from(&WeatherForm::default());
        for field in FIELDS {
            assert!(!raw.value(field.name).is_empty(), "{} has no value", field.name);
        }
    }
}
