//! HTML rendering for both page layouts
//!
//! Pages are minijinja templates compiled into the binary. Template names end
//! in `.html`, so every interpolation is HTML-escaped unless the value is
//! explicitly marked safe.

use crate::animations::Animations;
use crate::config::Layout;
use crate::error::PredictorError;
use crate::render::RenderedResult;
use crate::web::form::{RawForm, FIELDS};
use minijinja::{context, Environment, Value};
use serde::{Serialize, Serializer};
use std::sync::OnceLock;
use tracing::error;

const TEMPLATES: [(&str, &str); 5] = [
    ("base.html", include_str!("../../templates/base.html")),
    ("form.html", include_str!("../../templates/form.html")),
    ("outcome.html", include_str!("../../templates/outcome.html")),
    ("classic.html", include_str!("../../templates/classic.html")),
    ("animated.html", include_str!("../../templates/animated.html")),
];

/// Everything one page render needs
#[derive(Serialize)]
pub struct PageView<'a> {
    pub title: &'a str,
    pub layout: Layout,
    pub model_name: &'a str,
    pub values: RawForm,
    /// Features sent to the model, in model order
    #[serde(serialize_with = "display_values")]
    pub model_input: Option<Vec<(&'static str, f32)>>,
    pub result: Option<RenderedResult>,
    pub error: Option<ErrorNotice>,
    #[serde(skip)]
    pub animations: Animations,
}

/// Error panel content
#[derive(Debug, Clone, Serialize)]
pub struct ErrorNotice {
    pub message: String,
    /// Point the user at the feature order, for classifier failures
    pub check_features: bool,
}

impl From<&PredictorError> for ErrorNotice {
    fn from(error: &PredictorError) -> Self {
        Self {
            message: error.to_string(),
            check_features: matches!(error, PredictorError::Inference(_)),
        }
    }
}

/// Render a full HTML document
pub fn render(view: &PageView<'_>) -> Result<String, minijinja::Error> {
    let name = match view.layout {
        Layout::Classic => "classic.html",
        Layout::Animated => "animated.html",
    };

    environment().get_template(name)?.render(context! {
        fields => FIELDS,
        animation => animation(view),
        ..Value::from_serialize(view)
    })
}

fn environment() -> &'static Environment<'static> {
    static ENV: OnceLock<Environment<'static>> = OnceLock::new();
    ENV.get_or_init(|| {
        let mut env = Environment::new();
        for (name, source) in TEMPLATES {
            if let Err(e) = env.add_template(name, source) {
                error!(template = name, error = %e, "Invalid page template");
            }
        }
        env
    })
}

/// Rain animation once rain is predicted, sunshine otherwise
fn animation(view: &PageView<'_>) -> Option<Value> {
    let wants_rain = view.result.as_ref().map(|r| r.is_rain()).unwrap_or(false);
    let chosen = if wants_rain {
        &view.animations.rain
    } else {
        &view.animations.sun
    };

    // JSON placed inside a `<script>` element must not close it
    chosen
        .as_ref()
        .map(|data| Value::from_safe_string(data.to_string().replace("</", "<\\/")))
}

fn display_values<S: Serializer>(
    input: &Option<Vec<(&'static str, f32)>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    input
        .as_ref()
        .map(|columns| {
            columns
                .iter()
                .map(|(name, value)| (*name, value.to_string()))
                .collect::<Vec<_>>()
        })
        .serialize(serializer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::observation::WeatherForm;
    use crate::types::prediction::{PredictionResult, RainOutcome};
    use std::sync::Arc;

    fn view(layout: Layout) -> PageView<'static> {
        PageView {
            title: "Rainfall Prediction Web App",
            layout,
            model_name: "sample",
            values: RawForm::from(&WeatherForm::default()),
            model_input: None,
            result: None,
            error: None,
            animations: Animations::default(),
        }
    }

    #[test]
    fn test_templates_compile() {
        let mut env = Environment::new();
        for (name, source) in TEMPLATES {
            env.add_template(name, source).unwrap();
        }
    }

    #[test]
    fn test_form_has_all_inputs_with_defaults() {
        let html = render(&view(Layout::Classic)).unwrap();
        for field in FIELDS {
            assert!(html.contains(&format!("name=\"{}\"", field.name)));
        }
        assert!(html.contains("value=\"1012.0\""));
        assert!(html.contains("min=\"900\" max=\"3000\""));
        assert!(html.contains("What do the inputs mean?"));
        assert!(html.contains("<code>sample</code>"));
        assert!(!html.contains("class=\"columns\""));
    }

    #[test]
    fn test_empty_value_renders_blank() {
        let mut page = view(Layout::Classic);
        page.values.humidity = None;

        let html = render(&page).unwrap();
        assert!(html.contains("name=\"humidity\" type=\"number\" step=\"1\" min=\"0\" max=\"100\" value=\"\""));
        assert!(!html.contains("value=\"none\""));
    }

    #[test]
    fn test_result_rendering() {
        let observation = WeatherForm::default().validate().unwrap();
        let result = PredictionResult::new(RainOutcome::Rain, [0.2, 0.8], observation);

        let mut page = view(Layout::Classic);
        page.result = Some(RenderedResult::from_prediction(&result));
        page.model_input = Some(vec![("pressure", 1012.0), ("dewpoint", 15.5)]);

        let html = render(&page).unwrap();
        assert!(html.contains("<div class=\"metric\">80.0%</div>"));
        assert!(html.contains("class=\"success\""));
        assert!(html.contains("forget your umbrella!"));
        assert!(html.contains("See input data sent to model"));
        assert!(html.contains("<th>pressure</th><th>dewpoint</th>"));
        assert!(html.contains("<td>1012</td><td>15.5</td>"));
    }

    #[test]
    fn test_submitted_values_are_escaped() {
        let mut page = view(Layout::Classic);
        page.values.pressure = Some("\"><script>alert(1)</script>".to_string());

        let html = render(&page).unwrap();
        assert!(!html.contains("<script>alert(1)"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_inference_error_hint() {
        let error = PredictorError::inference("shape <mismatch>");
        let mut page = view(Layout::Classic);
        page.error = Some(ErrorNotice::from(&error));

        let html = render(&page).unwrap();
        assert!(html.contains("Prediction error: shape &lt;mismatch&gt;"));
        assert!(html.contains("exactly these features in this order"));
    }

    #[test]
    fn test_validation_error_has_no_hint() {
        let error = PredictorError::validation("humidity", "must be within [0, 100]");
        let mut page = view(Layout::Classic);
        page.error = Some(ErrorNotice::from(&error));

        let html = render(&page).unwrap();
        assert!(html.contains("Invalid input for humidity"));
        assert!(!html.contains("exactly these features in this order"));
    }

    #[test]
    fn test_animated_layout_without_animations() {
        let html = render(&view(Layout::Animated)).unwrap();
        assert!(html.contains("class=\"columns\""));
        assert!(!html.contains("lottie.min.js"));
    }

    #[test]
    fn test_animated_layout_embeds_animation() {
        let mut page = view(Layout::Animated);
        page.animations.sun = Some(Arc::new(serde_json::json!({"nm": "</script>"})));

        let html = render(&page).unwrap();
        assert!(html.contains("lottie.min.js"));
        assert!(html.contains(r#"{"nm":"<\/script>"}"#));
    }
}
