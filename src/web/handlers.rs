//! Request handlers

use crate::animations::Animations;
use crate::config::Layout;
use crate::render::RenderedResult;
use crate::session::{SessionId, SESSION_COOKIE};
use crate::types::observation::WeatherForm;
use crate::web::form::RawForm;
use crate::web::page::{self, ErrorNotice, PageView};
use crate::web::AppState;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::{Form, Json};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// `GET /`: the empty form, plus the session's last result in the animated layout
pub async fn index(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (session, is_new) = resolve_session(&headers);
    let animated = state.ui.layout == Layout::Animated;

    let cached = if animated {
        state.sessions.last(&session)
    } else {
        None
    };

    let view = PageView {
        title: &state.ui.title,
        layout: state.ui.layout,
        model_name: state.engine.model_name(),
        values: RawForm::from(&WeatherForm::default()),
        model_input: cached
            .as_ref()
            .map(|r| state.engine.model_input(&r.observation)),
        result: cached.as_ref().map(RenderedResult::from_prediction),
        error: None,
        animations: animations(&state),
    };

    with_session_cookie(page_response(&view), session, is_new)
}

/// `POST /predict`: validate the form, run the model, render the outcome.
///
/// Bad input and classifier failures are shown on the page; the server
/// keeps serving either way.
pub async fn predict(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(raw): Form<RawForm>,
) -> Response {
    let (session, is_new) = resolve_session(&headers);
    let animated = state.ui.layout == Layout::Animated;

    let mut model_input = None;
    let mut result = None;
    let mut failure = None;

    match raw.parse().and_then(|form| form.validate()) {
        Err(e) => {
            state.metrics.record_validation_error();
            warn!(session = %session, error = %e, "Rejected form submission");
            failure = Some(e);
        }
        Ok(observation) => {
            model_input = Some(state.engine.model_input(&observation));
            let start = Instant::now();

            match state.engine.predict(&observation) {
                Ok(prediction) => {
                    let elapsed = start.elapsed();
                    state.metrics.record_prediction(
                        elapsed,
                        prediction.outcome,
                        prediction.rain_probability,
                    );
                    info!(
                        session = %session,
                        outcome = ?prediction.outcome,
                        rain_probability = prediction.rain_probability,
                        inference_us = elapsed.as_micros() as u64,
                        "Prediction served"
                    );

                    result = Some(RenderedResult::from_prediction(&prediction));
                    if animated {
                        state.sessions.store(session, prediction);
                    }
                }
                Err(e) => {
                    state.metrics.record_inference_error();
                    error!(session = %session, error = %e, "Inference failed");
                    failure = Some(e);
                }
            }
        }
    }

    let view = PageView {
        title: &state.ui.title,
        layout: state.ui.layout,
        model_name: state.engine.model_name(),
        values: raw,
        model_input,
        result,
        error: failure.as_ref().map(ErrorNotice::from),
        animations: animations(&state),
    };

    with_session_cookie(page_response(&view), session, is_new)
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "model": state.engine.model_name(),
        "features": state.engine.feature_names(),
    }))
}

/// `GET /metrics`
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.snapshot())
}

/// Whatever animations are already fetched; missing ones are fetched in the background
fn animations(state: &AppState) -> Animations {
    if state.ui.layout == Layout::Animated {
        state.animations.refresh();
        state.animations.cached()
    } else {
        Animations::default()
    }
}

fn page_response(view: &PageView<'_>) -> Response {
    match page::render(view) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(error = %e, "Page rendering failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Page rendering failed").into_response()
        }
    }
}

/// Session from the request cookie, or a fresh one
fn resolve_session(headers: &HeaderMap) -> (SessionId, bool) {
    match session_cookie(headers) {
        Some(id) => (id, false),
        None => {
            let id = SessionId::new();
            debug!(session = %id, "New session");
            (id, true)
        }
    }
}

fn session_cookie(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| value.parse().ok())
}

fn with_session_cookie(mut response: Response, session: SessionId, is_new: bool) -> Response {
    if is_new {
        let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, session);
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_parsing() {
        let id = SessionId::new();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {}={}", SESSION_COOKIE, id)).unwrap(),
        );

        assert_eq!(session_cookie(&headers), Some(id));
        assert_eq!(resolve_session(&headers), (id, false));
    }

    #[test]
    fn test_invalid_session_cookie_starts_new_session() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("rainfall_session=garbage"),
        );

        assert!(session_cookie(&headers).is_none());
        let (_, is_new) = resolve_session(&headers);
        assert!(is_new);
    }

    #[test]
    fn test_cookie_only_set_for_new_sessions() {
        let id = SessionId::new();
        let response = with_session_cookie(Html("ok").into_response(), id, false);
        assert!(response.headers().get(header::SET_COOKIE).is_none());

        let response = with_session_cookie(Html("ok").into_response(), id, true);
        let cookie = response.headers().get(header::SET_COOKIE).unwrap();
        assert!(cookie.to_str().unwrap().starts_with(&format!("{}={}", SESSION_COOKIE, id)));
    }
}
