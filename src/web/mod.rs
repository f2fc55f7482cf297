//! HTTP surface: the prediction form, health and metrics endpoints

pub mod form;
pub mod handlers;
pub mod page;

use crate::animations::AnimationFetcher;
use crate::config::{AppConfig, Layout, UiConfig};
use crate::metrics::PredictionMetrics;
use crate::models::inference::InferenceEngine;
use crate::session::SessionStore;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

/// Shared state handed to every request.
///
/// Holding an `InferenceEngine` is the only way to build one, so a router
/// cannot exist without a loaded model.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<InferenceEngine>,
    pub sessions: Arc<SessionStore>,
    pub metrics: Arc<PredictionMetrics>,
    pub animations: Arc<AnimationFetcher>,
    pub ui: Arc<UiConfig>,
}

impl AppState {
    /// Build the shared state. In the animated layout this also starts the
    /// background animation fetch, so it must run inside a tokio runtime to
    /// get animations at all.
    pub fn new(config: &AppConfig, engine: Arc<InferenceEngine>, metrics: Arc<PredictionMetrics>) -> Self {
        let animations = if config.ui.layout == Layout::Animated {
            Arc::new(AnimationFetcher::new(&config.animations))
        } else {
            Arc::new(AnimationFetcher::disabled())
        };
        animations.refresh();

        Self {
            engine,
            sessions: Arc::new(SessionStore::new(config.ui.session_capacity)),
            metrics,
            animations,
            ui: Arc::new(config.ui.clone()),
        }
    }
}

/// Build the axum Router for the form and service endpoints
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/predict", post(handlers::predict))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
}
