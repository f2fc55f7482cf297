//! Decorative animations for the animated layout
//!
//! Pages only ever read what has already been fetched. Network fetches run
//! in background tasks; a failure is logged and retried after
//! `retry_after_secs`, and the page renders without the animation meanwhile.

use crate::config::AnimationConfig;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::debug;

/// Animation payloads available for one render
#[derive(Debug, Clone, Default)]
pub struct Animations {
    pub rain: Option<Arc<Value>>,
    pub sun: Option<Arc<Value>>,
}

/// Fetch state of one animation URL
#[derive(Debug, Clone)]
enum Slot {
    /// A background fetch is running
    Pending,
    Ready(Arc<Value>),
    /// Last fetch failed; not retried before this instant
    Failed { retry_at: Instant },
}

/// Fetches and memoises animation documents
pub struct AnimationFetcher {
    client: Option<reqwest::Client>,
    rain_url: String,
    sun_url: String,
    retry_after: Duration,
    slots: RwLock<HashMap<String, Slot>>,
}

impl AnimationFetcher {
    pub fn new(config: &AnimationConfig) -> Self {
        let client = if config.enabled {
            reqwest::Client::builder()
                .timeout(Duration::from_millis(config.timeout_ms))
                .build()
                .map_err(|e| debug!(error = %e, "Animation client unavailable"))
                .ok()
        } else {
            None
        };

        Self {
            client,
            rain_url: config.rain_url.clone(),
            sun_url: config.sun_url.clone(),
            retry_after: Duration::from_secs(config.retry_after_secs),
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// A fetcher that never touches the network
    pub fn disabled() -> Self {
        Self {
            client: None,
            rain_url: String::new(),
            sun_url: String::new(),
            retry_after: Duration::ZERO,
            slots: RwLock::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Animations fetched so far. Never waits on the network.
    pub fn cached(&self) -> Animations {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        let ready = |url: &str| match slots.get(url) {
            Some(Slot::Ready(value)) => Some(value.clone()),
            _ => None,
        };

        Animations {
            rain: ready(&self.rain_url),
            sun: ready(&self.sun_url),
        }
    }

    /// Start background fetches for every animation that is neither cached,
    /// in flight, nor waiting out its retry delay. Returns immediately.
    pub fn refresh(self: &Arc<Self>) {
        if !self.is_enabled() {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("No async runtime, animations not fetched");
            return;
        };

        for url in [&self.rain_url, &self.sun_url] {
            if self.claim(url) {
                let fetcher = Arc::clone(self);
                let url = url.clone();
                runtime.spawn(async move {
                    fetcher.fetch(&url).await;
                });
            }
        }
    }

    /// Mark `url` as pending when a new fetch should start
    fn claim(&self, url: &str) -> bool {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let due = match slots.get(url) {
            Some(Slot::Ready(_)) | Some(Slot::Pending) => false,
            Some(Slot::Failed { retry_at }) => Instant::now() >= *retry_at,
            None => true,
        };
        if due {
            slots.insert(url.to_string(), Slot::Pending);
        }
        due
    }

    fn settle(&self, url: &str, slot: Slot) {
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.to_string(), slot);
    }

    /// Fetch both animations concurrently and wait for them. Never fails.
    pub async fn fetch_all(&self) -> Animations {
        if !self.is_enabled() {
            return Animations::default();
        }

        let (rain, sun) = tokio::join!(self.fetch(&self.rain_url), self.fetch(&self.sun_url));
        Animations { rain, sun }
    }

    /// Fetch a single animation document, from cache when already fetched
    pub async fn fetch(&self, url: &str) -> Option<Arc<Value>> {
        let client = self.client.as_ref()?;

        if let Some(Slot::Ready(cached)) = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
        {
            return Some(cached.clone());
        }

        match Self::download(client, url).await {
            Some(value) => {
                self.settle(url, Slot::Ready(value.clone()));
                Some(value)
            }
            None => {
                self.settle(
                    url,
                    Slot::Failed {
                        retry_at: Instant::now() + self.retry_after,
                    },
                );
                None
            }
        }
    }

    async fn download(client: &reqwest::Client, url: &str) -> Option<Arc<Value>> {
        let response = match client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(url = %url, error = %e, "Animation fetch failed");
                return None;
            }
        };

        if !response.status().is_success() {
            debug!(url = %url, status = %response.status(), "Animation fetch returned error status");
            return None;
        }

        match response.json::<Value>().await {
            Ok(value) => Some(Arc::new(value)),
            Err(e) => {
                debug!(url = %url, error = %e, "Animation payload is not JSON");
                None
            }
        }
    }
}
