//! Per-session cache of the last prediction

use crate::types::prediction::PredictionResult;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;
use std::sync::{PoisonError, RwLock};
use tracing::debug;
use uuid::Uuid;

/// Cookie carrying the session id
pub const SESSION_COOKIE: &str = "rainfall_session";

/// Browser session identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Default)]
struct Entries {
    results: HashMap<SessionId, PredictionResult>,
    /// Insertion order, oldest first
    order: VecDeque<SessionId>,
}

/// Last prediction per session, bounded by capacity.
///
/// A new prediction overwrites the previous one for the same session. When
/// full, the session that was first stored is evicted.
pub struct SessionStore {
    entries: RwLock<Entries>,
    capacity: usize,
}

impl SessionStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            capacity: capacity.max(1),
        }
    }

    /// Store the latest result for a session
    pub fn store(&self, id: SessionId, result: PredictionResult) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

        if entries.results.insert(id, result).is_none() {
            entries.order.push_back(id);
        }

        while entries.results.len() > self.capacity {
            match entries.order.pop_front() {
                Some(oldest) => {
                    entries.results.remove(&oldest);
                    debug!(session = %oldest, "Evicted cached prediction");
                }
                None => break,
            }
        }
    }

    /// Last result for a session, if any
    pub fn last(&self, id: &SessionId) -> Option<PredictionResult> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .results
            .get(id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .results
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::observation::WeatherForm;
    use crate::types::prediction::RainOutcome;

    fn result(rain: f64) -> PredictionResult {
        let observation = WeatherForm::default().validate().unwrap();
        let outcome = if rain >= 0.5 {
            RainOutcome::Rain
        } else {
            RainOutcome::NoRain
        };
        PredictionResult::new(outcome, [1.0 - rain, rain], observation)
    }

    #[test]
    fn test_store_and_overwrite() {
        let store = SessionStore::new(8);
        let id = SessionId::new();

        assert!(store.last(&id).is_none());

        store.store(id, result(0.2));
        assert_eq!(store.last(&id).unwrap().rain_probability, 0.2);

        store.store(id, result(0.9));
        assert_eq!(store.last(&id).unwrap().rain_probability, 0.9);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_sessions_are_isolated() {
        let store = SessionStore::new(8);
        let a = SessionId::new();
        let b = SessionId::new();

        store.store(a, result(0.8));
        assert!(store.last(&b).is_none());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let store = SessionStore::new(2);
        let first = SessionId::new();
        let second = SessionId::new();
        let third = SessionId::new();

        store.store(first, result(0.1));
        store.store(second, result(0.2));
        store.store(third, result(0.3));

        assert_eq!(store.len(), 2);
        assert!(store.last(&first).is_none());
        assert!(store.last(&second).is_some());
        assert!(store.last(&third).is_some());
    }

    #[test]
    fn test_store_survives_poisoned_lock() {
        let store = SessionStore::new(8);
        let id = SessionId::new();

        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = store.entries.write().unwrap();
            panic!("writer panicked");
        }));
        assert!(store.entries.is_poisoned());

        store.store(id, result(0.7));
        assert_eq!(store.last(&id).unwrap().rain_probability, 0.7);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_session_id_round_trip() {
        let id = SessionId::new();
        let parsed: SessionId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<SessionId>().is_err());
    }
}
