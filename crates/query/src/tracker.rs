use formats::records::CourtFindResult;
use serde::Serialize;

use crate::params::{FindParams, QueryKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    Http { status: u16 },
    Network(String),
    Decode(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Http { status } => write!(f, "court service answered HTTP {status}"),
            FetchError::Network(msg) => write!(f, "court service unreachable: {msg}"),
            FetchError::Decode(msg) => write!(f, "court service response invalid: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchState {
    /// Query disabled (no marker yet, or no court selected).
    Idle,
    Loading(QueryKey),
    Ready {
        key: QueryKey,
        results: Vec<CourtFindResult>,
    },
    Failed {
        key: QueryKey,
        error: FetchError,
    },
}

/// A fetch the host must perform and answer with the same key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FindRequest {
    pub key: QueryKey,
    pub params: FindParams,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    Disabled,
    /// Same key as the active query; nothing to fetch.
    Unchanged,
    Started(FindRequest),
}

/// Tracks the active query key; responses for any other key are discarded.
///
/// In-flight requests are never cancelled. A late response for an outdated
/// key loses because its key no longer matches, whatever order responses
/// arrive in.
#[derive(Debug, Clone)]
pub struct QueryTracker {
    state: FetchState,
}

impl Default for QueryTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryTracker {
    pub fn new() -> Self {
        Self {
            state: FetchState::Idle,
        }
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    pub fn active_key(&self) -> Option<&QueryKey> {
        match &self.state {
            FetchState::Idle => None,
            FetchState::Loading(key) => Some(key),
            FetchState::Ready { key, .. } | FetchState::Failed { key, .. } => Some(key),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, FetchState::Loading(_))
    }

    /// Results of the active key; empty while loading, failed or idle.
    pub fn results(&self) -> &[CourtFindResult] {
        match &self.state {
            FetchState::Ready { results, .. } => results,
            _ => &[],
        }
    }

    pub fn request(&mut self, params: Option<FindParams>) -> RequestOutcome {
        let Some(params) = params else {
            if self.state != FetchState::Idle {
                tracing::debug!("query disabled");
            }
            self.state = FetchState::Idle;
            return RequestOutcome::Disabled;
        };

        let key = params.key();
        if self.active_key() == Some(&key) {
            return RequestOutcome::Unchanged;
        }

        tracing::debug!(%key, "query started");
        self.state = FetchState::Loading(key.clone());
        RequestOutcome::Started(FindRequest {
            path: params.path(),
            key,
            params,
        })
    }

    /// Applies a response. Returns `false` when `key` is not the active key.
    pub fn complete(
        &mut self,
        key: &QueryKey,
        outcome: Result<Vec<CourtFindResult>, FetchError>,
    ) -> bool {
        if self.active_key() != Some(key) {
            tracing::debug!(%key, "stale response discarded");
            return false;
        }
        self.state = match outcome {
            Ok(results) => {
                tracing::debug!(%key, results = results.len(), "query ready");
                FetchState::Ready {
                    key: key.clone(),
                    results,
                }
            }
            Err(error) => {
                tracing::warn!(%key, "query failed: {error}");
                FetchState::Failed {
                    key: key.clone(),
                    error,
                }
            }
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formats::records::Judicial;
    use foundation::geo::LngLat;
    use foundation::ids::PolygonId;
    use pretty_assertions::assert_eq;

    fn params(lat: f64) -> FindParams {
        FindParams::new(vec!["j1".to_string()], LngLat::new(51.0, lat))
    }

    fn result(id: &str) -> CourtFindResult {
        CourtFindResult {
            id: PolygonId::new(id),
            name: id.to_string(),
            address: None,
            phone: None,
            description: None,
            polygon: "POLYGON((0 0, 1 0, 1 1))".to_string(),
            judicial: Judicial {
                id: None,
                name: "Civil".to_string(),
                code: 1,
            },
        }
    }

    fn started(outcome: RequestOutcome) -> FindRequest {
        match outcome {
            RequestOutcome::Started(req) => req,
            other => panic!("expected a started request, got {other:?}"),
        }
    }

    #[test]
    fn last_request_by_key_wins() {
        let mut t = QueryTracker::new();
        let first = started(t.request(Some(params(35.0))));
        let second = started(t.request(Some(params(36.0))));

        assert!(t.complete(&second.key, Ok(vec![result("new")])));
        assert!(!t.complete(&first.key, Ok(vec![result("old")])));
        assert_eq!(t.results().len(), 1);
        assert_eq!(t.results()[0].id, PolygonId::new("new"));
    }

    #[test]
    fn late_stale_response_before_current_is_ignored() {
        let mut t = QueryTracker::new();
        let first = started(t.request(Some(params(35.0))));
        let second = started(t.request(Some(params(36.0))));
        assert!(!t.complete(&first.key, Ok(vec![result("old")])));
        assert!(t.is_loading());
        assert!(t.complete(&second.key, Ok(Vec::new())));
        assert!(!t.is_loading());
    }

    #[test]
    fn same_key_is_not_refetched() {
        let mut t = QueryTracker::new();
        started(t.request(Some(params(35.0))));
        assert_eq!(t.request(Some(params(35.0))), RequestOutcome::Unchanged);
    }

    #[test]
    fn disabling_resets_to_idle() {
        let mut t = QueryTracker::new();
        let req = started(t.request(Some(params(35.0))));
        assert_eq!(t.request(None), RequestOutcome::Disabled);
        assert_eq!(t.state(), &FetchState::Idle);
        assert!(!t.complete(&req.key, Ok(vec![result("late")])));
    }

    #[test]
    fn failure_is_recorded_for_active_key() {
        let mut t = QueryTracker::new();
        let req = started(t.request(Some(params(35.0))));
        assert!(t.complete(&req.key, Err(FetchError::Http { status: 502 })));
        assert_eq!(
            t.state(),
            &FetchState::Failed {
                key: req.key.clone(),
                error: FetchError::Http { status: 502 }
            }
        );
        assert!(t.results().is_empty());
    }

    #[test]
    fn request_carries_path() {
        let mut t = QueryTracker::new();
        let req = started(t.request(Some(params(35.5))));
        assert_eq!(req.path, "/court/find?judicial_ids=j1&lat=35.5&lng=51");
    }
}
