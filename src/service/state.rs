//! Service state and per-request context.

use std::sync::Arc;

use axum::http::HeaderMap;

use crate::browser::RevisionBrowser;
use crate::config::BrowserConfig;
use crate::store::RevisionStore;

/// Header carrying a caller-supplied request id.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Header carrying the authenticated user, set by the fronting proxy.
pub const REMOTE_USER_HEADER: &str = "X-Remote-User";

/// Actor recorded when no authenticated user is known.
pub const SYSTEM_ACTOR: &str = "system";

/// Shared service state.
pub struct ServiceState<S: RevisionStore + 'static> {
    /// The revision browser serving all read operations.
    pub browser: Arc<RevisionBrowser<S>>,
}

impl<S: RevisionStore + 'static> ServiceState<S> {
    /// Create service state over a store.
    pub fn new(store: S, config: BrowserConfig) -> Self {
        Self {
            browser: Arc::new(RevisionBrowser::with_config(Arc::new(store), config)),
        }
    }

    /// Create service state from environment variables.
    pub fn from_env(store: S) -> Self {
        Self::new(store, BrowserConfig::from_env())
    }
}

impl<S: RevisionStore + 'static> Clone for ServiceState<S> {
    fn clone(&self) -> Self {
        Self {
            browser: Arc::clone(&self.browser),
        }
    }
}

/// Who issued a request and under which correlation id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Caller-supplied `X-Request-Id`, or a fresh UUID.
    pub request_id: String,
    /// Authenticated user, or `system`.
    pub actor: String,
}

impl RequestContext {
    /// Derive the context from request headers.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Self {
            request_id: header(REQUEST_ID_HEADER).unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            actor: header(REMOTE_USER_HEADER).unwrap_or_else(|| SYSTEM_ACTOR.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_context_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("req-1"));
        headers.insert(REMOTE_USER_HEADER, HeaderValue::from_static("doctor01"));

        let ctx = RequestContext::from_headers(&headers);
        assert_eq!(ctx.request_id, "req-1");
        assert_eq!(ctx.actor, "doctor01");
    }

    #[test]
    fn test_context_defaults() {
        let ctx = RequestContext::from_headers(&HeaderMap::new());
        assert_eq!(ctx.actor, SYSTEM_ACTOR);
        assert!(uuid::Uuid::parse_str(&ctx.request_id).is_ok());
    }
}
