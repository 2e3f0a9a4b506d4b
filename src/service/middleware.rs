//! Service middleware for metrics and audit logging.
//!
//! ## Log Targets
//!
//! - `karte_revisions::metrics` - one event per request by path pattern, method, status
//! - `karte_revisions::audit` - one event per served read, with actor and outcome

use axum::{
    extract::Request,
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;
use std::time::Instant;
use tracing::info;

use super::state::RequestContext;

/// Metrics middleware that records request counts and latency.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = normalize_path(request.uri().path());

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();

    info!(
        target: "karte_revisions::metrics",
        metric_type = "request",
        path = %path,
        method = %method,
        status = status,
        latency_ms = latency.as_millis() as u64,
        "request_metric"
    );

    response
}

/// Normalize path for metrics to avoid high cardinality.
///
/// Replaces numeric path segments with `:id`.
fn normalize_path(path: &str) -> String {
    static NUMERIC_SEGMENT: OnceLock<Option<regex_lite::Regex>> = OnceLock::new();
    let Some(regex) = NUMERIC_SEGMENT.get_or_init(|| regex_lite::Regex::new(r"^-?[0-9]+$").ok()) else {
        return path.to_string();
    };

    path.split('/')
        .map(|segment| if regex.is_match(segment) { ":id" } else { segment })
        .collect::<Vec<_>>()
        .join("/")
}

/// Audited read operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    /// Revision history listing.
    HistoryRead,
    /// Single revision fetch.
    RevisionGet,
    /// Revision diff.
    RevisionDiff,
}

impl AuditAction {
    /// Stable action name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HistoryRead => "KARTE_REVISION_HISTORY_READ",
            Self::RevisionGet => "KARTE_REVISION_GET",
            Self::RevisionDiff => "KARTE_REVISION_DIFF",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an audited operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditStatus {
    /// The requested data was served.
    Success,
    /// A requested revision does not exist.
    Missing,
}

impl AuditStatus {
    /// Stable status name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Missing => "MISSING",
        }
    }
}

/// Record an audit event for a read operation.
pub fn record_audit(action: AuditAction, status: AuditStatus, ctx: &RequestContext, details: Value) {
    info!(
        target: "karte_revisions::audit",
        action = action.as_str(),
        status = status.as_str(),
        request_id = %ctx.request_id,
        actor = %ctx.actor,
        details = %details,
        "audit_event"
    );
}
