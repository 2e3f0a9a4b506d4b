//! Axum routes for the revision history service.

use axum::{
    extract::{Json, Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, warn};

use crate::browser::BrowserError;
use crate::store::{PostgresRevisionStore, RevisionStore};
use crate::types::{RevisionDiff, RevisionHistory, Snapshot};
use crate::validation::{
    parse_optional_id, parse_visit_date, require_chart_id, require_revision_id,
    require_revision_pair, ValidationError,
};
use crate::REVISION_SCHEMA_VERSION;

use super::middleware::{record_audit, AuditAction, AuditStatus};
use super::state::{RequestContext, ServiceState};

/// Type alias for the service state with PostgresRevisionStore.
pub type AppState = ServiceState<PostgresRevisionStore>;

/// Error code of a missing revision.
pub const NOT_FOUND_CODE: &str = "revision_not_found";

/// Error code of a backend failure.
pub const STORE_ERROR_CODE: &str = "STORE_ERROR";

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query of the history listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    /// Chart id.
    pub karte_id: Option<String>,
    /// Visit day, `YYYY-MM-DD`.
    pub visit_date: Option<String>,
    /// Alias of `visitDate`.
    pub encounter_id: Option<String>,
}

/// Query of the diff operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffQuery {
    /// Older side.
    pub from_revision_id: Option<String>,
    /// Newer side.
    pub to_revision_id: Option<String>,
}

/// Service health response (detailed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub schema_version: String,
    /// Store connectivity status.
    pub store_healthy: bool,
}

/// Simple liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    pub status: String,
}

/// Readiness response with dependency status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub database: bool,
    pub details: Option<String>,
}

/// Structured error response with correlation ID for tracing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable error code.
    pub code: String,
    /// Correlation ID for request tracing (matches X-Request-Id or generated UUID).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// Additional error details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorResponse {
    /// Create a new error response with code and message.
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            correlation_id: None,
            details: None,
        }
    }

    /// Add a correlation ID to the error.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Add details to the error.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

fn validation_failure(err: ValidationError, ctx: &RequestContext) -> (StatusCode, Json<ErrorResponse>) {
    warn!(
        code = err.code,
        error = %err.message,
        correlation_id = %ctx.request_id,
        "Request validation failed"
    );
    let mut response = ErrorResponse::new(err.code, err.message).with_correlation_id(&ctx.request_id);
    if !err.details.is_empty() {
        response = response.with_details(Value::Object(err.details));
    }
    (StatusCode::UNPROCESSABLE_ENTITY, Json(response))
}

fn not_found(ctx: &RequestContext) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(NOT_FOUND_CODE, "Revision not found").with_correlation_id(&ctx.request_id)),
    )
}

fn internal_failure(err: BrowserError, ctx: &RequestContext) -> (StatusCode, Json<ErrorResponse>) {
    error!(error = %err, correlation_id = %ctx.request_id, "Revision read failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(STORE_ERROR_CODE, err.to_string()).with_correlation_id(&ctx.request_id)),
    )
}

// ============================================================================
// Route Handlers
// ============================================================================

/// List the revision history of a chart for one visit day.
async fn history_handler<S: RevisionStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<RevisionHistory> {
    let ctx = RequestContext::from_headers(&headers);

    let (chart_id, day) = parse_optional_id("karteId", query.karte_id.as_deref())
        .and_then(require_chart_id)
        .and_then(|chart_id| {
            parse_visit_date(query.visit_date.as_deref(), query.encounter_id.as_deref())
                .map(|day| (chart_id, day))
        })
        .map_err(|e| validation_failure(e, &ctx))?;

    let history = state
        .browser
        .history(chart_id, day)
        .await
        .map_err(|e| internal_failure(e, &ctx))?;

    record_audit(
        AuditAction::HistoryRead,
        AuditStatus::Success,
        &ctx,
        json!({
            "karteId": chart_id,
            "visitDate": history.visit_date,
            "groups": history.groups.len(),
            "revisions": history.num_revisions(),
        }),
    );

    Ok(Json(history))
}

/// Fetch one revision with heavy binary content removed.
async fn revision_handler<S: RevisionStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> ApiResult<Snapshot> {
    let ctx = RequestContext::from_headers(&headers);

    let revision_id = parse_optional_id("revisionId", Some(raw_id.as_str()))
        .and_then(require_revision_id)
        .map_err(|e| validation_failure(e, &ctx))?;

    let snapshot = state
        .browser
        .revision(revision_id)
        .await
        .map_err(|e| internal_failure(e, &ctx))?;

    match snapshot {
        Some(snapshot) => {
            record_audit(
                AuditAction::RevisionGet,
                AuditStatus::Success,
                &ctx,
                json!({ "revisionId": revision_id }),
            );
            Ok(Json(snapshot.without_heavy_bytes()))
        }
        None => {
            record_audit(
                AuditAction::RevisionGet,
                AuditStatus::Missing,
                &ctx,
                json!({ "revisionId": revision_id }),
            );
            Err(not_found(&ctx))
        }
    }
}

/// Diff two revisions at entity granularity.
async fn diff_handler<S: RevisionStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
    headers: HeaderMap,
    Query(query): Query<DiffQuery>,
) -> ApiResult<RevisionDiff> {
    let ctx = RequestContext::from_headers(&headers);

    let (from, to) = parse_optional_id("fromRevisionId", query.from_revision_id.as_deref())
        .and_then(|from| {
            parse_optional_id("toRevisionId", query.to_revision_id.as_deref()).map(|to| (from, to))
        })
        .and_then(|(from, to)| require_revision_pair(from, to))
        .map_err(|e| validation_failure(e, &ctx))?;

    let diff = state
        .browser
        .diff(from, to)
        .await
        .map_err(|e| internal_failure(e, &ctx))?;

    match diff {
        Some(diff) => {
            record_audit(
                AuditAction::RevisionDiff,
                AuditStatus::Success,
                &ctx,
                json!({
                    "fromRevisionId": from,
                    "toRevisionId": to,
                    "changedEntitiesCount": diff.summary.changed_entities_count,
                }),
            );
            Ok(Json(diff))
        }
        None => {
            record_audit(
                AuditAction::RevisionDiff,
                AuditStatus::Missing,
                &ctx,
                json!({ "fromRevisionId": from, "toRevisionId": to }),
            );
            Err(not_found(&ctx))
        }
    }
}

/// Health check endpoint (detailed).
async fn health_handler<S: RevisionStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
) -> Json<HealthResponse> {
    let store_healthy = state.browser.is_healthy().await;

    Json(HealthResponse {
        status: if store_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        schema_version: REVISION_SCHEMA_VERSION.to_string(),
        store_healthy,
    })
}

/// Liveness probe endpoint.
///
/// Does NOT check dependencies.
async fn liveness_handler() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe endpoint.
///
/// Returns 200 if the store is reachable, 503 otherwise.
async fn readiness_handler<S: RevisionStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    if state.browser.is_healthy().await {
        Ok(Json(ReadinessResponse {
            ready: true,
            database: true,
            details: None,
        }))
    } else {
        Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                ready: false,
                database: false,
                details: Some("Database connection failed".to_string()),
            }),
        ))
    }
}

// ============================================================================
// Router Construction
// ============================================================================

/// Create the Axum router for the revision history service.
pub fn create_router<S: RevisionStore + 'static>(state: ServiceState<S>) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/karte/revisions", get(history_handler::<S>))
        .route("/karte/revisions/diff", get(diff_handler::<S>))
        .route("/karte/revisions/:revision_id", get(revision_handler::<S>))
        .route("/health", get(health_handler::<S>))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler::<S>))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BrowserConfig;
    use crate::store::InMemoryRevisionStore;
    use crate::types::{Attachment, ChartId, ModuleEntity, RevisionRecord};
    use axum::body::Body;
    use axum::http::Request;
    use chrono::{TimeZone, Utc};
    use tower::ServiceExt;

    fn router() -> Router {
        let chart = ChartId::new(42);
        let at = |h| Utc.with_ymd_and_hms(2024, 3, 1, h, 0, 0).unwrap();

        let mut store = InMemoryRevisionStore::new();
        store.add_snapshot(
            Snapshot::new(RevisionRecord::new(100, 0, chart, at(8), Some(at(9))))
                .with_module(ModuleEntity::json(1, "progressNote", "A"))
                .with_attachment(Attachment {
                    id: 5,
                    file_name: Some("scan.pdf".to_string()),
                    content_type: Some("application/pdf".to_string()),
                    content_size: 3,
                    digest: Some("abc".to_string()),
                    bytes: Some(vec![1, 2, 3]),
                }),
        );
        store.add_snapshot(
            Snapshot::new(RevisionRecord::new(101, 100, chart, at(9), Some(at(10))))
                .with_module(ModuleEntity::json(2, "progressNote", "B")),
        );
        create_router(ServiceState::new(store, BrowserConfig::default()))
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .header("X-Request-Id", "req-test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_history_endpoint() {
        let (status, body) = get_json("/karte/revisions?karteId=42&visitDate=2024-03-01").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["karteId"], 42);
        assert_eq!(body["visitDate"], "2024-03-01");
        assert_eq!(body["groups"][0]["rootRevisionId"], 100);
        assert_eq!(body["groups"][0]["latestRevisionId"], 101);
    }

    #[tokio::test]
    async fn test_history_accepts_encounter_alias() {
        let (status, body) = get_json("/karte/revisions?karteId=42&encounterId=2024-03-01").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["groups"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_history_validation_errors() {
        let (status, body) = get_json("/karte/revisions?visitDate=2024-03-01").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "REVISION_VALIDATION_ERROR");
        assert_eq!(body["error"], "karteId is required");
        assert_eq!(body["correlation_id"], "req-test");

        let (status, body) = get_json("/karte/revisions?karteId=42&visitDate=03-01-2024").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "visitDate must be YYYY-MM-DD");
    }

    #[tokio::test]
    async fn test_revision_endpoint_strips_bytes() {
        let (status, body) = get_json("/karte/revisions/100").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["record"]["id"], 100);
        assert_eq!(body["attachments"][0]["fileName"], "scan.pdf");
        assert!(body["attachments"][0].get("bytes").is_none());
    }

    #[tokio::test]
    async fn test_revision_not_found() {
        let (status, body) = get_json("/karte/revisions/999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], NOT_FOUND_CODE);
    }

    #[tokio::test]
    async fn test_diff_endpoint() {
        let (status, body) = get_json("/karte/revisions/diff?fromRevisionId=100&toRevisionId=101").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["changedEntities"], json!(["progressNote", "attachment"]));
        assert_eq!(body["summary"]["changedEntitiesCount"], 2);
    }

    #[tokio::test]
    async fn test_diff_errors() {
        let (status, body) = get_json("/karte/revisions/diff?fromRevisionId=100").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "fromRevisionId/toRevisionId are required");

        let (status, _) = get_json("/karte/revisions/diff?fromRevisionId=100&toRevisionId=555").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_health_probes() {
        let (status, body) = get_json("/health/live").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "alive");

        let (status, body) = get_json("/health/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ready"], true);
    }
}
