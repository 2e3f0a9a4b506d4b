//! Revision History REST Service
//!
//! Exposes the revision browser as a read-only REST API.
//!
//! ## Endpoints
//!
//! - `GET /karte/revisions?karteId=&visitDate=` - Grouped revision history of one visit day
//! - `GET /karte/revisions/:revisionId` - One revision, heavy binary content removed
//! - `GET /karte/revisions/diff?fromRevisionId=&toRevisionId=` - Entity-level diff
//! - `GET /health` - Detailed service health check
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe

pub mod middleware;
pub mod routes;
pub mod state;

pub use middleware::{metrics_middleware, record_audit, AuditAction, AuditStatus};
pub use routes::{create_router, AppState, ErrorResponse};
pub use state::{RequestContext, ServiceState};
