//! Request parameter validation.
//!
//! All failures share one error code so clients can branch on it; the
//! message names the field and `details` echoes the offending value.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::types::{ChartId, RevisionId};

/// Error code shared by every validation failure.
pub const VALIDATION_ERROR_CODE: &str = "REVISION_VALIDATION_ERROR";

/// Error type for request validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Stable error code.
    pub code: &'static str,
    /// Human readable message.
    pub message: String,
    /// Offending fields and values.
    pub details: Map<String, Value>,
}

impl ValidationError {
    /// Create a validation error with no details.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: VALIDATION_ERROR_CODE,
            message: message.into(),
            details: Map::new(),
        }
    }

    /// Attach a detail entry.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

fn positive(value: Option<i64>) -> Option<i64> {
    value.filter(|v| *v > 0)
}

/// Parse an optional numeric request parameter. Blank values count as absent.
pub fn parse_optional_id(field: &str, raw: Option<&str>) -> Result<Option<i64>, ValidationError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|_| {
            ValidationError::new(format!("{field} must be an integer")).with_detail(field, value)
        }),
    }
}

/// Require a positive chart id.
pub fn require_chart_id(karte_id: Option<i64>) -> Result<ChartId, ValidationError> {
    positive(karte_id)
        .map(ChartId::new)
        .ok_or_else(|| ValidationError::new("karteId is required").with_detail("karteId", karte_id))
}

/// Parse the visit day, accepting `encounterId` when `visitDate` is blank.
pub fn parse_visit_date(
    visit_date: Option<&str>,
    encounter_id: Option<&str>,
) -> Result<NaiveDate, ValidationError> {
    let raw = [visit_date, encounter_id]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .ok_or_else(|| ValidationError::new("visitDate is required").with_detail("visitDate", Value::Null))?;

    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        ValidationError::new("visitDate must be YYYY-MM-DD").with_detail("visitDate", raw)
    })
}

/// Require a single positive revision id.
pub fn require_revision_id(revision_id: Option<i64>) -> Result<RevisionId, ValidationError> {
    positive(revision_id)
        .map(RevisionId::new)
        .ok_or_else(|| ValidationError::new("revisionId is required").with_detail("revisionId", revision_id))
}

/// Require both sides of a diff, each positive.
pub fn require_revision_pair(
    from_revision_id: Option<i64>,
    to_revision_id: Option<i64>,
) -> Result<(RevisionId, RevisionId), ValidationError> {
    match (positive(from_revision_id), positive(to_revision_id)) {
        (Some(from), Some(to)) => Ok((RevisionId::new(from), RevisionId::new(to))),
        _ => Err(ValidationError::new("fromRevisionId/toRevisionId are required")
            .with_detail("fromRevisionId", from_revision_id)
            .with_detail("toRevisionId", to_revision_id)),
    }
}
