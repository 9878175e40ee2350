//! Scan-result ingestion routes.

use axum::{extract::Query, extract::State, Json};
use serde::Deserialize;
use validator::Validate;

use crate::errors::{ApiResponse, AppError};
use crate::models::finding::{RawComponentFinding, RawDefectFinding};
use crate::services::refresh::{self, IngestOutcome, RefreshLogEntry};
use crate::AppState;

/// Body of PUT /api/v1/scan-results.
///
/// The two raw batches come from the fetch collaborator; a fetch failure
/// must be handled there and never passed through as an empty batch.
#[derive(Debug, Deserialize, Validate)]
pub struct IngestScanRequest {
    /// Component-scanner project URL; the external project id is
    /// extracted from its `/projects/<id>/versions/` segment.
    #[validate(length(min = 1, message = "project_url is required"))]
    pub project_url: String,
    #[validate(length(min = 1, message = "application_name is required"))]
    pub application_name: String,
    #[validate(length(min = 1, message = "build_id is required"))]
    pub build_id: String,
    #[validate(length(min = 1, message = "release_label is required"))]
    pub release_label: String,
    #[serde(default)]
    pub component_findings: Vec<RawComponentFinding>,
    #[serde(default)]
    pub defect_findings: Vec<RawDefectFinding>,
}

/// PUT /api/v1/scan-results — ingest one round of scan results.
///
/// Creates the application/commit when the build id is unseen, otherwise
/// refreshes the existing commit; always ends with a full refresh.
pub async fn ingest(
    State(state): State<AppState>,
    Json(body): Json<IngestScanRequest>,
) -> Result<Json<ApiResponse<IngestOutcome>>, AppError> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let project_id = refresh::extract_project_id(&body.project_url)?;

    let outcome = refresh::ingest_scan_results(
        &state.db,
        &project_id,
        &body.application_name,
        &body.build_id,
        &body.release_label,
        &body.component_findings,
        &body.defect_findings,
    )
    .await?;

    Ok(ApiResponse::success(outcome))
}

/// Query parameters for the refresh log listing.
#[derive(Debug, Deserialize)]
pub struct RefreshLogQuery {
    pub limit: Option<i64>,
}

/// GET /api/v1/refresh-log — recent refresh runs, newest first.
pub async fn refresh_log(
    State(state): State<AppState>,
    Query(query): Query<RefreshLogQuery>,
) -> Result<Json<ApiResponse<Vec<RefreshLogEntry>>>, AppError> {
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let entries = refresh::list_log(&state.db, limit).await?;
    Ok(ApiResponse::success(entries))
}
