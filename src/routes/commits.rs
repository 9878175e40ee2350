//! Commit routes: severity totals and finding listings.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::{ApiResponse, AppError};
use crate::models::finding::{Finding, FindingSource};
use crate::services::aggregation::{self, SeverityTotals};
use crate::services::{commit, finding};
use crate::AppState;

/// Per-commit severity totals with the per-source breakdown.
#[derive(Debug, Serialize)]
pub struct CommitTotals {
    pub commit_id: i64,
    pub merged: SeverityTotals,
    pub component: SeverityTotals,
    pub defect: SeverityTotals,
}

/// GET /api/v1/commits/{id}/totals — severity totals for one commit.
pub async fn totals(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<CommitTotals>>, AppError> {
    let split = aggregation::commit_totals_by_source(&state.db, id).await?;
    Ok(ApiResponse::success(CommitTotals {
        commit_id: id,
        merged: split.merged(),
        component: split.component,
        defect: split.defect,
    }))
}

/// Query parameters for the findings listing.
#[derive(Debug, Deserialize)]
pub struct FindingsQuery {
    pub source: Option<FindingSource>,
}

/// GET /api/v1/commits/{id}/findings — normalized findings of a commit,
/// optionally restricted to one source.
pub async fn findings(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<FindingsQuery>,
) -> Result<Json<ApiResponse<Vec<Finding>>>, AppError> {
    commit::find_by_id(&state.db, id).await?;
    let findings = finding::list_for_commit(&state.db, id, query.source).await?;
    Ok(ApiResponse::success(findings))
}
