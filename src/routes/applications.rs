//! Application routes: overview with production exposure, commit listing,
//! and the commit status transition endpoint.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::{ApiResponse, AppError};
use crate::models::application::Application;
use crate::models::commit::Commit;
use crate::services::aggregation::{self, FleetTotals, SeverityTotals};
use crate::services::{application, commit, lifecycle};
use crate::AppState;

/// One application with its current production exposure.
#[derive(Debug, Serialize)]
pub struct ApplicationOverview {
    pub project_id: String,
    pub name: String,
    pub production: SeverityTotals,
}

/// The applications overview payload: every application plus fleet-wide
/// production totals split per source.
#[derive(Debug, Serialize)]
pub struct ApplicationsDashboard {
    pub applications: Vec<ApplicationOverview>,
    pub fleet: FleetTotals,
}

/// GET /api/v1/applications — all applications with production exposure.
pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ApplicationsDashboard>>, AppError> {
    let apps = application::list(&state.db).await?;

    let mut overviews = Vec::with_capacity(apps.len());
    for app in apps {
        let production =
            aggregation::application_production_totals(&state.db, &app.project_id).await?;
        overviews.push(ApplicationOverview {
            project_id: app.project_id,
            name: app.name,
            production,
        });
    }

    let fleet = aggregation::fleet_production_totals(&state.db).await?;

    Ok(ApiResponse::success(ApplicationsDashboard {
        applications: overviews,
        fleet,
    }))
}

/// GET /api/v1/applications/{project_id} — application detail.
pub async fn get(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<ApiResponse<Application>>, AppError> {
    let app = application::get(&state.db, &project_id).await?;
    Ok(ApiResponse::success(app))
}

/// GET /api/v1/applications/{project_id}/commits — commits with their
/// cached snapshots, newest first.
pub async fn list_commits(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Commit>>>, AppError> {
    application::get(&state.db, &project_id).await?;
    let commits = commit::list_for_application(&state.db, &project_id).await?;
    Ok(ApiResponse::success(commits))
}

/// GET /api/v1/applications/{project_id}/production-commit — the current
/// production commit, if any.
pub async fn production_commit(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<ApiResponse<Option<Commit>>>, AppError> {
    application::get(&state.db, &project_id).await?;
    let commit = commit::production_commit(&state.db, &project_id).await?;
    Ok(ApiResponse::success(commit))
}

/// GET /api/v1/applications/{project_id}/production-totals — production
/// exposure for one application, zeros when nothing is in production.
pub async fn production_totals(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<ApiResponse<SeverityTotals>>, AppError> {
    application::get(&state.db, &project_id).await?;
    let totals = aggregation::application_production_totals(&state.db, &project_id).await?;
    Ok(ApiResponse::success(totals))
}

/// Body of the status transition request.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

/// PUT /api/v1/applications/{project_id}/commits/{commit_id}/status —
/// transition a commit's lifecycle status.
pub async fn set_commit_status(
    State(state): State<AppState>,
    Path((project_id, commit_id)): Path<(String, i64)>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<ApiResponse<lifecycle::TransitionResult>>, AppError> {
    let requested = lifecycle::parse_status(&body.status)?;
    let result = lifecycle::set_status(&state.db, &project_id, commit_id, requested).await?;
    Ok(ApiResponse::success(result))
}
