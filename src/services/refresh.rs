//! Refresh pipeline: normalize two raw scanner batches, atomically swap a
//! commit's stored findings, and recompute its cached severity snapshot.
//!
//! The fetch collaborator is responsible for distinguishing "scanner
//! unreachable" from "scanner reports no open issues"; by the time a batch
//! reaches this coordinator it is a genuine result, and an empty one simply
//! replaces the commit's findings with the empty set.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use std::sync::OnceLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::commit::Commit;
use crate::models::finding::{FindingSource, RawComponentFinding, RawDefectFinding};
use crate::normalize::{component, defect};
use crate::services::{aggregation, application, commit as commit_service, finding};

/// Summary of one refresh run.
#[derive(Debug, Serialize)]
pub struct RefreshOutcome {
    pub component_count: usize,
    pub defect_count: usize,
    pub skipped_component: usize,
    pub skipped_defect: usize,
    pub snapshot: aggregation::SeverityTotals,
}

/// Result of a full ingest: routing decision plus the refresh summary.
#[derive(Debug, Serialize)]
pub struct IngestOutcome {
    pub project_id: String,
    pub commit_id: i64,
    pub build_id: String,
    pub commit_created: bool,
    #[serde(flatten)]
    pub refresh: RefreshOutcome,
}

/// One refresh observability record.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RefreshLogEntry {
    pub id: Uuid,
    pub commit_id: i64,
    pub build_id: String,
    pub component_count: i32,
    pub defect_count: i32,
    pub skipped_component: i32,
    pub skipped_defect: i32,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Extract the external project id from a component-scanner project URL
/// of the form `.../projects/<id>/versions/<id>`.
pub fn extract_project_id(project_url: &str) -> Result<String, AppError> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN.get_or_init(|| {
        Regex::new(r"/projects/([^/]+)/versions/").expect("valid project-url pattern")
    });

    re.captures(project_url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            AppError::Validation(format!("Invalid scanner project URL: {project_url}"))
        })
}

/// Ingest one round of scan results for a build id.
///
/// An unseen build id creates the application (idempotently) and the
/// commit; a known one routes to the existing commit. Either way the call
/// ends with a full refresh of both sources.
pub async fn ingest_scan_results(
    pool: &PgPool,
    project_id: &str,
    application_name: &str,
    build_id: &str,
    release_label: &str,
    raw_component: &[RawComponentFinding],
    raw_defect: &[RawDefectFinding],
) -> Result<IngestOutcome, AppError> {
    let (commit, created) = match commit_service::find_by_build_id(pool, build_id).await? {
        Some(existing) => (existing, false),
        None => {
            let app = application::upsert(pool, project_id, application_name).await?;
            match commit_service::create(pool, &app.project_id, build_id, release_label).await {
                Ok(commit) => (commit, true),
                // Lost a create race: the build id now exists, refresh it.
                Err(AppError::DuplicateBuildId(_)) => {
                    let existing = commit_service::find_by_build_id(pool, build_id)
                        .await?
                        .ok_or_else(|| {
                            AppError::CommitNotFound(format!("build '{build_id}'"))
                        })?;
                    (existing, false)
                }
                Err(e) => return Err(e),
            }
        }
    };

    let refresh = refresh(pool, &commit, raw_component, raw_defect).await?;

    Ok(IngestOutcome {
        project_id: commit.project_id.clone(),
        commit_id: commit.id,
        build_id: commit.build_id.clone(),
        commit_created: created,
        refresh,
    })
}

/// Replace a commit's findings from two freshly fetched raw batches.
///
/// Normalization happens outside the transaction (it is pure); the
/// delete/insert of both sources and the snapshot write commit as one
/// unit, with the commit row locked so concurrent refreshes of the same
/// build id serialize instead of interleaving.
pub async fn refresh(
    pool: &PgPool,
    commit: &Commit,
    raw_component: &[RawComponentFinding],
    raw_defect: &[RawDefectFinding],
) -> Result<RefreshOutcome, AppError> {
    let started_at = Utc::now();

    let component_batch = component::normalize_batch(raw_component);
    let defect_batch = defect::normalize_batch(raw_defect);

    let mut tx = pool.begin().await?;

    sqlx::query_scalar::<_, i64>("SELECT id FROM commits WHERE id = $1 FOR UPDATE")
        .bind(commit.id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::CommitNotFound(format!("commit {}", commit.id)))?;

    let component_count =
        finding::replace_component(&mut tx, commit, &component_batch.findings).await?;
    let defect_count = finding::replace_defect(&mut tx, commit, &defect_batch.findings).await?;

    let snapshot = snapshot_of(&component_batch.findings, &defect_batch.findings);
    commit_service::update_snapshot(&mut tx, commit.id, &snapshot).await?;

    tx.commit().await?;

    let outcome = RefreshOutcome {
        component_count,
        defect_count,
        skipped_component: component_batch.skipped.len(),
        skipped_defect: defect_batch.skipped.len(),
        snapshot,
    };

    log_refresh(pool, commit, &outcome, started_at).await?;

    tracing::info!(
        commit_id = commit.id,
        build_id = %commit.build_id,
        component_count,
        defect_count,
        skipped = outcome.skipped_component + outcome.skipped_defect,
        "refreshed scan findings"
    );

    Ok(outcome)
}

/// Fold the normalized sets into the commit's four-severity snapshot.
fn snapshot_of(
    component_findings: &[crate::models::finding::NewComponentFinding],
    defect_findings: &[crate::models::finding::NewDefectFinding],
) -> aggregation::SeverityTotals {
    let records = component_findings
        .iter()
        .map(|f| (FindingSource::ComponentScanner, f.severity, f.status))
        .chain(
            defect_findings
                .iter()
                .map(|f| (FindingSource::StaticAnalysisScanner, f.severity, f.status)),
        );
    aggregation::fold_records(records).merged()
}

/// Insert a refresh observability record.
async fn log_refresh(
    pool: &PgPool,
    commit: &Commit,
    outcome: &RefreshOutcome,
    started_at: DateTime<Utc>,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO refresh_log
            (commit_id, build_id, component_count, defect_count,
             skipped_component, skipped_defect, started_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(commit.id)
    .bind(&commit.build_id)
    .bind(outcome.component_count as i32)
    .bind(outcome.defect_count as i32)
    .bind(outcome.skipped_component as i32)
    .bind(outcome.skipped_defect as i32)
    .bind(started_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// List recent refresh log entries, newest first.
pub async fn list_log(pool: &PgPool, limit: i64) -> Result<Vec<RefreshLogEntry>, AppError> {
    let entries = sqlx::query_as::<_, RefreshLogEntry>(
        "SELECT * FROM refresh_log ORDER BY completed_at DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::finding::{
        FindingStatus, NewComponentFinding, NewDefectFinding, Severity,
    };

    #[test]
    fn extracts_project_id_from_url() {
        let url = "https://scanner.example.com/api/projects/8a2f9c1e-7b4d/versions/55e0d6c1";
        assert_eq!(extract_project_id(url).unwrap(), "8a2f9c1e-7b4d");
    }

    #[test]
    fn rejects_url_without_project_segment() {
        let err = extract_project_id("https://scanner.example.com/dashboard").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn rejects_url_without_version_segment() {
        let err =
            extract_project_id("https://scanner.example.com/projects/8a2f9c1e").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    fn component(severity: Severity, status: FindingStatus) -> NewComponentFinding {
        NewComponentFinding {
            bdsa_id: "BDSA-2024-0001".to_string(),
            component_name: "openssl".to_string(),
            severity,
            status,
            recommended_version: None,
            comment: None,
        }
    }

    fn defect(severity: Severity, status: FindingStatus) -> NewDefectFinding {
        NewDefectFinding {
            cid: 7,
            defect_type: "OVERRUN".to_string(),
            severity,
            status,
        }
    }

    #[test]
    fn snapshot_applies_asymmetric_rule() {
        let snapshot = snapshot_of(
            &[component(Severity::Critical, FindingStatus::New)],
            &[defect(Severity::Critical, FindingStatus::New)],
        );
        assert_eq!(snapshot.critical, 1);
        assert_eq!(snapshot.high, 0);
    }

    #[test]
    fn snapshot_excludes_non_new_statuses() {
        let snapshot = snapshot_of(
            &[component(Severity::Critical, FindingStatus::Dismissed)],
            &[defect(Severity::High, FindingStatus::Fixed)],
        );
        assert_eq!(snapshot, aggregation::SeverityTotals::default());
    }

    #[test]
    fn snapshot_of_empty_sets_is_zero() {
        let snapshot = snapshot_of(&[], &[]);
        assert_eq!(snapshot, aggregation::SeverityTotals::default());
    }
}
