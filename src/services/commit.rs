//! Commit store: creation, build-id routing, and snapshot persistence.

use sqlx::{PgPool, Postgres, Transaction};

use crate::errors::AppError;
use crate::models::commit::Commit;
use crate::services::aggregation::SeverityTotals;

/// Create a new commit in `In_Development` with a zeroed snapshot.
///
/// The external build id is unique across the whole system; a second
/// create for the same build id fails with `DuplicateBuildId`.
pub async fn create(
    pool: &PgPool,
    project_id: &str,
    build_id: &str,
    release_label: &str,
) -> Result<Commit, AppError> {
    let commit = sqlx::query_as::<_, Commit>(
        r#"
        INSERT INTO commits (project_id, build_id, release_label)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(project_id)
    .bind(build_id)
    .bind(release_label)
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::DuplicateBuildId(build_id.to_string())
        }
        _ => AppError::Database(e),
    })?;

    Ok(commit)
}

/// Find a commit by its external build id. This is the sole routing key
/// deciding "new commit" vs "refresh existing commit" for incoming scans.
pub async fn find_by_build_id(pool: &PgPool, build_id: &str) -> Result<Option<Commit>, AppError> {
    let commit = sqlx::query_as::<_, Commit>("SELECT * FROM commits WHERE build_id = $1")
        .bind(build_id)
        .fetch_optional(pool)
        .await?;
    Ok(commit)
}

/// Get a commit by internal id, failing when absent.
pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Commit, AppError> {
    sqlx::query_as::<_, Commit>("SELECT * FROM commits WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::CommitNotFound(format!("commit {id}")))
}

/// List an application's commits, newest first.
pub async fn list_for_application(
    pool: &PgPool,
    project_id: &str,
) -> Result<Vec<Commit>, AppError> {
    let commits = sqlx::query_as::<_, Commit>(
        "SELECT * FROM commits WHERE project_id = $1 ORDER BY created_at DESC, id DESC",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;
    Ok(commits)
}

/// The application's current production commit, if any.
pub async fn production_commit(
    pool: &PgPool,
    project_id: &str,
) -> Result<Option<Commit>, AppError> {
    let commit = sqlx::query_as::<_, Commit>(
        "SELECT * FROM commits WHERE project_id = $1 AND status = 'In_Production'",
    )
    .bind(project_id)
    .fetch_optional(pool)
    .await?;
    Ok(commit)
}

/// Ids of all commits currently marked `In_Production` for an application.
///
/// The lifecycle invariant keeps this to at most one row, but callers
/// aggregating over it must not assume so.
pub async fn production_commit_ids(
    pool: &PgPool,
    project_id: &str,
) -> Result<Vec<i64>, AppError> {
    let ids = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM commits WHERE project_id = $1 AND status = 'In_Production'",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}

/// Persist a freshly computed severity snapshot onto the commit row.
/// Runs inside the refresh transaction.
pub async fn update_snapshot(
    tx: &mut Transaction<'_, Postgres>,
    commit_id: i64,
    snapshot: &SeverityTotals,
) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE commits SET critical = $1, high = $2, medium = $3, low = $4 WHERE id = $5",
    )
    .bind(snapshot.critical as i32)
    .bind(snapshot.high as i32)
    .bind(snapshot.medium as i32)
    .bind(snapshot.low as i32)
    .bind(commit_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
