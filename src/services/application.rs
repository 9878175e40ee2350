//! Application store: idempotent registration keyed by external project id.

use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::application::Application;

/// Idempotent create. When the project id is already registered the
/// existing row is returned unchanged, whatever name was supplied.
pub async fn upsert(pool: &PgPool, project_id: &str, name: &str) -> Result<Application, AppError> {
    let inserted = sqlx::query_as::<_, Application>(
        r#"
        INSERT INTO applications (project_id, name)
        VALUES ($1, $2)
        ON CONFLICT (project_id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(project_id)
    .bind(name)
    .fetch_optional(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::Validation(format!(
                "Application name '{name}' is already registered to a different project"
            ))
        }
        _ => AppError::Database(e),
    })?;

    match inserted {
        Some(app) => Ok(app),
        // Conflict on project_id: the application already exists.
        None => get(pool, project_id).await,
    }
}

/// Find application by external project id.
pub async fn find(pool: &PgPool, project_id: &str) -> Result<Option<Application>, AppError> {
    let app = sqlx::query_as::<_, Application>(
        "SELECT * FROM applications WHERE project_id = $1",
    )
    .bind(project_id)
    .fetch_optional(pool)
    .await?;
    Ok(app)
}

/// Get application by external project id, failing when absent.
pub async fn get(pool: &PgPool, project_id: &str) -> Result<Application, AppError> {
    find(pool, project_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application '{project_id}' not found")))
}

/// List all applications, ordered by name.
pub async fn list(pool: &PgPool) -> Result<Vec<Application>, AppError> {
    let apps = sqlx::query_as::<_, Application>("SELECT * FROM applications ORDER BY name ASC")
        .fetch_all(pool)
        .await?;
    Ok(apps)
}
