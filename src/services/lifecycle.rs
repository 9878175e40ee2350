//! Commit lifecycle state machine.
//!
//! Enforces that at most one commit per application is `In_Production`:
//! promoting a commit archives the previous production commit in the same
//! transaction, so no reader ever observes two production commits for one
//! application. `Archived` is terminal.

use serde::Serialize;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::commit::{Commit, CommitStatus};

/// Result of a successful transition.
#[derive(Debug, Serialize)]
pub struct TransitionResult {
    pub commit_id: i64,
    pub previous_status: CommitStatus,
    pub new_status: CommitStatus,
    /// Commits archived as a side effect of a promotion.
    pub archived_commit_ids: Vec<i64>,
}

/// Parse an externally requested status label.
///
/// Accepts the wire form and the spaced human label; anything outside the
/// fixed status set fails with `InvalidStatus`.
pub fn parse_status(raw: &str) -> Result<CommitStatus, AppError> {
    match raw {
        "In_Development" | "In Development" => Ok(CommitStatus::InDevelopment),
        "In_Production" | "In Production" => Ok(CommitStatus::InProduction),
        "Archived" => Ok(CommitStatus::Archived),
        other => Err(AppError::InvalidStatus(other.to_string())),
    }
}

/// Check whether a status transition is valid per the state machine graph.
///
/// Re-asserting the current status is an idempotent no-op for every state;
/// nothing leaves `Archived`.
pub fn is_valid_transition(from: CommitStatus, to: CommitStatus) -> bool {
    from == to
        || matches!(
            (from, to),
            (CommitStatus::InDevelopment, CommitStatus::InProduction)
                | (CommitStatus::InDevelopment, CommitStatus::Archived)
                | (CommitStatus::InProduction, CommitStatus::Archived)
        )
}

/// Execute a status transition for a commit of the given application.
///
/// The commit row and, on promotion, the application's current production
/// row(s) are locked and updated in one transaction.
pub async fn set_status(
    pool: &PgPool,
    project_id: &str,
    commit_id: i64,
    requested: CommitStatus,
) -> Result<TransitionResult, AppError> {
    let mut tx = pool.begin().await?;

    let current = sqlx::query_as::<_, Commit>(
        "SELECT * FROM commits WHERE id = $1 AND project_id = $2 FOR UPDATE",
    )
    .bind(commit_id)
    .bind(project_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| {
        AppError::CommitNotFound(format!("commit {commit_id} of application '{project_id}'"))
    })?;

    if !is_valid_transition(current.status, requested) {
        return Err(AppError::InvalidTransition(format!(
            "cannot move commit {commit_id} from {:?} to {requested:?}",
            current.status
        )));
    }

    let mut archived_commit_ids = Vec::new();

    if requested == CommitStatus::InProduction {
        // Archive whatever currently claims production for this
        // application, before the promotion becomes visible.
        let production_ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id FROM commits
            WHERE project_id = $1 AND status = 'In_Production' AND id <> $2
            FOR UPDATE
            "#,
        )
        .bind(project_id)
        .bind(commit_id)
        .fetch_all(&mut *tx)
        .await?;

        for id in production_ids {
            sqlx::query("UPDATE commits SET status = 'Archived' WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            archived_commit_ids.push(id);
        }
    }

    sqlx::query("UPDATE commits SET status = $1 WHERE id = $2")
        .bind(requested)
        .bind(commit_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    if !archived_commit_ids.is_empty() {
        tracing::info!(
            project_id,
            commit_id,
            archived = ?archived_commit_ids,
            "archived previous production commit on promotion"
        );
    }

    Ok(TransitionResult {
        commit_id,
        previous_status: current.status,
        new_status: requested,
        archived_commit_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- Status parsing --

    #[test]
    fn parses_wire_and_spaced_labels() {
        assert_eq!(
            parse_status("In_Production").unwrap(),
            CommitStatus::InProduction
        );
        assert_eq!(
            parse_status("In Development").unwrap(),
            CommitStatus::InDevelopment
        );
        assert_eq!(parse_status("Archived").unwrap(), CommitStatus::Archived);
    }

    #[test]
    fn unknown_label_is_invalid_status() {
        let err = parse_status("Retired").unwrap_err();
        assert!(matches!(err, AppError::InvalidStatus(_)));
    }

    #[test]
    fn parsing_is_case_sensitive_on_purpose() {
        // The status set is fixed; lowercase labels are not part of it.
        assert!(parse_status("in_production").is_err());
    }

    // -- Valid transitions --

    #[test]
    fn development_to_production() {
        assert!(is_valid_transition(
            CommitStatus::InDevelopment,
            CommitStatus::InProduction
        ));
    }

    #[test]
    fn development_to_archived() {
        assert!(is_valid_transition(
            CommitStatus::InDevelopment,
            CommitStatus::Archived
        ));
    }

    #[test]
    fn production_to_archived() {
        assert!(is_valid_transition(
            CommitStatus::InProduction,
            CommitStatus::Archived
        ));
    }

    #[test]
    fn same_status_reassertion_is_allowed() {
        for status in [
            CommitStatus::InDevelopment,
            CommitStatus::InProduction,
            CommitStatus::Archived,
        ] {
            assert!(
                is_valid_transition(status, status),
                "expected {status:?} -> {status:?} to be a no-op"
            );
        }
    }

    // -- Invalid transitions --

    #[test]
    fn archived_is_terminal() {
        assert!(!is_valid_transition(
            CommitStatus::Archived,
            CommitStatus::InProduction
        ));
        assert!(!is_valid_transition(
            CommitStatus::Archived,
            CommitStatus::InDevelopment
        ));
    }

    #[test]
    fn production_cannot_return_to_development() {
        assert!(!is_valid_transition(
            CommitStatus::InProduction,
            CommitStatus::InDevelopment
        ));
    }
}
