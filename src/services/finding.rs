//! Finding store: atomic per-source replacement and unified reads.

use sqlx::{PgPool, Postgres, Transaction};

use crate::errors::AppError;
use crate::models::commit::Commit;
use crate::models::finding::{
    ComponentFinding, DefectFinding, Finding, FindingSource, FindingStatus,
    NewComponentFinding, NewDefectFinding, Severity,
};

/// Replace all component-scanner findings of a commit with the given set.
///
/// Delete and insert run inside the caller's transaction: no reader ever
/// observes the old set partially removed or the new set partially
/// inserted. An empty set is a valid replacement (scanner reports clean).
pub async fn replace_component(
    tx: &mut Transaction<'_, Postgres>,
    commit: &Commit,
    findings: &[NewComponentFinding],
) -> Result<usize, AppError> {
    sqlx::query("DELETE FROM component_findings WHERE commit_id = $1")
        .bind(commit.id)
        .execute(&mut **tx)
        .await?;

    for f in findings {
        sqlx::query(
            r#"
            INSERT INTO component_findings
                (project_id, commit_id, bdsa_id, component_name, severity, status,
                 recommended_version, comment)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&commit.project_id)
        .bind(commit.id)
        .bind(&f.bdsa_id)
        .bind(&f.component_name)
        .bind(f.severity)
        .bind(f.status)
        .bind(&f.recommended_version)
        .bind(&f.comment)
        .execute(&mut **tx)
        .await?;
    }

    Ok(findings.len())
}

/// Replace all defect-scanner findings of a commit with the given set.
pub async fn replace_defect(
    tx: &mut Transaction<'_, Postgres>,
    commit: &Commit,
    findings: &[NewDefectFinding],
) -> Result<usize, AppError> {
    sqlx::query("DELETE FROM defect_findings WHERE commit_id = $1")
        .bind(commit.id)
        .execute(&mut **tx)
        .await?;

    for f in findings {
        sqlx::query(
            r#"
            INSERT INTO defect_findings
                (project_id, commit_id, cid, defect_type, severity, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&commit.project_id)
        .bind(commit.id)
        .bind(f.cid)
        .bind(&f.defect_type)
        .bind(f.severity)
        .bind(f.status)
        .execute(&mut **tx)
        .await?;
    }

    Ok(findings.len())
}

/// List a commit's findings in the unified tagged shape, optionally
/// restricted to one source.
pub async fn list_for_commit(
    pool: &PgPool,
    commit_id: i64,
    source: Option<FindingSource>,
) -> Result<Vec<Finding>, AppError> {
    let mut findings: Vec<Finding> = Vec::new();

    if source != Some(FindingSource::StaticAnalysisScanner) {
        let rows = sqlx::query_as::<_, ComponentFinding>(
            "SELECT * FROM component_findings WHERE commit_id = $1 ORDER BY bdsa_id ASC",
        )
        .bind(commit_id)
        .fetch_all(pool)
        .await?;
        findings.extend(rows.into_iter().map(Finding::from));
    }

    if source != Some(FindingSource::ComponentScanner) {
        let rows = sqlx::query_as::<_, DefectFinding>(
            "SELECT * FROM defect_findings WHERE commit_id = $1 ORDER BY cid ASC",
        )
        .bind(commit_id)
        .fetch_all(pool)
        .await?;
        findings.extend(rows.into_iter().map(Finding::from));
    }

    Ok(findings)
}

/// The (source, severity, status) tuples of one commit's findings, both
/// tables in one query. This is what the aggregation fold consumes.
pub async fn severity_records(
    pool: &PgPool,
    commit_id: i64,
) -> Result<Vec<(FindingSource, Severity, FindingStatus)>, AppError> {
    let rows = sqlx::query_as::<_, (String, Severity, FindingStatus)>(
        r#"
        SELECT 'component' AS source, severity, status
        FROM component_findings WHERE commit_id = $1
        UNION ALL
        SELECT 'defect' AS source, severity, status
        FROM defect_findings WHERE commit_id = $1
        "#,
    )
    .bind(commit_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(tag_source).collect())
}

/// Severity tuples of every finding belonging to a production commit,
/// fleet-wide.
pub async fn production_severity_records(
    pool: &PgPool,
) -> Result<Vec<(FindingSource, Severity, FindingStatus)>, AppError> {
    let rows = sqlx::query_as::<_, (String, Severity, FindingStatus)>(
        r#"
        SELECT 'component' AS source, f.severity, f.status
        FROM component_findings f
        JOIN commits c ON c.id = f.commit_id
        WHERE c.status = 'In_Production'
        UNION ALL
        SELECT 'defect' AS source, f.severity, f.status
        FROM defect_findings f
        JOIN commits c ON c.id = f.commit_id
        WHERE c.status = 'In_Production'
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(tag_source).collect())
}

fn tag_source(
    (source, severity, status): (String, Severity, FindingStatus),
) -> (FindingSource, Severity, FindingStatus) {
    let source = if source == "defect" {
        FindingSource::StaticAnalysisScanner
    } else {
        FindingSource::ComponentScanner
    };
    (source, severity, status)
}
