//! Severity aggregation with the asymmetric per-source inclusion rule.
//!
//! The component scanner contributes to all four buckets; the
//! static-analysis scanner never contributes to Critical (its taxonomy has
//! no equivalent tier). Only findings whose status is `New` count. The rule
//! lives in exactly one place, `bucket_for`, and every total in the system
//! is a fold over it.

use serde::Serialize;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::finding::{FindingSource, FindingStatus, Severity};
use crate::services::{commit, finding};

/// The four severity buckets a finding can count toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityBucket {
    Critical,
    High,
    Medium,
    Low,
}

/// Decide which bucket, if any, a finding counts toward.
pub fn bucket_for(
    source: FindingSource,
    severity: Severity,
    status: FindingStatus,
) -> Option<SeverityBucket> {
    if status != FindingStatus::New {
        return None;
    }
    match (source, severity) {
        (FindingSource::ComponentScanner, Severity::Critical) => Some(SeverityBucket::Critical),
        // The static-analysis scanner has no Critical tier; a raw label
        // that normalized to Critical counts toward nothing.
        (FindingSource::StaticAnalysisScanner, Severity::Critical) => None,
        (_, Severity::High) => Some(SeverityBucket::High),
        (_, Severity::Medium) => Some(SeverityBucket::Medium),
        (_, Severity::Low) => Some(SeverityBucket::Low),
        (_, Severity::Unknown) => None,
    }
}

/// Four-integer severity totals. Always fully populated; missing data is
/// zero, never an absent field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityTotals {
    pub critical: i64,
    pub high: i64,
    pub medium: i64,
    pub low: i64,
}

impl SeverityTotals {
    pub fn record(&mut self, source: FindingSource, severity: Severity, status: FindingStatus) {
        match bucket_for(source, severity, status) {
            Some(SeverityBucket::Critical) => self.critical += 1,
            Some(SeverityBucket::High) => self.high += 1,
            Some(SeverityBucket::Medium) => self.medium += 1,
            Some(SeverityBucket::Low) => self.low += 1,
            None => {}
        }
    }

    pub fn merge(&mut self, other: &SeverityTotals) {
        self.critical += other.critical;
        self.high += other.high;
        self.medium += other.medium;
        self.low += other.low;
    }
}

/// Per-commit totals split by source, with the merged view.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SourceTotals {
    pub component: SeverityTotals,
    pub defect: SeverityTotals,
}

impl SourceTotals {
    pub fn record(&mut self, source: FindingSource, severity: Severity, status: FindingStatus) {
        match source {
            FindingSource::ComponentScanner => self.component.record(source, severity, status),
            FindingSource::StaticAnalysisScanner => self.defect.record(source, severity, status),
        }
    }

    pub fn merged(&self) -> SeverityTotals {
        let mut totals = self.component;
        totals.merge(&self.defect);
        totals
    }
}

/// Fleet-wide production exposure with the per-source breakdown.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct FleetTotals {
    pub merged: SeverityTotals,
    pub component: SeverityTotals,
    pub defect: SeverityTotals,
}

/// Fold a set of (source, severity, status) records into split totals.
pub fn fold_records<I>(records: I) -> SourceTotals
where
    I: IntoIterator<Item = (FindingSource, Severity, FindingStatus)>,
{
    let mut totals = SourceTotals::default();
    for (source, severity, status) in records {
        totals.record(source, severity, status);
    }
    totals
}

/// Severity totals for one commit, both sources merged.
pub async fn commit_totals(pool: &PgPool, commit_id: i64) -> Result<SeverityTotals, AppError> {
    Ok(commit_totals_by_source(pool, commit_id).await?.merged())
}

/// Severity totals for one commit, split by source.
pub async fn commit_totals_by_source(
    pool: &PgPool,
    commit_id: i64,
) -> Result<SourceTotals, AppError> {
    // Existence check so an unknown commit surfaces as CommitNotFound
    // rather than silently aggregating to zeros.
    commit::find_by_id(pool, commit_id).await?;
    let records = finding::severity_records(pool, commit_id).await?;
    Ok(fold_records(records))
}

/// Production exposure for one application: the totals of its
/// `In_Production` commit(s), or all zeros when none exists.
pub async fn application_production_totals(
    pool: &PgPool,
    project_id: &str,
) -> Result<SeverityTotals, AppError> {
    let mut totals = SeverityTotals::default();
    // The lifecycle keeps this to at most one commit, but the fold holds
    // for any number of rows claiming the status.
    for id in commit::production_commit_ids(pool, project_id).await? {
        let records = finding::severity_records(pool, id).await?;
        totals.merge(&fold_records(records).merged());
    }
    Ok(totals)
}

/// Production exposure across the whole fleet, per source and merged.
pub async fn fleet_production_totals(pool: &PgPool) -> Result<FleetTotals, AppError> {
    let records = finding::production_severity_records(pool).await?;
    let split = fold_records(records);
    Ok(FleetTotals {
        merged: split.merged(),
        component: split.component,
        defect: split.defect,
    })
}
