//! Component-scanner (dependency vulnerability) record normalization.
//!
//! The component scanner reports four severity tiers and a remediation
//! status vocabulary; findings are keyed by a "BDSA-style" string id.

use std::collections::HashSet;

use crate::models::finding::{
    FindingStatus, NewComponentFinding, RawComponentFinding, Severity,
};
use crate::normalize::{NormalizedBatch, SkippedRecord};

/// Map a raw component-scanner severity onto the canonical scale.
pub fn map_severity(raw: Option<&str>) -> Severity {
    match raw.unwrap_or("").to_uppercase().as_str() {
        "CRITICAL" => Severity::Critical,
        "HIGH" => Severity::High,
        "MEDIUM" => Severity::Medium,
        "LOW" => Severity::Low,
        _ => Severity::Unknown,
    }
}

/// Map a raw remediation status onto the canonical finding status.
pub fn map_status(raw: Option<&str>) -> FindingStatus {
    match raw.unwrap_or("").to_uppercase().as_str() {
        "NEW" => FindingStatus::New,
        "NEEDS_REVIEW" | "UNDER_REVIEW" => FindingStatus::Triaged,
        "PATCHED" | "REMEDIATED" | "REMEDIATION_COMPLETE" => FindingStatus::Fixed,
        "DISMISSED" | "IGNORED" | "DUPLICATE" => FindingStatus::Dismissed,
        _ => FindingStatus::Unknown,
    }
}

/// Normalize a raw component batch.
///
/// Records without a stable id are skipped, as are repeats of an id already
/// seen in the batch; both are logged and the rest of the batch proceeds.
pub fn normalize_batch(raw: &[RawComponentFinding]) -> NormalizedBatch<NewComponentFinding> {
    let mut findings = Vec::with_capacity(raw.len());
    let mut skipped = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (i, record) in raw.iter().enumerate() {
        let bdsa_id = match record.bdsa_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                tracing::warn!(record_index = i, "component record missing bdsa_id, skipping");
                skipped.push(SkippedRecord {
                    record_index: i,
                    reason: "missing bdsa_id".to_string(),
                });
                continue;
            }
        };

        if !seen.insert(bdsa_id.clone()) {
            tracing::warn!(record_index = i, bdsa_id = %bdsa_id, "duplicate bdsa_id in batch, skipping");
            skipped.push(SkippedRecord {
                record_index: i,
                reason: format!("duplicate bdsa_id '{bdsa_id}' in batch"),
            });
            continue;
        }

        findings.push(NewComponentFinding {
            bdsa_id,
            component_name: record
                .component_name
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            severity: map_severity(record.severity.as_deref()),
            status: map_status(record.remediation_status.as_deref()),
            recommended_version: record.recommended_version.clone(),
            comment: record.comment.clone(),
        });
    }

    NormalizedBatch { findings, skipped }
}
