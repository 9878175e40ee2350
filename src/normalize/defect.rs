//! Static-analysis (code defect) record normalization.
//!
//! The defect scanner labels severity as "impact" and reports three tiers;
//! findings are keyed by an integer defect id (cid) that some export paths
//! serialize as a numeric string.

use std::collections::HashSet;

use crate::models::finding::{FindingStatus, NewDefectFinding, RawDefectFinding, Severity};
use crate::normalize::{NormalizedBatch, SkippedRecord};

/// Map a raw impact label onto the canonical scale.
///
/// A raw "Critical" still normalizes to `Severity::Critical`; keeping it
/// out of the critical bucket is the aggregation rule's job, not ours.
pub fn map_severity(raw: Option<&str>) -> Severity {
    match raw.unwrap_or("").to_uppercase().as_str() {
        "CRITICAL" => Severity::Critical,
        "HIGH" => Severity::High,
        "MEDIUM" => Severity::Medium,
        "LOW" => Severity::Low,
        _ => Severity::Unknown,
    }
}

/// Map a raw triage-state label onto the canonical finding status.
pub fn map_status(raw: Option<&str>) -> FindingStatus {
    match raw.unwrap_or("").to_uppercase().as_str() {
        "NEW" => FindingStatus::New,
        "TRIAGED" => FindingStatus::Triaged,
        "FIXED" => FindingStatus::Fixed,
        "DISMISSED" => FindingStatus::Dismissed,
        _ => FindingStatus::Unknown,
    }
}

/// Parse the defect id from its integer-or-numeric-string wire form.
fn parse_cid(raw: Option<&serde_json::Value>) -> Option<i64> {
    match raw {
        Some(serde_json::Value::Number(n)) => n.as_i64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Normalize a raw defect batch.
///
/// Records whose cid is absent or not parseable as an integer are skipped,
/// as are in-batch repeats of a cid; the rest of the batch proceeds.
pub fn normalize_batch(raw: &[RawDefectFinding]) -> NormalizedBatch<NewDefectFinding> {
    let mut findings = Vec::with_capacity(raw.len());
    let mut skipped = Vec::new();
    let mut seen: HashSet<i64> = HashSet::new();

    for (i, record) in raw.iter().enumerate() {
        let cid = match parse_cid(record.cid.as_ref()) {
            Some(cid) => cid,
            None => {
                tracing::warn!(record_index = i, "defect record has unparseable cid, skipping");
                skipped.push(SkippedRecord {
                    record_index: i,
                    reason: "unparseable cid".to_string(),
                });
                continue;
            }
        };

        if !seen.insert(cid) {
            tracing::warn!(record_index = i, cid, "duplicate cid in batch, skipping");
            skipped.push(SkippedRecord {
                record_index: i,
                reason: format!("duplicate cid {cid} in batch"),
            });
            continue;
        }

        findings.push(NewDefectFinding {
            cid,
            defect_type: record
                .defect_type
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            severity: map_severity(record.impact.as_deref()),
            status: map_status(record.status.as_deref()),
        });
    }

    NormalizedBatch { findings, skipped }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(cid: serde_json::Value, impact: &str, status: &str) -> RawDefectFinding {
        RawDefectFinding {
            cid: Some(cid),
            impact: Some(impact.to_string()),
            defect_type: Some("RESOURCE_LEAK".to_string()),
            status: Some(status.to_string()),
        }
    }

    #[test]
    fn impact_mapping_case_insensitive() {
        assert_eq!(map_severity(Some("high")), Severity::High);
        assert_eq!(map_severity(Some("MEDIUM")), Severity::Medium);
        assert_eq!(map_severity(Some("Low")), Severity::Low);
    }

    #[test]
    fn critical_impact_normalizes_to_critical() {
        // The asymmetric bucket rule is applied at aggregation time.
        assert_eq!(map_severity(Some("Critical")), Severity::Critical);
    }

    #[test]
    fn triage_state_mapping() {
        assert_eq!(map_status(Some("new")), FindingStatus::New);
        assert_eq!(map_status(Some("Triaged")), FindingStatus::Triaged);
        assert_eq!(map_status(Some("FIXED")), FindingStatus::Fixed);
        assert_eq!(map_status(Some("Dismissed")), FindingStatus::Dismissed);
        assert_eq!(map_status(Some("Absent")), FindingStatus::Unknown);
    }

    #[test]
    fn cid_parses_from_number_and_string() {
        let batch = normalize_batch(&[
            raw(serde_json::json!(101), "High", "New"),
            raw(serde_json::json!("102"), "Medium", "New"),
            raw(serde_json::json!(" 103 "), "Low", "New"),
        ]);
        assert_eq!(batch.findings.len(), 3);
        assert_eq!(batch.findings[0].cid, 101);
        assert_eq!(batch.findings[1].cid, 102);
        assert_eq!(batch.findings[2].cid, 103);
    }

    #[test]
    fn unparseable_cid_skipped() {
        let batch = normalize_batch(&[
            raw(serde_json::json!("CID-9"), "High", "New"),
            RawDefectFinding {
                cid: None,
                impact: Some("High".to_string()),
                defect_type: None,
                status: Some("New".to_string()),
            },
            raw(serde_json::json!(7), "High", "New"),
        ]);
        assert_eq!(batch.findings.len(), 1);
        assert_eq!(batch.findings[0].cid, 7);
        assert_eq!(batch.skipped.len(), 2);
        assert_eq!(batch.skipped[0].reason, "unparseable cid");
    }

    #[test]
    fn duplicate_cid_skipped() {
        let batch = normalize_batch(&[
            raw(serde_json::json!(7), "High", "New"),
            raw(serde_json::json!("7"), "High", "New"),
        ]);
        assert_eq!(batch.findings.len(), 1);
        assert_eq!(batch.skipped.len(), 1);
        assert!(batch.skipped[0].reason.contains("duplicate cid 7"));
    }

    #[test]
    fn missing_type_defaults() {
        let batch = normalize_batch(&[RawDefectFinding {
            cid: Some(serde_json::json!(11)),
            impact: Some("Medium".to_string()),
            defect_type: None,
            status: Some("Triaged".to_string()),
        }]);
        assert_eq!(batch.findings[0].defect_type, "unknown");
    }
}
