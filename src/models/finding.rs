//! Normalized finding model with the canonical severity/status taxonomies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// -- Enums matching PostgreSQL --

/// Which scanner produced a finding.
///
/// Not a database column: the two sources persist to separate tables, and
/// rows are tagged with their source when loaded into the unified model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FindingSource {
    ComponentScanner,
    StaticAnalysisScanner,
}

impl std::fmt::Display for FindingSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ComponentScanner => write!(f, "component_scanner"),
            Self::StaticAnalysisScanner => write!(f, "static_analysis_scanner"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "severity_level")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    /// Sentinel for raw values the normalizer could not match. Never
    /// contributes to any severity bucket.
    Unknown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "finding_status")]
pub enum FindingStatus {
    New,
    Triaged,
    Fixed,
    Dismissed,
    Unknown,
}

// -- Persisted rows, one struct per source table --

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ComponentFinding {
    pub id: i64,
    pub project_id: String,
    pub commit_id: i64,
    pub bdsa_id: String,
    pub component_name: String,
    pub severity: Severity,
    pub status: FindingStatus,
    pub recommended_version: Option<String>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DefectFinding {
    pub id: i64,
    pub project_id: String,
    pub commit_id: i64,
    pub cid: i64,
    pub defect_type: String,
    pub severity: Severity,
    pub status: FindingStatus,
    pub created_at: DateTime<Utc>,
}

// -- Unified tagged view --

/// Scanner-specific payload of a normalized finding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum FindingDetail {
    ComponentScanner {
        bdsa_id: String,
        component_name: String,
        recommended_version: Option<String>,
        comment: Option<String>,
    },
    StaticAnalysisScanner {
        cid: i64,
        defect_type: String,
    },
}

/// A finding from either source in one shape, so listing and aggregation
/// logic never branches per table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub commit_id: i64,
    pub severity: Severity,
    pub status: FindingStatus,
    #[serde(flatten)]
    pub detail: FindingDetail,
}

impl Finding {
    pub fn source(&self) -> FindingSource {
        match self.detail {
            FindingDetail::ComponentScanner { .. } => FindingSource::ComponentScanner,
            FindingDetail::StaticAnalysisScanner { .. } => FindingSource::StaticAnalysisScanner,
        }
    }
}

impl From<ComponentFinding> for Finding {
    fn from(row: ComponentFinding) -> Self {
        Self {
            commit_id: row.commit_id,
            severity: row.severity,
            status: row.status,
            detail: FindingDetail::ComponentScanner {
                bdsa_id: row.bdsa_id,
                component_name: row.component_name,
                recommended_version: row.recommended_version,
                comment: row.comment,
            },
        }
    }
}

impl From<DefectFinding> for Finding {
    fn from(row: DefectFinding) -> Self {
        Self {
            commit_id: row.commit_id,
            severity: row.severity,
            status: row.status,
            detail: FindingDetail::StaticAnalysisScanner {
                cid: row.cid,
                defect_type: row.defect_type,
            },
        }
    }
}

// -- Raw scanner records, as supplied by the fetch collaborator --

/// One raw component-scanner record. All fields optional: per-record
/// problems are handled by the normalizer, never by deserialization.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawComponentFinding {
    pub bdsa_id: Option<String>,
    pub component_name: Option<String>,
    pub severity: Option<String>,
    pub remediation_status: Option<String>,
    pub recommended_version: Option<String>,
    pub comment: Option<String>,
}

/// One raw defect-scanner record. `cid` arrives as an integer or a numeric
/// string depending on the scanner's export path.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawDefectFinding {
    pub cid: Option<serde_json::Value>,
    pub impact: Option<String>,
    #[serde(rename = "type")]
    pub defect_type: Option<String>,
    pub status: Option<String>,
}

// -- Normalized insert payloads --

#[derive(Debug, Clone, PartialEq)]
pub struct NewComponentFinding {
    pub bdsa_id: String,
    pub component_name: String,
    pub severity: Severity,
    pub status: FindingStatus,
    pub recommended_version: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewDefectFinding {
    pub cid: i64,
    pub defect_type: String,
    pub severity: Severity,
    pub status: FindingStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_serialization() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"Critical\"");
    }

    #[test]
    fn finding_status_round_trip() {
        let status: FindingStatus = serde_json::from_str("\"Dismissed\"").unwrap();
        assert_eq!(status, FindingStatus::Dismissed);
    }

    #[test]
    fn finding_source_display() {
        assert_eq!(
            FindingSource::ComponentScanner.to_string(),
            "component_scanner"
        );
        assert_eq!(
            FindingSource::StaticAnalysisScanner.to_string(),
            "static_analysis_scanner"
        );
    }

    #[test]
    fn unified_finding_reports_its_source() {
        let f = Finding {
            commit_id: 1,
            severity: Severity::High,
            status: FindingStatus::New,
            detail: FindingDetail::StaticAnalysisScanner {
                cid: 42,
                defect_type: "NULL_RETURNS".to_string(),
            },
        };
        assert_eq!(f.source(), FindingSource::StaticAnalysisScanner);
    }

    #[test]
    fn finding_serializes_with_source_tag() {
        let f = Finding {
            commit_id: 9,
            severity: Severity::Critical,
            status: FindingStatus::New,
            detail: FindingDetail::ComponentScanner {
                bdsa_id: "BDSA-2024-0001".to_string(),
                component_name: "openssl".to_string(),
                recommended_version: Some("3.0.13".to_string()),
                comment: None,
            },
        };
        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json["source"], "component_scanner");
        assert_eq!(json["bdsa_id"], "BDSA-2024-0001");
        assert_eq!(json["severity"], "Critical");
    }

    #[test]
    fn raw_defect_cid_accepts_number_or_string() {
        let numeric: RawDefectFinding = serde_json::from_str(
            r#"{"cid": 7, "impact": "High", "type": "OVERRUN", "status": "New"}"#,
        )
        .unwrap();
        assert_eq!(numeric.cid, Some(serde_json::json!(7)));

        let string: RawDefectFinding = serde_json::from_str(
            r#"{"cid": "7", "impact": "High", "type": "OVERRUN", "status": "New"}"#,
        )
        .unwrap();
        assert_eq!(string.cid, Some(serde_json::json!("7")));
    }
}
