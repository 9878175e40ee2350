//! Commit model: one release/build of an application, with its lifecycle
//! status and cached severity snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "commit_status")]
pub enum CommitStatus {
    #[sqlx(rename = "In_Development")]
    #[serde(rename = "In_Development")]
    InDevelopment,
    #[sqlx(rename = "In_Production")]
    #[serde(rename = "In_Production")]
    InProduction,
    Archived,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Commit {
    pub id: i64,
    pub project_id: String,
    pub build_id: String,
    pub release_label: String,
    pub status: CommitStatus,
    pub created_at: DateTime<Utc>,
    // Cached severity snapshot, recomputed after every refresh.
    pub critical: i32,
    pub high: i32,
    pub medium: i32,
    pub low: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_status_serialization() {
        let json = serde_json::to_string(&CommitStatus::InProduction).unwrap();
        assert_eq!(json, "\"In_Production\"");
    }

    #[test]
    fn commit_status_deserialization() {
        let status: CommitStatus = serde_json::from_str("\"In_Development\"").unwrap();
        assert_eq!(status, CommitStatus::InDevelopment);

        let archived: CommitStatus = serde_json::from_str("\"Archived\"").unwrap();
        assert_eq!(archived, CommitStatus::Archived);
    }

    #[test]
    fn unknown_commit_status_rejected() {
        let result = serde_json::from_str::<CommitStatus>("\"Retired\"");
        assert!(result.is_err());
    }
}
