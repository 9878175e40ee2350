//! Application model, keyed by the externally-issued scanner project id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub project_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_serialization() {
        let app = Application {
            project_id: "8a2f9c1e-7b4d-4e2a-9f0c-1d3e5a7b9c2d".to_string(),
            name: "payments-gateway".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&app).unwrap();
        assert_eq!(json["project_id"], "8a2f9c1e-7b4d-4e2a-9f0c-1d3e5a7b9c2d");
        assert_eq!(json["name"], "payments-gateway");
    }
}
