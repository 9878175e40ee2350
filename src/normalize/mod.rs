//! Normalization of raw scanner records into the canonical taxonomy.
//!
//! Each source has its own vocabulary and fields; the per-source modules
//! map them case-insensitively onto `Severity` and `FindingStatus`. A raw
//! value that matches nothing lands in the `Unknown` sentinel instead of
//! failing, so one malformed record never aborts a batch.

pub mod component;
pub mod defect;

use crate::models::finding::{FindingSource, FindingStatus, Severity};

/// A raw record the batch normalizer dropped, with the reason.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SkippedRecord {
    pub record_index: usize,
    pub reason: String,
}

/// Result of normalizing one raw batch.
#[derive(Debug)]
pub struct NormalizedBatch<T> {
    pub findings: Vec<T>,
    pub skipped: Vec<SkippedRecord>,
}

/// Map one raw (severity, status) pair through the source's lookup tables.
///
/// Pure; absent values normalize the same as unmatched ones.
pub fn normalize(
    source: FindingSource,
    raw_severity: Option<&str>,
    raw_status: Option<&str>,
) -> (Severity, FindingStatus) {
    match source {
        FindingSource::ComponentScanner => (
            component::map_severity(raw_severity),
            component::map_status(raw_status),
        ),
        FindingSource::StaticAnalysisScanner => (
            defect::map_severity(raw_severity),
            defect::map_status(raw_status),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_dispatches_per_source() {
        let (sev, status) = normalize(
            FindingSource::ComponentScanner,
            Some("CRITICAL"),
            Some("NEW"),
        );
        assert_eq!(sev, Severity::Critical);
        assert_eq!(status, FindingStatus::New);

        let (sev, status) = normalize(
            FindingSource::StaticAnalysisScanner,
            Some("medium"),
            Some("Triaged"),
        );
        assert_eq!(sev, Severity::Medium);
        assert_eq!(status, FindingStatus::Triaged);
    }

    #[test]
    fn absent_values_map_to_sentinels() {
        let (sev, status) = normalize(FindingSource::ComponentScanner, None, None);
        assert_eq!(sev, Severity::Unknown);
        assert_eq!(status, FindingStatus::Unknown);
    }
}
