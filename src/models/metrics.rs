use chrono::{DateTime, Utc};
use serde::Serialize;

/// Derived summary of a run. Recomputable from the outcome set at any time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub total_bytes: u64,

    pub min_response_time: f64,
    pub max_response_time: f64,
    pub avg_response_time: f64,
    pub p50_response_time: f64,
    pub p95_response_time: f64,
    pub p99_response_time: f64,

    pub rps: f64,
    pub error_rate: f64,

    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub elapsed_secs: f64,

    pub error_breakdown: Vec<ErrorBreakdownEntry>,
}

/// Failed outcomes sharing a status code and classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBreakdownEntry {
    pub status_code: u16,
    pub error: String,
    pub count: u64,
}

impl ErrorBreakdownEntry {
    /// `"<status>_<error>"`, the key used in the JSON `error_counts` map.
    pub fn key(&self) -> String {
        format!("{}_{}", self.status_code, self.error)
    }
}
