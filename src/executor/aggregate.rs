//! Reduction of the outcome set into a [`MetricsSnapshot`].
//!
//! The reduction is order-independent: latencies are sorted before any
//! floating-point sum, so the same set of outcomes always yields bit-identical
//! metrics no matter how workers interleaved their appends.

use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::BTreeMap;

use crate::models::{ErrorBreakdownEntry, MetricsSnapshot, RequestOutcome};

/// Value at `floor(quantile * n)` of an ascending slice, clamped to the last index.
pub fn percentile(sorted: &[f64], quantile: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = (quantile * sorted.len() as f64).floor() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

pub fn median(sorted: &[f64]) -> f64 {
    let len = sorted.len();
    if len == 0 {
        return 0.0;
    }
    if len % 2 == 0 {
        (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0
    } else {
        sorted[len / 2]
    }
}

pub fn compute(
    outcomes: &[RequestOutcome],
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
) -> MetricsSnapshot {
    let elapsed_secs = (end_time - start_time)
        .to_std()
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);

    let total = outcomes.len() as u64;
    let successful = outcomes.iter().filter(|o| o.success).count() as u64;
    let failed = total - successful;
    let total_bytes: u64 = outcomes.iter().map(|o| o.size).sum();

    let mut latencies: Vec<f64> = outcomes.iter().map(|o| o.response_time_ms).collect();
    latencies.sort_by(f64::total_cmp);

    let (min, max, avg) = match (latencies.first(), latencies.last()) {
        (Some(&min), Some(&max)) => {
            let sum: f64 = latencies.iter().sum();
            (min, max, sum / latencies.len() as f64)
        }
        _ => (0.0, 0.0, 0.0),
    };

    let rps = if elapsed_secs > 0.0 {
        total as f64 / elapsed_secs
    } else {
        0.0
    };
    let error_rate = if total > 0 {
        failed as f64 / total as f64 * 100.0
    } else {
        0.0
    };

    MetricsSnapshot {
        total_requests: total,
        successful_requests: successful,
        failed_requests: failed,
        total_bytes,
        min_response_time: min,
        max_response_time: max,
        avg_response_time: avg,
        p50_response_time: median(&latencies),
        p95_response_time: percentile(&latencies, 0.95),
        p99_response_time: percentile(&latencies, 0.99),
        rps,
        error_rate,
        start_time,
        end_time,
        elapsed_secs,
        error_breakdown: error_breakdown(outcomes),
    }
}

/// Failed outcomes grouped by status and classification, most frequent first.
pub fn error_breakdown(outcomes: &[RequestOutcome]) -> Vec<ErrorBreakdownEntry> {
    let mut groups: BTreeMap<(u16, &'static str), u64> = BTreeMap::new();
    for outcome in outcomes.iter().filter(|o| !o.success) {
        let error = outcome.error.map(|e| e.as_str()).unwrap_or("unknown");
        *groups.entry((outcome.status_code, error)).or_insert(0) += 1;
    }

    let mut entries: Vec<ErrorBreakdownEntry> = groups
        .into_iter()
        .map(|((status_code, error), count)| ErrorBreakdownEntry {
            status_code,
            error: error.to_string(),
            count,
        })
        .collect();
    // Stable sort keeps the BTreeMap key order for equal counts.
    entries.sort_by_key(|e| Reverse(e.count));
    entries
}
