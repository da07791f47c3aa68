//! Interim progress logging while a run is in flight.
//!
//! Each tick copies only the outcomes appended since the previous tick, so
//! workers contend for the collector lock for a slice copy and never for a
//! sort over the whole history.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use super::aggregate::percentile;
use super::collector::ResultCollector;
use super::stop::StopSignal;

/// Running totals kept by the reporter, independent of the collector.
#[derive(Debug, Default)]
pub struct LiveTally {
    seen: usize,
    failed: u64,
    latencies: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveSnapshot {
    pub total: u64,
    pub failed: u64,
    pub rps: f64,
    pub p95_ms: f64,
    pub error_rate: f64,
}

impl LiveTally {
    /// Pulls outcomes appended since the last call.
    pub fn absorb(&mut self, collector: &ResultCollector) {
        let fresh: Vec<(f64, bool)> = collector.with_tail(self.seen, |tail| {
            tail.iter().map(|o| (o.response_time_ms, o.success)).collect()
        });

        self.seen += fresh.len();
        for (latency, success) in fresh {
            if !success {
                self.failed += 1;
            }
            self.latencies.push(latency);
        }
    }

    pub fn snapshot(&mut self, elapsed_secs: f64) -> LiveSnapshot {
        self.latencies.sort_by(f64::total_cmp);
        let total = self.latencies.len() as u64;

        LiveSnapshot {
            total,
            failed: self.failed,
            rps: if elapsed_secs > 0.0 {
                total as f64 / elapsed_secs
            } else {
                0.0
            },
            p95_ms: percentile(&self.latencies, 0.95),
            error_rate: if total > 0 {
                self.failed as f64 / total as f64 * 100.0
            } else {
                0.0
            },
        }
    }
}

/// Logs an interim snapshot every `every` until the run stops.
pub async fn live_report(
    collector: Arc<ResultCollector>,
    stop: StopSignal,
    start_time: DateTime<Utc>,
    every: Duration,
) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await;

    let mut tally = LiveTally::default();
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = stop.stopped() => break,
        }

        tally.absorb(&collector);
        let elapsed = (Utc::now() - start_time)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        let snapshot = tally.snapshot(elapsed);

        info!(
            total = snapshot.total,
            failed = snapshot.failed,
            rps = format!("{:.2}", snapshot.rps),
            p95_ms = format!("{:.2}", snapshot.p95_ms),
            error_rate = format!("{:.2}%", snapshot.error_rate),
            "live metrics"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ErrorKind, HttpMethod, RequestOutcome};

    fn outcome(latency: f64, success: bool) -> RequestOutcome {
        RequestOutcome {
            timestamp: Utc::now(),
            endpoint: "e".to_string(),
            url: "http://x/".to_string(),
            method: HttpMethod::GET,
            status_code: if success { 200 } else { 500 },
            response_time_ms: latency,
            success,
            error: if success { None } else { Some(ErrorKind::HttpStatus) },
            size: 0,
        }
    }

    #[test]
    fn tally_only_takes_new_outcomes() {
        let collector = ResultCollector::new();
        let mut tally = LiveTally::default();

        for i in 0..10 {
            collector.append(outcome(f64::from(i), i % 5 != 0));
        }
        tally.absorb(&collector);
        let first = tally.snapshot(2.0);
        assert_eq!(first.total, 10);
        assert_eq!(first.failed, 2);
        assert_eq!(first.rps, 5.0);
        assert_eq!(first.error_rate, 20.0);
        assert_eq!(first.p95_ms, 9.0);

        tally.absorb(&collector);
        assert_eq!(tally.snapshot(2.0).total, 10);

        collector.append(outcome(100.0, true));
        tally.absorb(&collector);
        let second = tally.snapshot(0.0);
        assert_eq!(second.total, 11);
        assert_eq!(second.rps, 0.0);
        assert_eq!(second.p95_ms, 100.0);
    }

    #[test]
    fn empty_tally_reports_zeros() {
        let mut tally = LiveTally::default();
        tally.absorb(&ResultCollector::new());
        let s = tally.snapshot(1.0);
        assert_eq!(s.total, 0);
        assert_eq!(s.p95_ms, 0.0);
        assert_eq!(s.error_rate, 0.0);
    }

    #[tokio::test]
    async fn reporter_exits_on_stop() {
        let stop = StopSignal::new();
        let handle = tokio::spawn(live_report(
            Arc::new(ResultCollector::new()),
            stop.clone(),
            Utc::now(),
            Duration::from_millis(20),
        ));

        tokio::time::sleep(Duration::from_millis(70)).await;
        stop.stop();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
