//! End-to-end runs of the orchestrator against stub transports.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use loadforge_engine::{
    ConfigurationError, EngineError, Orchestrator, RunState, SynthesizedRequest,
    TestConfiguration, Transport, TransportError, TransportResponse,
};

/// Answers every request with a fixed status after a fixed delay.
struct StubTransport {
    status: u16,
    delay: Duration,
    calls: AtomicU64,
}

impl StubTransport {
    fn new(status: u16, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            status,
            delay,
            calls: AtomicU64::new(0),
        })
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn issue_request(
        &self,
        _request: &SynthesizedRequest,
        _timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let start = Instant::now();
        tokio::time::sleep(self.delay).await;
        Ok(TransportResponse {
            status: self.status,
            body_size: 64,
            latency: start.elapsed(),
        })
    }
}

struct RefusingTransport;

#[async_trait]
impl Transport for RefusingTransport {
    async fn issue_request(
        &self,
        _request: &SynthesizedRequest,
        _timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        Err(TransportError::Connect("connection refused".to_string()))
    }
}

fn config(rps: u32, workers: usize, duration: &str) -> TestConfiguration {
    let mut config = TestConfiguration::new("http://shop.test", rps, duration, workers);
    config.seed = Some(17);
    config.sample_size = 10_000;
    config
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn steady_run_hits_target_rate() {
    let stub = StubTransport::new(200, Duration::from_millis(5));
    let orchestrator = Orchestrator::with_transport(config(10, 2, "2s"), stub.clone()).unwrap();

    let report = orchestrator.run().await;
    let m = &report.snapshot;

    assert!(
        (18..=22).contains(&m.total_requests),
        "expected about 20 requests, got {}",
        m.total_requests
    );
    assert_eq!(m.total_requests, m.successful_requests + m.failed_requests);
    assert_eq!(m.error_rate, 0.0);
    assert!(m.p99_response_time >= 5.0, "p99 {}", m.p99_response_time);
    assert!(m.p99_response_time < 50.0, "p99 {}", m.p99_response_time);
    assert_eq!(m.total_bytes, 64 * m.total_requests);
    assert_eq!(stub.calls.load(Ordering::SeqCst), m.total_requests);
    assert_eq!(report.workers.len(), 2);
    assert!(!report.stopped_early);
    assert_eq!(report.state, RunState::Completed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn live_reporter_does_not_hold_up_the_run() {
    let mut cfg = config(20, 2, "3s");
    cfg.report_interval_secs = Some(1);
    let stub = StubTransport::new(200, Duration::from_millis(2));
    let orchestrator = Orchestrator::with_transport(cfg, stub.clone()).unwrap();

    let started = Instant::now();
    let report = orchestrator.run().await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(report.state, RunState::Completed);
    assert!(
        (54..=66).contains(&report.snapshot.total_requests),
        "expected about 60 requests, got {}",
        report.snapshot.total_requests
    );
    assert_eq!(stub.calls.load(Ordering::SeqCst), report.snapshot.total_requests);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stop_signal_drains_within_timeout() {
    let mut cfg = config(20, 2, "30s");
    cfg.timeout_secs = 1;
    let stub = StubTransport::new(200, Duration::from_millis(5));
    let orchestrator = Orchestrator::with_transport(cfg, stub).unwrap();
    let stop = orchestrator.stop_signal();

    let run = tokio::spawn(orchestrator.run());
    tokio::time::sleep(Duration::from_millis(500)).await;

    let stop_time = Utc::now();
    let stopped_at = Instant::now();
    stop.stop();

    let report = run.await.unwrap();
    assert!(stopped_at.elapsed() < Duration::from_secs(2));
    assert!(report.stopped_early);

    let deadline = stop_time + chrono::Duration::seconds(1);
    assert!(report.sample.iter().all(|o| o.timestamp <= deadline));
    assert_eq!(report.snapshot.total_requests as usize, report.sample.len());
    assert!(report.snapshot.total_requests > 0);
}

#[tokio::test]
async fn request_failures_are_data_not_errors() {
    let orchestrator =
        Orchestrator::with_transport(config(10, 2, "1s"), Arc::new(RefusingTransport)).unwrap();

    let report = orchestrator.run().await;
    let m = &report.snapshot;

    assert!(m.total_requests > 0);
    assert_eq!(m.successful_requests, 0);
    assert_eq!(m.error_rate, 100.0);
    assert_eq!(m.error_breakdown.len(), 1);
    assert_eq!(m.error_breakdown[0].key(), "0_connect");
    assert_eq!(m.error_breakdown[0].count, m.total_requests);
}

#[tokio::test]
async fn server_errors_are_counted_as_failures() {
    let stub = StubTransport::new(503, Duration::from_millis(1));
    let orchestrator = Orchestrator::with_transport(config(10, 1, "1s"), stub).unwrap();

    let m = orchestrator.run().await.snapshot;
    assert_eq!(m.failed_requests, m.total_requests);
    assert_eq!(m.error_breakdown[0].key(), "503_http_status");
}

#[tokio::test]
async fn overload_shows_in_achieved_rps() {
    let stub = StubTransport::new(200, Duration::from_millis(300));
    let orchestrator = Orchestrator::with_transport(config(10, 1, "2s"), stub).unwrap();

    let m = orchestrator.run().await.snapshot;
    assert!(m.rps < 8.0, "achieved {} rps with 300ms latency", m.rps);
    assert!(m.total_requests <= 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_runs_do_not_share_results() {
    let fast = StubTransport::new(200, Duration::from_millis(1));
    let slow = StubTransport::new(500, Duration::from_millis(1));

    let a = Orchestrator::with_transport(config(20, 2, "1s"), fast.clone()).unwrap();
    let b = Orchestrator::with_transport(config(5, 1, "1s"), slow.clone()).unwrap();

    let (ra, rb) = tokio::join!(a.run(), b.run());

    assert_eq!(ra.snapshot.total_requests, fast.calls.load(Ordering::SeqCst));
    assert_eq!(rb.snapshot.total_requests, slow.calls.load(Ordering::SeqCst));
    assert_eq!(ra.snapshot.failed_requests, 0);
    assert_eq!(rb.snapshot.successful_requests, 0);
}

#[test]
fn invalid_configuration_aborts_before_start() {
    let stub = StubTransport::new(200, Duration::from_millis(1));

    let err = Orchestrator::with_transport(config(10, 0, "2s"), stub.clone())
        .err()
        .unwrap();
    assert!(matches!(
        err,
        EngineError::Configuration(ConfigurationError::NoWorkers)
    ));

    let err = Orchestrator::with_transport(config(0, 2, "2s"), stub.clone())
        .err()
        .unwrap();
    assert!(matches!(
        err,
        EngineError::Configuration(ConfigurationError::NonPositiveRate)
    ));

    let err = Orchestrator::with_transport(config(10, 2, "2 weeks"), stub.clone())
        .err()
        .unwrap();
    assert!(matches!(
        err,
        EngineError::Configuration(ConfigurationError::InvalidDuration(_))
    ));
    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn endpoints_file_with_bad_weight_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("endpoints.json");
    std::fs::write(
        &path,
        r#"[
            {"name": "home", "path": "/", "weight": 5},
            {"name": "search", "path": "/search", "weight": -2, "scenario": "search"}
        ]"#,
    )
    .unwrap();

    let mut cfg = config(10, 2, "2s");
    cfg.endpoints_file = Some(path);
    let err = Orchestrator::with_transport(cfg, StubTransport::new(200, Duration::ZERO))
        .err()
        .unwrap();
    assert!(matches!(
        err,
        EngineError::Configuration(ConfigurationError::InvalidWeight { weight: -2, .. })
    ));
}

#[tokio::test]
async fn endpoints_file_drives_the_traffic_mix() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("endpoints.json");
    std::fs::write(
        &path,
        r#"[{"name": "checkout", "path": "/api/checkout", "method": "POST", "weight": 1, "scenario": "create_order"}]"#,
    )
    .unwrap();

    let mut cfg = config(10, 1, "1s");
    cfg.endpoints_file = Some(path);
    let orchestrator =
        Orchestrator::with_transport(cfg, StubTransport::new(201, Duration::ZERO)).unwrap();

    let report = orchestrator.run().await;
    assert!(!report.sample.is_empty());
    assert!(report
        .sample
        .iter()
        .all(|o| o.endpoint == "checkout" && o.url == "http://shop.test/api/checkout"));
}

#[test]
fn endpoints_file_with_unusable_url_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("endpoints.json");
    std::fs::write(
        &path,
        r#"[
            {"name": "home", "path": "/", "weight": 5},
            {"name": "elsewhere", "path": "https://other.test/x", "weight": 1}
        ]"#,
    )
    .unwrap();

    let mut cfg = config(10, 2, "2s");
    cfg.endpoints_file = Some(path);
    let stub = StubTransport::new(200, Duration::ZERO);
    let err = Orchestrator::with_transport(cfg, stub.clone()).err().unwrap();
    assert!(matches!(
        err,
        EngineError::Configuration(ConfigurationError::InvalidEndpointUrl { ref name, .. })
            if name == "elsewhere"
    ));
    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn endpoints_file_paths_without_leading_slash_stay_on_target() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("endpoints.json");
    std::fs::write(&path, r#"[{"name": "items", "path": "api/items", "weight": 1}]"#).unwrap();

    let mut cfg = config(10, 1, "1s");
    cfg.endpoints_file = Some(path);
    let orchestrator =
        Orchestrator::with_transport(cfg, StubTransport::new(200, Duration::ZERO)).unwrap();

    let report = orchestrator.run().await;
    assert!(!report.sample.is_empty());
    assert!(report
        .sample
        .iter()
        .all(|o| o.url == "http://shop.test/api/items"));
}
