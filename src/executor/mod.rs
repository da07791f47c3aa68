//! Run lifecycle: validation, worker spawn, duration/cancellation handling,
//! drain and metrics computation.

pub mod aggregate;
pub mod collector;
pub mod live;
pub mod rate;
pub mod stop;
pub mod worker;

pub use collector::ResultCollector;
pub use rate::{split_rate, RateController};
pub use stop::{watch_interrupts, Interrupt, StopSignal};
pub use worker::{Worker, WorkerState, WorkerSummary};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::catalog::WorkloadCatalog;
use crate::client::{HyperTransport, Transport, TransportSettings};
use crate::error::{ConfigurationError, EngineError};
use crate::models::{MetricsSnapshot, RequestOutcome, TestConfiguration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Draining,
    Completed,
    /// Construction failed; surfaced to callers as an [`EngineError`].
    Aborted,
}

/// Everything a report writer needs once a run has completed.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub config: TestConfiguration,
    pub snapshot: MetricsSnapshot,
    /// Most recent outcomes, capped at `config.sample_size`.
    pub sample: Vec<RequestOutcome>,
    pub workers: Vec<WorkerSummary>,
    pub stopped_early: bool,
    /// State the run finished in.
    pub state: RunState,
}

/// Owns one run. Nothing is shared between orchestrators, so independent runs
/// can coexist in one process.
pub struct Orchestrator {
    config: TestConfiguration,
    duration: Duration,
    catalog: Arc<WorkloadCatalog>,
    transport: Arc<dyn Transport>,
    collector: Arc<ResultCollector>,
    stop: StopSignal,
    state: RunState,
}

impl Orchestrator {
    /// Validates `config` and builds the catalog and the pooled HTTP transport.
    pub fn new(config: TestConfiguration) -> Result<Self, EngineError> {
        let prepared = prepare(&config).and_then(|catalog| {
            let transport = HyperTransport::new(&TransportSettings::from(&config))?;
            Ok((catalog, transport))
        });
        match prepared {
            Ok((catalog, transport)) => {
                Self::assemble(config, Arc::new(catalog), Arc::new(transport))
            }
            Err(e) => Err(aborted(e)),
        }
    }

    /// Like [`Orchestrator::new`] but with a caller-supplied transport.
    pub fn with_transport(
        config: TestConfiguration,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, EngineError> {
        let catalog = prepare(&config).map_err(aborted)?;
        Self::assemble(config, Arc::new(catalog), transport)
    }

    /// Uses an explicit catalog instead of the default mix or endpoints file.
    pub fn with_parts(
        config: TestConfiguration,
        catalog: WorkloadCatalog,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, EngineError> {
        config
            .validate()
            .map_err(|e| aborted(EngineError::from(e)))?;
        Self::assemble(config, Arc::new(catalog), transport)
    }

    fn assemble(
        config: TestConfiguration,
        catalog: Arc<WorkloadCatalog>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, EngineError> {
        let duration = Duration::from_secs(config.duration_secs()?);
        Ok(Self {
            config,
            duration,
            catalog,
            transport,
            collector: Arc::new(ResultCollector::new()),
            stop: StopSignal::new(),
            state: RunState::Idle,
        })
    }

    /// Handle for external cancellation (signals, embedding code).
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn config(&self) -> &TestConfiguration {
        &self.config
    }

    fn transition(&mut self, next: RunState) {
        debug!(from = ?self.state, to = ?next, "run state change");
        self.state = next;
    }

    pub async fn run(mut self) -> RunReport {
        let rates = split_rate(self.config.target_rps, self.config.effective_workers());

        info!(
            target = %self.config.target_url,
            rps = self.config.target_rps,
            duration_secs = self.duration.as_secs(),
            workers = rates.len(),
            endpoints = self.catalog.endpoints().len(),
            "starting load test"
        );
        if rates.len() < self.config.workers {
            info!(
                requested = self.config.workers,
                used = rates.len(),
                "worker count capped at target RPS"
            );
        }

        self.transition(RunState::Running);
        let start_time = Utc::now();

        let mut handles = Vec::with_capacity(rates.len());
        for (id, rate) in rates.into_iter().enumerate() {
            let rng = match self.config.seed {
                Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(id as u64)),
                None => StdRng::from_entropy(),
            };
            let worker = Worker::new(
                id,
                RateController::new(rate),
                Arc::clone(&self.catalog),
                Arc::clone(&self.transport),
                Arc::clone(&self.collector),
                self.stop.clone(),
                self.config.request_timeout(),
                rng,
            );
            handles.push(tokio::spawn(worker.run()));
        }

        let reporter = self
            .config
            .report_interval_secs
            .filter(|secs| *secs > 0)
            .map(|secs| {
                tokio::spawn(live::live_report(
                    Arc::clone(&self.collector),
                    self.stop.clone(),
                    start_time,
                    Duration::from_secs(secs),
                ))
            });

        let stopped_early = tokio::select! {
            _ = sleep(self.duration) => false,
            _ = self.stop.stopped() => true,
        };

        self.transition(RunState::Draining);
        if stopped_early {
            info!("stop requested, draining workers");
        } else {
            info!("duration reached, draining workers");
        }
        self.stop.stop();

        let mut workers = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(summary) => workers.push(summary),
                Err(e) => error!(error = %e, "worker task failed"),
            }
        }
        if let Some(reporter) = reporter {
            let _ = reporter.await;
        }

        self.transport.close().await;
        let end_time = Utc::now();

        let snapshot = self
            .collector
            .with_outcomes(|all| aggregate::compute(all, start_time, end_time));
        let sample = self.collector.recent(self.config.sample_size);
        self.transition(RunState::Completed);

        info!(
            total = snapshot.total_requests,
            rps = format!("{:.2}", snapshot.rps),
            error_rate = format!("{:.2}%", snapshot.error_rate),
            "load test completed"
        );

        RunReport {
            config: self.config,
            snapshot,
            sample,
            workers,
            stopped_early,
            state: self.state,
        }
    }
}

fn prepare(config: &TestConfiguration) -> Result<WorkloadCatalog, EngineError> {
    config.validate()?;
    Ok(build_catalog(config)?)
}

fn build_catalog(config: &TestConfiguration) -> Result<WorkloadCatalog, ConfigurationError> {
    let base = config.base_url()?;
    match &config.endpoints_file {
        Some(path) => WorkloadCatalog::from_file(&base, path),
        None => WorkloadCatalog::default_mix(&base),
    }
}

fn aborted(err: EngineError) -> EngineError {
    error!(state = ?RunState::Aborted, error = %err, "run aborted before start");
    err
}
