use chrono::Utc;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, warn};

use super::collector::ResultCollector;
use super::rate::RateController;
use super::stop::StopSignal;
use crate::catalog::WorkloadCatalog;
use crate::client::{Transport, TransportError};
use crate::error::SynthesisError;
use crate::models::RequestOutcome;

/// Pause after a fault that is not a request outcome.
pub const FAULT_PAUSE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WorkerState {
    #[default]
    Idle,
    Running,
    Stopped,
}

/// Per-worker totals, returned when the worker exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerSummary {
    pub id: usize,
    pub dispatched: u64,
    pub faults: u64,
    /// State the worker exited in.
    pub state: WorkerState,
}

pub struct Worker {
    id: usize,
    state: WorkerState,
    pacer: RateController,
    catalog: Arc<WorkloadCatalog>,
    transport: Arc<dyn Transport>,
    collector: Arc<ResultCollector>,
    stop: StopSignal,
    request_timeout: Duration,
    rng: StdRng,
}

impl Worker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: usize,
        pacer: RateController,
        catalog: Arc<WorkloadCatalog>,
        transport: Arc<dyn Transport>,
        collector: Arc<ResultCollector>,
        stop: StopSignal,
        request_timeout: Duration,
        rng: StdRng,
    ) -> Self {
        Self {
            id,
            state: WorkerState::Idle,
            pacer,
            catalog,
            transport,
            collector,
            stop,
            request_timeout,
            rng,
        }
    }

    pub async fn run(mut self) -> WorkerSummary {
        self.state = WorkerState::Running;
        debug!(worker = self.id, rps = self.pacer.rate(), "worker started");

        let mut summary = WorkerSummary {
            id: self.id,
            ..Default::default()
        };

        loop {
            if self.stop.is_stopped() {
                break;
            }
            if !self.pacer.pace(&self.stop).await {
                break;
            }

            match self.dispatch_one().await {
                Ok(()) => summary.dispatched += 1,
                Err(e) => {
                    summary.faults += 1;
                    warn!(worker = self.id, error = %e, "worker iteration failed");
                    sleep(FAULT_PAUSE).await;
                }
            }
        }

        self.state = WorkerState::Stopped;
        summary.state = self.state;
        debug!(
            worker = self.id,
            dispatched = summary.dispatched,
            faults = summary.faults,
            "worker stopped"
        );
        summary
    }

    async fn dispatch_one(&mut self) -> Result<(), SynthesisError> {
        let endpoint = self.catalog.select_endpoint(&mut self.rng);
        let request = self.catalog.generate_request(endpoint, &mut self.rng)?;

        let started = Instant::now();
        self.pacer.mark_dispatch(started);
        let dispatched_at = Utc::now();

        let result = match timeout(
            self.request_timeout,
            self.transport.issue_request(&request, self.request_timeout),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout),
        };

        let outcome = match result {
            Ok(response) => RequestOutcome::from_response(
                dispatched_at,
                &endpoint.name,
                &request.url,
                request.method,
                &response,
            ),
            Err(e) => {
                debug!(worker = self.id, url = %request.url, error = %e, "request failed");
                RequestOutcome::from_error(
                    dispatched_at,
                    &endpoint.name,
                    &request.url,
                    request.method,
                    &e,
                    started.elapsed().as_secs_f64() * 1000.0,
                )
            }
        };

        self.collector.append(outcome);
        Ok(())
    }
}
