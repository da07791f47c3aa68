//! Load-testing engine: weighted workload synthesis, per-worker rate pacing,
//! concurrent execution over a pooled HTTP transport, and latency/error
//! aggregation.

pub mod catalog;
pub mod cli;
pub mod client;
pub mod error;
pub mod executor;
pub mod logging;
pub mod models;
pub mod report;
pub mod utils;

pub use catalog::{ScenarioVocabulary, WorkloadCatalog};
pub use client::{SynthesizedRequest, Transport, TransportError, TransportResponse};
pub use error::{ConfigurationError, EngineError, TransportSetupError};
pub use executor::{Orchestrator, RunReport, RunState, StopSignal};
pub use models::{MetricsSnapshot, RequestOutcome, TestConfiguration};
pub use report::ReportWriter;
