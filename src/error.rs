//! Error taxonomy for the engine.
//!
//! Only [`ConfigurationError`] and [`TransportSetupError`] abort a run. Request-level
//! failures are recorded as data on each outcome and never surface here.

use std::path::PathBuf;

/// Invalid run configuration, raised before any worker is spawned.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("invalid duration '{0}': expected an integer with optional s|m|h suffix")]
    InvalidDuration(String),

    #[error("duration must be greater than zero")]
    ZeroDuration,

    #[error("target RPS must be greater than zero")]
    NonPositiveRate,

    #[error("worker count must be greater than zero")]
    NoWorkers,

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,

    #[error("invalid target URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("endpoint '{name}' has weight {weight}; weights must be at least 1")]
    InvalidWeight { name: String, weight: i64 },

    #[error("endpoint '{name}' has an unusable URL '{url}': {reason}")]
    InvalidEndpointUrl {
        name: String,
        url: String,
        reason: String,
    },

    #[error("endpoint catalog has a total weight of zero")]
    ZeroWeightSum,

    #[error("failed to read endpoints file {path}: {source}")]
    EndpointsFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse endpoints file: {0}")]
    EndpointsParse(#[from] serde_json::Error),
}

/// The pooled client could not be built.
#[derive(Debug, thiserror::Error)]
pub enum TransportSetupError {
    #[error("failed to build TLS connector: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("invalid connection limit: {0}")]
    InvalidLimit(String),
}

/// A fault inside a worker iteration that is not tied to a request outcome.
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("endpoint '{name}' has an unusable URL '{url}': {source}")]
    InvalidUrl {
        name: String,
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to encode request body: {0}")]
    Body(#[from] serde_json::Error),
}

/// Failure while persisting run artifacts.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Fatal errors returned to the caller of a run.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("transport setup error: {0}")]
    TransportSetup(#[from] TransportSetupError),
}
