use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::error::ConfigurationError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_CONNECTIONS: usize = 1000;
pub const DEFAULT_MAX_CONNECTIONS_PER_HOST: usize = 100;
pub const DEFAULT_KEEPALIVE_SECS: u64 = 30;
pub const DEFAULT_SAMPLE_SIZE: usize = 1000;

/// Parameters of a single load test run. Immutable once the run starts.
#[derive(Debug, Clone, Serialize)]
pub struct TestConfiguration {
    pub target_url: String,
    pub target_rps: u32,
    pub duration: String,
    pub workers: usize,
    pub output_dir: PathBuf,
    pub test_id: String,
    pub timeout_secs: u64,
    pub max_connections: usize,
    pub max_connections_per_host: usize,
    pub keepalive_timeout_secs: u64,
    pub verify_tls: bool,
    pub sample_size: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_interval_secs: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoints_file: Option<PathBuf>,
}

impl TestConfiguration {
    pub fn new(
        target_url: impl Into<String>,
        target_rps: u32,
        duration: impl Into<String>,
        workers: usize,
    ) -> Self {
        Self {
            target_url: target_url.into(),
            target_rps,
            duration: duration.into(),
            workers,
            output_dir: PathBuf::from("."),
            test_id: "loadtest".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            max_connections_per_host: DEFAULT_MAX_CONNECTIONS_PER_HOST,
            keepalive_timeout_secs: DEFAULT_KEEPALIVE_SECS,
            verify_tls: true,
            sample_size: DEFAULT_SAMPLE_SIZE,
            report_interval_secs: None,
            seed: None,
            endpoints_file: None,
        }
    }

    /// Checks every field that must hold before `Running`.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.target_rps == 0 {
            return Err(ConfigurationError::NonPositiveRate);
        }
        if self.workers == 0 {
            return Err(ConfigurationError::NoWorkers);
        }
        if self.timeout_secs == 0 {
            return Err(ConfigurationError::ZeroTimeout);
        }
        if parse_duration(&self.duration)? == 0 {
            return Err(ConfigurationError::ZeroDuration);
        }
        self.base_url()?;
        Ok(())
    }

    pub fn duration_secs(&self) -> Result<u64, ConfigurationError> {
        parse_duration(&self.duration)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn keepalive_timeout(&self) -> Duration {
        Duration::from_secs(self.keepalive_timeout_secs)
    }

    /// Workers that actually run: never more than the target rate, so that
    /// each one is assigned at least one request per second.
    pub fn effective_workers(&self) -> usize {
        self.workers.min(self.target_rps as usize)
    }

    pub fn base_url(&self) -> Result<Url, ConfigurationError> {
        let invalid = |reason: String| ConfigurationError::InvalidUrl {
            url: self.target_url.clone(),
            reason,
        };
        let url = Url::parse(&self.target_url).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(invalid(format!("unsupported scheme '{}'", other))),
        }
    }
}

/// Parses `"30s"`, `"5m"`, `"2h"` or a bare number of seconds.
pub fn parse_duration(input: &str) -> Result<u64, ConfigurationError> {
    let invalid = || ConfigurationError::InvalidDuration(input.to_string());
    let trimmed = input.trim();

    let (digits, multiplier) = match trimmed.chars().last() {
        Some('s') => (&trimmed[..trimmed.len() - 1], 1),
        Some('m') => (&trimmed[..trimmed.len() - 1], 60),
        Some('h') => (&trimmed[..trimmed.len() - 1], 3600),
        Some(_) => (trimmed, 1),
        None => return Err(invalid()),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let value: u64 = digits.parse().map_err(|_| invalid())?;
    value.checked_mul(multiplier).ok_or_else(invalid)
}
