use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::client::{TransportError, TransportResponse};
use crate::models::endpoint::HttpMethod;

/// Why a request counted as failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Timeout,
    Connect,
    Closed,
    Protocol,
    InvalidRequest,
    HttpStatus,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::Connect => "connect",
            ErrorKind::Closed => "closed",
            ErrorKind::Protocol => "protocol",
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::HttpStatus => "http_status",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one dispatched request. Never mutated after creation.
#[derive(Debug, Clone, Serialize)]
pub struct RequestOutcome {
    pub timestamp: DateTime<Utc>,
    pub endpoint: String,
    pub url: String,
    pub method: HttpMethod,
    pub status_code: u16,
    pub response_time_ms: f64,
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,

    pub size: u64,
}

pub fn is_success_status(status: u16) -> bool {
    (200..400).contains(&status)
}

impl RequestOutcome {
    pub fn from_response(
        timestamp: DateTime<Utc>,
        endpoint: &str,
        url: &str,
        method: HttpMethod,
        response: &TransportResponse,
    ) -> Self {
        let success = is_success_status(response.status);
        Self {
            timestamp,
            endpoint: endpoint.to_string(),
            url: url.to_string(),
            method,
            status_code: response.status,
            response_time_ms: response.latency.as_secs_f64() * 1000.0,
            success,
            error: if success { None } else { Some(ErrorKind::HttpStatus) },
            size: response.body_size,
        }
    }

    pub fn from_error(
        timestamp: DateTime<Utc>,
        endpoint: &str,
        url: &str,
        method: HttpMethod,
        error: &TransportError,
        elapsed_ms: f64,
    ) -> Self {
        Self {
            timestamp,
            endpoint: endpoint.to_string(),
            url: url.to_string(),
            method,
            status_code: 0,
            response_time_ms: elapsed_ms,
            success: false,
            error: Some(error.kind()),
            size: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn success_is_2xx_and_3xx() {
        assert!(!is_success_status(199));
        assert!(is_success_status(200));
        assert!(is_success_status(302));
        assert!(is_success_status(399));
        assert!(!is_success_status(400));
        assert!(!is_success_status(503));
        assert!(!is_success_status(0));
    }

    #[test]
    fn non_success_status_is_classified() {
        let response = TransportResponse {
            status: 503,
            body_size: 12,
            latency: Duration::from_millis(40),
        };
        let outcome =
            RequestOutcome::from_response(Utc::now(), "home", "http://x/", HttpMethod::GET, &response);
        assert!(!outcome.success);
        assert_eq!(outcome.error, Some(ErrorKind::HttpStatus));
        assert_eq!(outcome.size, 12);
        assert!((outcome.response_time_ms - 40.0).abs() < 1e-9);
    }

    #[test]
    fn transport_error_records_status_zero() {
        let outcome = RequestOutcome::from_error(
            Utc::now(),
            "home",
            "http://x/",
            HttpMethod::GET,
            &TransportError::Timeout,
            30_000.0,
        );
        assert_eq!(outcome.status_code, 0);
        assert!(!outcome.success);
        assert_eq!(outcome.error, Some(ErrorKind::Timeout));
    }
}
