pub mod config;
pub mod endpoint;
pub mod metrics;
pub mod outcome;

pub use config::{parse_duration, TestConfiguration};
pub use endpoint::{EndpointDescriptor, EndpointSpec, HttpMethod, ScenarioKind};
pub use metrics::{ErrorBreakdownEntry, MetricsSnapshot};
pub use outcome::{ErrorKind, RequestOutcome};
