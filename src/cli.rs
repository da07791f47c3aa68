use clap::Parser;
use std::path::PathBuf;

use crate::models::config::{
    TestConfiguration, DEFAULT_KEEPALIVE_SECS, DEFAULT_MAX_CONNECTIONS,
    DEFAULT_MAX_CONNECTIONS_PER_HOST, DEFAULT_SAMPLE_SIZE, DEFAULT_TIMEOUT_SECS,
};

/// High-performance HTTP load generator
#[derive(Parser, Debug, Clone)]
#[command(name = "loadforge")]
#[command(about = "Drives weighted, rate-controlled synthetic traffic and reports latency/error statistics")]
#[command(version)]
pub struct Cli {
    /// Base URL of the system under test
    #[arg(long, env = "LOADFORGE_TARGET_URL")]
    pub target_url: String,

    /// Aggregate requests per second to sustain
    #[arg(long, env = "LOADFORGE_TARGET_RPS")]
    pub target_rps: u32,

    /// Test duration, e.g. 30s, 5m, 2h or a bare number of seconds
    #[arg(long, env = "LOADFORGE_DURATION")]
    pub duration: String,

    /// Number of concurrent workers (virtual users)
    #[arg(long, visible_alias = "workers", env = "LOADFORGE_USERS")]
    pub users: usize,

    /// Directory for results, summary and log
    #[arg(long, env = "LOADFORGE_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Run identifier used to name output files
    #[arg(long, env = "LOADFORGE_TEST_ID")]
    pub test_id: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, env = "LOADFORGE_TIMEOUT")]
    pub timeout: u64,

    /// Maximum concurrent connections
    #[arg(long, default_value_t = DEFAULT_MAX_CONNECTIONS, env = "LOADFORGE_MAX_CONNECTIONS")]
    pub max_connections: usize,

    /// Maximum idle pooled connections per host
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_CONNECTIONS_PER_HOST,
        env = "LOADFORGE_MAX_CONNECTIONS_PER_HOST"
    )]
    pub max_connections_per_host: usize,

    /// Keep-alive timeout for pooled connections, in seconds
    #[arg(long, default_value_t = DEFAULT_KEEPALIVE_SECS, env = "LOADFORGE_KEEPALIVE_TIMEOUT")]
    pub keepalive_timeout: u64,

    /// Skip TLS certificate and hostname verification
    #[arg(long, env = "LOADFORGE_DISABLE_SSL_VERIFY")]
    pub disable_ssl_verify: bool,

    /// Number of most recent request results kept in the JSON artifact
    #[arg(long, default_value_t = DEFAULT_SAMPLE_SIZE, env = "LOADFORGE_SAMPLE_SIZE")]
    pub sample_size: usize,

    /// Log interim metrics every N seconds while running
    #[arg(long, env = "LOADFORGE_REPORT_INTERVAL")]
    pub report_interval: Option<u64>,

    /// Seed for reproducible endpoint selection and payloads
    #[arg(long, env = "LOADFORGE_SEED")]
    pub seed: Option<u64>,

    /// JSON file with the endpoint mix, replacing the built-in one
    #[arg(long, env = "LOADFORGE_ENDPOINTS")]
    pub endpoints: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl From<Cli> for TestConfiguration {
    fn from(cli: Cli) -> Self {
        Self {
            target_url: cli.target_url,
            target_rps: cli.target_rps,
            duration: cli.duration,
            workers: cli.users,
            output_dir: cli.output_dir,
            test_id: cli.test_id,
            timeout_secs: cli.timeout,
            max_connections: cli.max_connections,
            max_connections_per_host: cli.max_connections_per_host,
            keepalive_timeout_secs: cli.keepalive_timeout,
            verify_tls: !cli.disable_ssl_verify,
            sample_size: cli.sample_size,
            report_interval_secs: cli.report_interval,
            seed: cli.seed,
            endpoints_file: cli.endpoints,
        }
    }
}
