//! Run artifacts: a JSON results file, a plain-text summary and the console
//! banner printed at the end of a run.

use chrono::{DateTime, Local, Utc};
use colored::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::ReportError;
use crate::executor::RunReport;
use crate::models::{MetricsSnapshot, RequestOutcome, TestConfiguration};
use crate::utils::hardware::{get_hardware_info, HostInfo};

#[derive(Debug, Serialize)]
struct ResultsDocument<'a> {
    test_id: &'a str,
    generated_at: DateTime<Utc>,
    stopped_early: bool,
    config: &'a TestConfiguration,
    metrics: &'a MetricsSnapshot,
    error_counts: BTreeMap<String, u64>,
    host: HostInfo,
    results: &'a [RequestOutcome],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub results: PathBuf,
    pub summary: PathBuf,
}

/// Writes `<run_id>-results.json` and `<run_id>-summary.txt` into one directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn write(&self, report: &RunReport) -> Result<ReportPaths, ReportError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| ReportError::Io {
            path: self.output_dir.clone(),
            source,
        })?;

        let test_id = report.config.test_id.as_str();
        let paths = ReportPaths {
            results: self.output_dir.join(format!("{}-results.json", test_id)),
            summary: self.output_dir.join(format!("{}-summary.txt", test_id)),
        };

        let document = ResultsDocument {
            test_id,
            generated_at: Utc::now(),
            stopped_early: report.stopped_early,
            config: &report.config,
            metrics: &report.snapshot,
            error_counts: report
                .snapshot
                .error_breakdown
                .iter()
                .map(|e| (e.key(), e.count))
                .collect(),
            host: get_hardware_info(),
            results: &report.sample,
        };
        let json = serde_json::to_vec_pretty(&document)?;
        write_file(&paths.results, &json)?;
        write_file(&paths.summary, render_summary(report).as_bytes())?;

        info!(dir = %self.output_dir.display(), "results saved");
        Ok(paths)
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), ReportError> {
    fs::write(path, contents).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn render_summary(report: &RunReport) -> String {
    let config = &report.config;
    let m = &report.snapshot;
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "High-Performance Load Test Summary");
    let _ = writeln!(out, "==================================\n");
    let _ = writeln!(out, "Test ID: {}", config.test_id);
    let _ = writeln!(out, "Target URL: {}", config.target_url);
    let _ = writeln!(out, "Target RPS: {}", config.target_rps);
    let _ = writeln!(out, "Duration: {}", config.duration);
    let _ = writeln!(out, "Users: {}", config.workers);
    if report.stopped_early {
        let _ = writeln!(out, "Stopped early: yes");
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Results:");
    let _ = writeln!(out, "--------");
    let _ = writeln!(out, "Total Requests: {}", m.total_requests);
    let _ = writeln!(out, "Successful Requests: {}", m.successful_requests);
    let _ = writeln!(out, "Failed Requests: {}", m.failed_requests);
    let _ = writeln!(out, "Actual RPS: {:.2}", m.rps);
    let _ = writeln!(out, "Error Rate: {:.2}%", m.error_rate);
    let _ = writeln!(
        out,
        "Total Data: {:.2} MB\n",
        m.total_bytes as f64 / 1024.0 / 1024.0
    );

    let _ = writeln!(out, "Response Times (ms):");
    let _ = writeln!(out, "-------------------");
    let _ = writeln!(out, "Min: {:.2}", m.min_response_time);
    let _ = writeln!(out, "Max: {:.2}", m.max_response_time);
    let _ = writeln!(out, "Avg: {:.2}", m.avg_response_time);
    let _ = writeln!(out, "P50: {:.2}", m.p50_response_time);
    let _ = writeln!(out, "P95: {:.2}", m.p95_response_time);
    let _ = writeln!(out, "P99: {:.2}", m.p99_response_time);

    if !m.error_breakdown.is_empty() {
        let _ = writeln!(out, "\nError Breakdown:");
        let _ = writeln!(out, "---------------");
        for entry in &m.error_breakdown {
            let _ = writeln!(out, "{}: {}", entry.key(), entry.count);
        }
    }

    out
}

/// Console banner shown when a run finishes.
pub fn print_summary(report: &RunReport) {
    let m = &report.snapshot;
    let timestamp = Local::now().format("%Y/%m/%d %H:%M:%S");

    println!();
    println!("{}", "======== TEST RESULTS ========".bold().white().on_blue());
    println!("{} {}", "Timestamp            :".blue().bold(), timestamp);
    println!("{} {}", "Total requests       :".green().bold(), m.total_requests);
    println!("{} {}", "Successful requests  :".green().bold(), m.successful_requests);
    println!("{} {}", "Failed requests      :".red().bold(), m.failed_requests);
    println!("{} {:.2}", "Requests per second  :".blue().bold(), m.rps);
    println!("{} {:.2}%", "Error rate           :".red().bold(), m.error_rate);
    println!("{} {:.2}", "Fastest response (ms):".cyan().bold(), m.min_response_time);
    println!("{} {:.2}", "Slowest response (ms):".yellow().bold(), m.max_response_time);
    println!("{} {:.2}", "Median response (ms) :".magenta().bold(), m.p50_response_time);
    println!("{} {:.2}", "P95 response (ms)    :".magenta().bold(), m.p95_response_time);
    println!("{} {:.2}", "P99 response (ms)    :".magenta().bold(), m.p99_response_time);

    if !m.error_breakdown.is_empty() {
        println!();
        println!("{}", "======== ERROR BREAKDOWN ========".bold().white().on_blue());
        for entry in &m.error_breakdown {
            println!("• {}: {}", entry.key().as_str().bold(), entry.count);
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{aggregate, RunState};
    use crate::models::{ErrorKind, HttpMethod};

    fn outcome(i: u64, status: u16) -> RequestOutcome {
        let success = (200..400).contains(&status);
        RequestOutcome {
            timestamp: Utc::now(),
            endpoint: "home".to_string(),
            url: format!("http://svc.test/{}", i),
            method: HttpMethod::GET,
            status_code: status,
            response_time_ms: 5.0 + i as f64,
            success,
            error: if success { None } else { Some(ErrorKind::HttpStatus) },
            size: 128,
        }
    }

    fn report(sample_size: usize) -> RunReport {
        let outcomes: Vec<_> = (0..20)
            .map(|i| outcome(i, if i % 5 == 0 { 500 } else { 200 }))
            .collect();
        let start = Utc::now();
        let snapshot = aggregate::compute(&outcomes, start, start + chrono::Duration::seconds(2));

        let mut config = TestConfiguration::new("http://svc.test", 10, "2s", 2);
        config.test_id = "run-42".to_string();
        config.sample_size = sample_size;

        let start_idx = outcomes.len().saturating_sub(sample_size);
        RunReport {
            config,
            snapshot,
            sample: outcomes[start_idx..].to_vec(),
            workers: Vec::new(),
            stopped_early: false,
            state: RunState::Completed,
        }
    }

    #[test]
    fn writes_results_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path().join("out"));
        let paths = writer.write(&report(5)).unwrap();

        assert!(paths.results.ends_with("run-42-results.json"));
        let json: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&paths.results).unwrap()).unwrap();
        assert_eq!(json["test_id"], "run-42");
        assert_eq!(json["metrics"]["total_requests"], 20);
        assert_eq!(json["error_counts"]["500_http_status"], 4);
        assert_eq!(json["results"].as_array().unwrap().len(), 5);
        assert_eq!(json["results"][4]["url"], "http://svc.test/19");
        assert!(json["host"]["cpu_cores"].is_u64());

        let summary = std::fs::read_to_string(&paths.summary).unwrap();
        assert!(summary.contains("Total Requests: 20"));
        assert!(summary.contains("500_http_status: 4"));
    }

    #[test]
    fn summary_omits_breakdown_without_failures() {
        let mut r = report(1);
        r.snapshot.error_breakdown.clear();
        let text = render_summary(&r);
        assert!(text.contains("Test ID: run-42"));
        assert!(!text.contains("Error Breakdown"));
    }
}
