use anyhow::Result;
use clap::Parser;
use tokio::sync::mpsc;

use loadforge_engine::cli::Cli;
use loadforge_engine::executor::{watch_interrupts, Interrupt};
use loadforge_engine::{logging, report, Orchestrator, ReportWriter, TestConfiguration};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    let config = TestConfiguration::from(cli);

    let log_file = config.output_dir.join(format!("{}.log", config.test_id));
    logging::init(verbose, Some(&log_file))?;

    tracing::info!("Loadforge engine starting");
    tracing::info!("Target: {}", config.target_url);
    tracing::info!("Target RPS: {}", config.target_rps);
    tracing::info!("Duration: {}", config.duration);
    tracing::info!("Users: {}", config.workers);

    // Configuration and transport-setup failures exit non-zero from here.
    let orchestrator = Orchestrator::new(config)?;
    let output_dir = orchestrator.config().output_dir.clone();

    let stop = orchestrator.stop_signal();
    let mut signals = forward_signals();
    tokio::spawn(async move {
        if watch_interrupts(&stop, &mut signals).await == Some(Interrupt::Forced) {
            std::process::exit(130);
        }
    });

    let run = orchestrator.run().await;

    ReportWriter::new(output_dir).write(&run)?;
    report::print_summary(&run);

    Ok(())
}

/// Delivers one message per SIGINT or SIGTERM for as long as the process runs.
fn forward_signals() -> mpsc::Receiver<()> {
    let (tx, rx) = mpsc::channel(4);

    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let (mut interrupt, mut terminate) =
                match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
                    (Ok(i), Ok(t)) => (i, t),
                    (Err(e), _) | (_, Err(e)) => {
                        tracing::warn!("Cannot listen for interrupt signals: {}", e);
                        return;
                    }
                };

            loop {
                tokio::select! {
                    Some(()) = interrupt.recv() => {}
                    Some(()) = terminate.recv() => {}
                    else => return,
                }
                if tx.send(()).await.is_err() {
                    return;
                }
            }
        }

        #[cfg(not(unix))]
        {
            while tokio::signal::ctrl_c().await.is_ok() {
                if tx.send(()).await.is_err() {
                    return;
                }
            }
        }
    });

    rx
}
