use async_trait::async_trait;
use clap::Parser;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use shutdown_gate::lifecycle::{self, named, spawned, AsyncHandler, Continuation};
use shutdown_gate::{GateConfig, ShutdownCoordinator};

#[derive(Parser)]
#[command(name = "shutdown-gate")]
#[command(about = "Demo service whose shutdown waits for in-flight jobs")]
struct Cli {
    /// Number of simulated jobs started at boot.
    #[arg(long, env, default_value = "3")]
    jobs: usize,

    /// Seconds each simulated job runs for.
    #[arg(long, env, default_value = "10")]
    job_secs: u64,

    /// Per-handler timeout in milliseconds. 0 = wait indefinitely.
    #[arg(long, env, default_value = "0")]
    handler_timeout_ms: u64,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

/// Vetoes shutdown while any job is still running.
struct JobsDrained {
    in_flight: Arc<AtomicUsize>,
}

#[async_trait]
impl AsyncHandler for JobsDrained {
    fn name(&self) -> &str {
        "jobs-drained"
    }

    async fn decide(&self) -> bool {
        let in_flight = self.in_flight.load(Ordering::Acquire);
        if in_flight > 0 {
            tracing::info!(in_flight, "Jobs still running, refusing shutdown");
            return false;
        }
        true
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(&cli.log_level)
        .with_writer(std::io::stderr)
        .init();

    let gate = Arc::new(ShutdownCoordinator::new(GateConfig::with_timeout_ms(
        cli.handler_timeout_ms,
    )));

    let in_flight = Arc::new(AtomicUsize::new(cli.jobs));
    for job in 0..cli.jobs {
        let in_flight = in_flight.clone();
        let duration = Duration::from_secs(cli.job_secs);
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let remaining = in_flight.fetch_sub(1, Ordering::AcqRel) - 1;
            tracing::info!(job, remaining, "Job finished");
        });
    }

    gate.register_approval_handler(spawned(JobsDrained {
        in_flight: in_flight.clone(),
    }))
    .await;
    gate.register_cleanup_handler(named("flush-state", |done: Continuation| {
        tokio::spawn(async move {
            tracing::info!("Flushing state before exit");
            tokio::time::sleep(Duration::from_millis(200)).await;
            done.approve();
        });
    }))
    .await;

    tracing::info!(
        jobs = cli.jobs,
        job_secs = cli.job_secs,
        "Service started, waiting for signals..."
    );

    let listener = lifecycle::listen(gate)?;
    listener.await?;

    tracing::warn!("Signal listener stopped");
    Ok(())
}
