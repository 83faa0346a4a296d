//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Runner, RunnerConfig};

/// Execute the `run` command
pub async fn run_dumper(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(&args.config).into());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    info!(
        pattern = %config.node.pattern,
        strategy = ?config.dump.strategy,
        inputs = args.inputs.len(),
        chunk_size = args.chunk_size,
        "Configuration loaded"
    );

    let runner = Runner::new(RunnerConfig {
        dumper: config,
        inputs: args.inputs.clone(),
        chunk_size: args.chunk_size,
        output_dir: args.output_dir.clone(),
        metrics_port: (args.metrics_port != 0).then_some(args.metrics_port),
        timeout: (args.timeout != 0).then(|| Duration::from_secs(args.timeout)),
    });

    let shutdown = CancellationToken::new();
    let signal = tokio::spawn(cancel_on_signal(shutdown.clone()));

    let result = runner.run(shutdown.clone()).await;
    signal.abort();

    let stats = result.context("Run failed")?;
    info!(
        packets_sent = stats.packets_sent,
        dumped = stats.metrics.dumped,
        failures = stats.metrics.failures(),
        duration_secs = stats.duration.as_secs_f64(),
        "Run finished"
    );
    stats.print_summary();

    if stats.metrics.failures() > 0 {
        warn!(failures = stats.metrics.failures(), "Some packets were not dumped");
    }
    Ok(())
}

/// Cancel `shutdown` on Ctrl+C or SIGTERM
async fn cancel_on_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    warn!("Received shutdown signal, stopping node...");
    shutdown.cancel();
}
