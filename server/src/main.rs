//! Prometheus exporter for Cloudflare analytics.

use anyhow::Context as _;
use clap::Parser;
use flarewatch::{CloudflareMetrics, Registry};
use flarewatch_exporter::MetricsExporter;
use flarewatch_poller::Scheduler;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use std::{io, sync::Arc};

use crate::config::Cli;

mod config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();

    let config = Cli::parse().into_config()?;
    tracing::info!(
        listen = %config.listen,
        metrics_path = %config.metrics_path,
        denied_metrics = config.denied_metrics.len(),
        poller = ?config.poller,
        "Parsed configuration"
    );

    let metrics = CloudflareMetrics::new(&config.denied_metrics);
    let registry = Arc::new(Registry::new(&metrics));
    let scheduler = Scheduler::new(config.poller, metrics);
    let zone_count = scheduler
        .check_upstream()
        .await
        .context("cannot list zones; check the API URL and credentials")?;
    tracing::info!(zone_count, "Verified upstream API access");

    let (stop_sender, stop_receiver) = watch::channel(());
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        stop_sender.send_replace(());
    });

    let mut exporter_stop_receiver = stop_receiver.clone();
    let exporter_server = MetricsExporter::new(registry)
        .with_metrics_path(&config.metrics_path)
        .with_graceful_shutdown(async move {
            exporter_stop_receiver.changed().await.ok();
        })
        .bind(config.listen)
        .await
        .with_context(|| format!("failed binding to `{}`", config.listen))?;
    println!("local_addr={}", exporter_server.local_addr());
    // ^ Print the local server address so that it can be used in integration tests

    let polling_task = tokio::spawn(scheduler.run(stop_receiver));
    exporter_server
        .start()
        .await
        .context("metrics exporter failed")?;
    polling_task.await.context("polling loop panicked")?;
    Ok(())
}
