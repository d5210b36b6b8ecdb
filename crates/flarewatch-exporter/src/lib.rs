//! Metric exporter for `flarewatch` metrics based on the `hyper` web server.
//!
//! The exporter serves two endpoints: a scrape endpoint (`/metrics` by default) returning the registry
//! snapshot in the Prometheus text format, and a liveness endpoint (`/health`).
//!
//! # Examples
//!
//! ```no_run
//! use flarewatch::{CloudflareMetrics, Registry};
//! use flarewatch_exporter::MetricsExporter;
//! use tokio::sync::watch;
//!
//! # async fn test() -> std::io::Result<()> {
//! let metrics = CloudflareMetrics::default();
//! let registry = Registry::new(&metrics);
//! let (stop_sender, mut stop_receiver) = watch::channel(());
//! let exporter = MetricsExporter::new(registry.into())
//!     .with_metrics_path("/metrics")
//!     .with_graceful_shutdown(async move {
//!         stop_receiver.changed().await.ok();
//!     });
//! let server = exporter.bind("0.0.0.0:8080".parse().unwrap()).await?;
//! println!("Serving on {}", server.local_addr());
//! tokio::spawn(server.start());
//! // Later...
//! stop_sender.send_replace(());
//! # Ok(())
//! # }
//! ```

// Linter settings.
#![warn(missing_debug_implementations, missing_docs, bare_trait_objects)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

pub use crate::exporter::{
    normalize_metrics_path, MetricsExporter, MetricsServer, DEFAULT_METRICS_PATH, HEALTH_PATH,
};

mod exporter;
