//! Polling engine for Cloudflare analytics.
//!
//! # Overview
//!
//! Each polling cycle proceeds as follows:
//!
//! 1. Zones and accounts visible with the configured [`Credentials`] are listed via the management API.
//!    Zones are [filtered](filter_zones()) with the include / exclude lists and split into
//!    [batches](batch()) of at most [`MAX_BATCH_SIZE`] zones.
//! 2. For each batch and each zone-keyed query [`Family`], and for each account and each account-keyed
//!    family, a pipeline is spawned. A pipeline queries the GraphQL analytics API for a one-minute
//!    [`QueryWindow`] and projects the response onto [`CloudflareMetrics`](flarewatch::CloudflareMetrics)
//!    using a [`MetricMapper`]. Families unavailable on the free plan are skipped for free zones.
//! 3. Pipelines run concurrently and independently; a failed pipeline is logged and skipped
//!    until the next cycle.
//!
//! The [`Scheduler`] starts a cycle on each tick of the scrape interval, without waiting for
//! the previous cycle to finish.
//!
//! # Examples
//!
//! ```no_run
//! use flarewatch::CloudflareMetrics;
//! use flarewatch_poller::{Credentials, PollerConfig, Scheduler};
//! use tokio::sync::watch;
//!
//! # async fn test() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PollerConfig::new(Credentials::Token("api-token".into()));
//! let metrics = CloudflareMetrics::default();
//! let scheduler = Scheduler::new(config, metrics.clone());
//! scheduler.check_upstream().await?;
//!
//! let (stop_sender, stop_receiver) = watch::channel(());
//! let polling_task = tokio::spawn(scheduler.run(stop_receiver));
//! // Later...
//! stop_sender.send_replace(());
//! polling_task.await?;
//! # Ok(())
//! # }
//! ```

// Linter settings.
#![warn(missing_debug_implementations, missing_docs, bare_trait_objects)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::missing_errors_doc
)]

pub use crate::{
    batch::{batch, Batch},
    client::{ApiError, CloudflareClient},
    config::{
        split_list, BatchSize, ConfigError, Credentials, PollerConfig, DEFAULT_API_URL,
        MAX_BATCH_SIZE,
    },
    fetch::AnalyticsFetcher,
    mapper::{worker_account_label, MetricMapper},
    resources::{filter_zones, Account, ResourceDirectory, Tier, Zone, ZoneIndex, FREE_PLAN_ID},
    rules::{normalize_rule_name, RuleDescriptions, MAX_RULE_LABEL_LEN},
    scheduler::{CycleReport, Family, Scheduler},
    window::QueryWindow,
};

mod batch;
mod client;
mod config;
pub mod fetch;
mod mapper;
mod resources;
mod rules;
mod scheduler;
#[cfg(test)]
mod testonly;
mod window;
