//! Metric catalog and registry for the Cloudflare analytics exporter, based on the `prometheus-client` crate.
//!
//! # Overview
//!
//! - The set of exported metrics is closed; it is defined by [`MetricName`]. Each name has a fixed
//!   [kind](MetricKind) (counter or gauge), help text and label set.
//! - Metrics that must not be exposed are listed in [`DeniedMetrics`]. The deny-list is validated against
//!   the catalog, so a typo is caught at startup rather than silently ignored.
//! - [`CloudflareMetrics`] holds a labeled [`Family`] for every metric in the catalog. Families of denied
//!   metrics are disabled: they ignore updates and are never registered.
//! - Families are registered in a [`Registry`], which then allows to [encode](Registry::encode())
//!   metric data in the Prometheus or OpenMetrics text [`Format`].
//!
//! # Examples
//!
//! ```
//! use flarewatch::{labels::ZoneLabels, CloudflareMetrics, DeniedMetrics, Format, Registry};
//!
//! let denied = DeniedMetrics::parse("cloudflare_zone_uniques_total".split(','))?;
//! let metrics = CloudflareMetrics::new(&denied);
//! let registry = Registry::new(&metrics);
//!
//! let labels = ZoneLabels {
//!     zone: "example.com".to_owned(),
//!     account: "Acme".to_owned(),
//! };
//! metrics.zone_requests_total.add(&labels, 100);
//! // Denied families ignore updates.
//! metrics.zone_uniques_total.add(&labels, 5);
//!
//! let mut buffer = String::new();
//! registry.encode(&mut buffer, Format::Prometheus)?;
//! assert!(buffer.contains(
//!     "cloudflare_zone_requests_total{zone=\"example.com\",account=\"Acme\"} 100"
//! ));
//! assert!(!buffer.contains("cloudflare_zone_uniques_total"));
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```

// Linter settings.
#![warn(missing_debug_implementations, missing_docs, bare_trait_objects)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

pub use crate::{
    catalog::{DeniedMetrics, MetricKind, MetricName, UnknownMetricError},
    family::{CounterFamily, F64Gauge, Family, GaugeFamily},
    format::Format,
    metrics::CloudflareMetrics,
    registry::Registry,
};

mod catalog;
mod family;
mod format;
#[allow(missing_docs)]
pub mod labels;
mod metrics;
mod registry;
mod validation;
