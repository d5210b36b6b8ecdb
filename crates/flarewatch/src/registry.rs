//! Wrapper around metrics registry.

use prometheus_client::{
    encoding::text,
    registry::{Metric, Registry as RegistryInner},
};

use std::fmt;

use crate::{
    catalog::MetricName,
    format::{Format, PrometheusWrapper},
    metrics::CloudflareMetrics,
};

/// Metrics registry. Only metrics in the catalog can be registered.
#[derive(Debug)]
pub struct Registry {
    inner: RegistryInner,
    registered: Vec<MetricName>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn empty() -> Self {
        Self {
            inner: RegistryInner::default(),
            registered: vec![],
        }
    }

    /// Creates a registry with all enabled families from `metrics`.
    pub fn new(metrics: &CloudflareMetrics) -> Self {
        let mut this = Self::empty();
        metrics.register(&mut this);
        this
    }

    /// Registers a metric or a family of metrics under the catalog `name`.
    ///
    /// # Panics
    ///
    /// Panics if a metric with the same name is already registered.
    pub fn register(&mut self, name: MetricName, metric: impl Metric) {
        assert!(
            !self.registered.contains(&name),
            "metric `{name}` is registered twice"
        );
        self.registered.push(name);
        self.inner.register(name.as_str(), name.help(), metric);
    }

    /// Returns names of registered metrics in the registration order.
    pub fn registered_names(&self) -> &[MetricName] {
        &self.registered
    }

    /// Encodes all metrics in this registry to the specified text `format`.
    ///
    /// # Errors
    ///
    /// Proxies formatting errors of the provided `writer`.
    pub fn encode<W: fmt::Write>(&self, writer: &mut W, format: Format) -> fmt::Result {
        match format {
            Format::OpenMetrics => text::encode(writer, &self.inner),
            Format::Prometheus => {
                let mut wrapper = PrometheusWrapper::new(writer);
                text::encode(&mut wrapper, &self.inner)?;
                wrapper.flush()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog::DeniedMetrics, labels::WorkerQuantileLabels};

    #[test]
    fn denied_metrics_are_not_registered() {
        let denied = DeniedMetrics::parse(["cloudflare_worker_cpu_time"]).unwrap();
        let metrics = CloudflareMetrics::new(&denied);
        let registry = Registry::new(&metrics);

        assert_eq!(registry.registered_names().len(), MetricName::ALL.len() - 1);
        assert!(!registry
            .registered_names()
            .contains(&MetricName::WorkerCpuTime));

        let labels = WorkerQuantileLabels {
            script_name: "worker".to_owned(),
            account: "acme".to_owned(),
            quantile: "P50".to_owned(),
        };
        metrics.worker_cpu_time.set(&labels, 1.5);
        metrics.worker_duration.set(&labels, 0.25);

        let mut buffer = String::new();
        registry.encode(&mut buffer, Format::Prometheus).unwrap();
        assert!(!buffer.contains("cloudflare_worker_cpu_time"), "{buffer}");
        assert!(
            buffer.contains(
                "cloudflare_worker_duration{script_name=\"worker\",account=\"acme\",quantile=\"P50\"} 0.25"
            ),
            "{buffer}"
        );
    }

    #[test]
    fn empty_registry_encodes_nothing_in_prometheus_format() {
        let registry = Registry::empty();
        let mut buffer = String::new();
        registry.encode(&mut buffer, Format::Prometheus).unwrap();
        assert!(buffer.is_empty(), "{buffer}");
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn registering_metric_twice_panics() {
        let metrics = CloudflareMetrics::default();
        let mut registry = Registry::new(&metrics);
        registry.register(
            MetricName::ZoneRequestsTotal,
            metrics.zone_requests_total.clone(),
        );
    }
}
