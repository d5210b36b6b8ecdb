//! Support for metrics encoding formats.

use std::{fmt, mem};

/// Metrics export format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Format {
    /// [OpenMetrics text format][om], as produced by [`prometheus-client`].
    ///
    /// In this format, counter samples get an additional `_total` suffix, so e.g. `cloudflare_zone_requests_total`
    /// is reported as `cloudflare_zone_requests_total_total`.
    ///
    /// [om]: https://github.com/OpenObservability/OpenMetrics/blob/main/specification/OpenMetrics.md
    /// [`prometheus-client`]: https://docs.rs/prometheus-client/
    OpenMetrics,
    /// [Prometheus text format][prom]. It's obtained by a streaming transform of OpenMetrics-encoded metrics
    /// that removes `_total` suffixes appended to counter samples and removes the `# EOF` terminator.
    /// As a result, sample names match catalog names verbatim.
    ///
    /// [prom]: https://prometheus.io/docs/instrumenting/exposition_formats/
    #[default]
    Prometheus,
}

impl Format {
    /// Content type for OpenMetrics text format.
    pub const OPEN_METRICS_CONTENT_TYPE: &'static str =
        "application/openmetrics-text; version=1.0.0; charset=utf-8";
    /// Content type for Prometheus text format.
    pub const PROMETHEUS_CONTENT_TYPE: &'static str = "text/plain; version=0.0.4; charset=utf-8";

    /// Returns the HTTP content type for this format.
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::OpenMetrics => Self::OPEN_METRICS_CONTENT_TYPE,
            Self::Prometheus => Self::PROMETHEUS_CONTENT_TYPE,
        }
    }
}

#[derive(Debug)]
struct MetricTypeDefinition {
    name: String,
    is_counter: bool,
}

impl MetricTypeDefinition {
    fn parse(line: &str) -> Result<Self, fmt::Error> {
        let (name, ty) = line
            .trim()
            .split_once(|ch: char| ch.is_ascii_whitespace())
            .ok_or(fmt::Error)?;
        Ok(Self {
            name: name.to_owned(),
            is_counter: ty == "counter",
        })
    }
}

#[must_use = "Must be `flush()`ed to not lose the last line"]
#[derive(Debug)]
pub(crate) struct PrometheusWrapper<'a, W> {
    writer: &'a mut W,
    last_metric_definition: Option<MetricTypeDefinition>,
    last_line: String,
}

impl<'a, W: fmt::Write> PrometheusWrapper<'a, W> {
    pub(crate) fn new(writer: &'a mut W) -> Self {
        Self {
            writer,
            last_metric_definition: None,
            last_line: String::new(),
        }
    }

    fn handle_line(&mut self) -> fmt::Result {
        let line = mem::take(&mut self.last_line);
        if line == "# EOF" {
            // Prometheus format doesn't specify the termination sequence.
            return Ok(());
        }

        let mut transformed_line = None;
        if let Some(type_def) = line.strip_prefix("# TYPE ") {
            self.last_metric_definition = Some(MetricTypeDefinition::parse(type_def)?);
        } else if !line.starts_with('#') {
            let name_end_pos = line
                .find(|ch: char| ch == '{' || ch.is_ascii_whitespace())
                .ok_or(fmt::Error)?;
            let (name, rest) = line.split_at(name_end_pos);

            if let Some(metric_type) = &self.last_metric_definition {
                let truncated_name = name.strip_suffix("_total");
                if metric_type.is_counter && truncated_name == Some(metric_type.name.as_str()) {
                    transformed_line = Some(format!("{}{rest}", metric_type.name));
                }
            }
        }

        let transformed_line = transformed_line.unwrap_or(line);
        writeln!(self.writer, "{transformed_line}")
    }

    pub(crate) fn flush(mut self) -> fmt::Result {
        if self.last_line.is_empty() {
            Ok(())
        } else {
            self.handle_line()
        }
    }
}

impl<W: fmt::Write> fmt::Write for PrometheusWrapper<'_, W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let lines: Vec<_> = s.lines().collect();
        for (i, line) in lines.iter().enumerate() {
            self.last_line.push_str(line);
            if i + 1 < lines.len() || s.ends_with('\n') {
                self.handle_line()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Write as _;

    use super::*;
    use crate::{labels::ZoneLabels, CloudflareMetrics, Registry};

    #[test]
    fn translating_fragmented_writes() {
        let mut buffer = String::new();
        let mut wrapper = PrometheusWrapper::new(&mut buffer);

        write!(wrapper, "# HELP ").unwrap();
        write!(wrapper, "cloudflare_zone_requests_total").unwrap();
        writeln!(wrapper, " Number of requests for zone.").unwrap();

        write!(wrapper, "# TYPE ").unwrap();
        write!(wrapper, "cloudflare_zone_requests_total").unwrap();
        writeln!(wrapper, " counter").unwrap();

        write!(wrapper, "cloudflare_zone_requests_total").unwrap();
        write!(wrapper, "_total").unwrap();
        write!(wrapper, "{{zone=\"").unwrap();
        write!(wrapper, "example.com").unwrap();
        write!(wrapper, "\"}} ").unwrap();
        writeln!(wrapper, "42").unwrap();

        writeln!(wrapper, "# EOF").unwrap();
        wrapper.flush().unwrap();

        let lines: Vec<_> = buffer.lines().collect();
        assert_eq!(
            lines,
            [
                "# HELP cloudflare_zone_requests_total Number of requests for zone.",
                "# TYPE cloudflare_zone_requests_total counter",
                "cloudflare_zone_requests_total{zone=\"example.com\"} 42",
            ]
        );
    }

    #[test]
    fn translating_sample() {
        let input = "\
            # TYPE cloudflare_zone_requests_cached counter\n\
            cloudflare_zone_requests_cached_total{zone=\"a\"} 1\n\
            # TYPE cloudflare_zone_pool_health_status gauge\n\
            cloudflare_zone_pool_health_status{pool_name=\"p\"} 1.0\n\
            # TYPE cloudflare_zone_uniques_total counter\n\
            cloudflare_zone_uniques_total_total{zone=\"a\"} 3\n\
            cloudflare_zone_uniques_total_total{zone=\"b\"} 5";
        let expected = "\
            # TYPE cloudflare_zone_requests_cached counter\n\
            cloudflare_zone_requests_cached{zone=\"a\"} 1\n\
            # TYPE cloudflare_zone_pool_health_status gauge\n\
            cloudflare_zone_pool_health_status{pool_name=\"p\"} 1.0\n\
            # TYPE cloudflare_zone_uniques_total counter\n\
            cloudflare_zone_uniques_total{zone=\"a\"} 3\n\
            cloudflare_zone_uniques_total{zone=\"b\"} 5\n";

        let mut buffer = String::new();
        let mut wrapper = PrometheusWrapper::new(&mut buffer);
        wrapper.write_str(input).unwrap();
        wrapper.flush().unwrap();

        assert_eq!(buffer, expected);
    }

    #[test]
    fn catalog_names_are_exposed_verbatim() {
        let metrics = CloudflareMetrics::default();
        let mut registry = Registry::empty();
        metrics.register(&mut registry);

        let labels = ZoneLabels {
            zone: "example.com".to_owned(),
            account: "Acme".to_owned(),
        };
        metrics.zone_requests_total.add(&labels, 10);
        metrics.zone_requests_cached.add(&labels, 4);

        let mut buffer = String::new();
        registry.encode(&mut buffer, Format::Prometheus).unwrap();
        let lines: Vec<_> = buffer.lines().collect();
        assert!(
            lines.contains(&"cloudflare_zone_requests_total{zone=\"example.com\",account=\"Acme\"} 10"),
            "{lines:#?}"
        );
        assert!(
            lines.contains(&"cloudflare_zone_requests_cached{zone=\"example.com\",account=\"Acme\"} 4"),
            "{lines:#?}"
        );
        assert!(!lines.contains(&"# EOF"));

        let mut buffer = String::new();
        registry.encode(&mut buffer, Format::OpenMetrics).unwrap();
        let lines: Vec<_> = buffer.lines().collect();
        assert!(
            lines.contains(
                &"cloudflare_zone_requests_total_total{zone=\"example.com\",account=\"Acme\"} 10"
            ),
            "{lines:#?}"
        );
        assert_eq!(lines.last(), Some(&"# EOF"));
    }
}
