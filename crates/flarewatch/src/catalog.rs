//! Closed catalog of metric names exported by the crate, and the deny-list built on top of it.

use std::{collections::HashSet, fmt, str::FromStr};

use crate::validation::assert_metric_name;

/// Type of a metric in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// Monotonically increasing value; each polling cycle adds the delta observed in its window.
    Counter,
    /// Point-in-time value overwritten by each polling cycle.
    Gauge,
}

macro_rules! metric_catalog {
    ($($variant:ident => ($name:literal, $kind:ident, $help:literal),)+) => {
        /// Name of a metric known to the exporter.
        ///
        /// This is a closed set; deny-list entries are validated against it at startup.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum MetricName {
            $(
                #[doc = $help]
                $variant,
            )+
        }

        impl MetricName {
            /// All metric names in the catalog.
            pub const ALL: &'static [Self] = &[$(Self::$variant,)+];

            /// Returns the full metric name as exposed to scrapers.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }

            /// Returns the help text for the metric.
            pub const fn help(self) -> &'static str {
                match self {
                    $(Self::$variant => $help,)+
                }
            }

            /// Returns the metric type.
            pub const fn kind(self) -> MetricKind {
                match self {
                    $(Self::$variant => MetricKind::$kind,)+
                }
            }
        }

        const _: () = {
            $(assert_metric_name($name);)+
        };
    };
}

metric_catalog! {
    ZoneRequestsTotal => ("cloudflare_zone_requests_total", Counter, "Number of requests for zone"),
    ZoneRequestsCached => ("cloudflare_zone_requests_cached", Counter, "Number of cached requests for zone"),
    ZoneRequestsSslEncrypted => ("cloudflare_zone_requests_ssl_encrypted", Counter, "Number of encrypted requests for zone"),
    ZoneRequestsContentType => ("cloudflare_zone_requests_content_type", Counter, "Number of request for zone per content type"),
    ZoneRequestsCountry => ("cloudflare_zone_requests_country", Counter, "Number of request for zone per country"),
    ZoneRequestsStatus => ("cloudflare_zone_requests_status", Counter, "Number of request for zone per HTTP status"),
    ZoneRequestsBrowserMap => ("cloudflare_zone_requests_browser_map_page_views_count", Counter, "Number of successful requests for HTML pages per zone"),
    ZoneRequestsOriginStatusCountryHost => ("cloudflare_zone_requests_origin_status_country_host", Counter, "Count of not cached requests for zone per origin HTTP status per country per host"),
    ZoneRequestsStatusCountryHost => ("cloudflare_zone_requests_status_country_host", Counter, "Count of requests for zone per edge HTTP status per country per host"),
    ZoneBandwidthTotal => ("cloudflare_zone_bandwidth_total", Counter, "Total bandwidth per zone in bytes"),
    ZoneBandwidthCached => ("cloudflare_zone_bandwidth_cached", Counter, "Cached bandwidth per zone in bytes"),
    ZoneBandwidthSslEncrypted => ("cloudflare_zone_bandwidth_ssl_encrypted", Counter, "Encrypted bandwidth per zone in bytes"),
    ZoneBandwidthContentType => ("cloudflare_zone_bandwidth_content_type", Counter, "Bandwidth per zone per content type"),
    ZoneBandwidthCountry => ("cloudflare_zone_bandwidth_country", Counter, "Bandwidth per country per zone"),
    ZoneThreatsTotal => ("cloudflare_zone_threats_total", Counter, "Threats per zone"),
    ZoneThreatsCountry => ("cloudflare_zone_threats_country", Counter, "Threats per zone per country"),
    ZoneThreatsType => ("cloudflare_zone_threats_type", Counter, "Threats per zone per type"),
    ZonePageviewsTotal => ("cloudflare_zone_pageviews_total", Counter, "Pageviews per zone"),
    ZoneUniquesTotal => ("cloudflare_zone_uniques_total", Counter, "Uniques per zone"),
    ZoneColocationVisits => ("cloudflare_zone_colocation_visits", Counter, "Total visits per colocation"),
    ZoneColocationEdgeResponseBytes => ("cloudflare_zone_colocation_edge_response_bytes", Counter, "Edge response bytes per colocation"),
    ZoneColocationRequestsTotal => ("cloudflare_zone_colocation_requests_total", Counter, "Total requests per colocation"),
    ZoneFirewallEventsCount => ("cloudflare_zone_firewall_events_count", Counter, "Count of Firewall events"),
    ZoneHealthCheckEventsOriginCount => ("cloudflare_zone_health_check_events_origin_count", Counter, "Number of Heath check events per region per origin"),
    WorkerRequests => ("cloudflare_worker_requests_count", Counter, "Number of requests sent to worker by script name"),
    WorkerErrors => ("cloudflare_worker_errors_count", Counter, "Number of errors by script name"),
    WorkerCpuTime => ("cloudflare_worker_cpu_time", Gauge, "CPU time quantiles by script name"),
    WorkerDuration => ("cloudflare_worker_duration", Gauge, "Duration quantiles by script name (GB*s)"),
    PoolHealthStatus => ("cloudflare_zone_pool_health_status", Gauge, "Reports the health of a pool, 1 for healthy, 0 for unhealthy"),
    PoolRequestsTotal => ("cloudflare_zone_pool_requests_total", Counter, "Requests per pool"),
    LogpushFailedJobsAccount => ("cloudflare_logpush_failed_jobs_account_count", Counter, "Number of failed logpush jobs on the account level"),
    LogpushFailedJobsZone => ("cloudflare_logpush_failed_jobs_zone_count", Counter, "Number of failed logpush jobs on the zone level"),
}

impl fmt::Display for MetricName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Error returned when a metric name is not present in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("metric `{name}` doesn't exist")]
pub struct UnknownMetricError {
    name: String,
}

impl UnknownMetricError {
    /// Returns the offending name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for MetricName {
    type Err = UnknownMetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| UnknownMetricError { name: s.to_owned() })
    }
}

/// Set of metrics that must never be registered (and thus never exposed).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeniedMetrics(HashSet<MetricName>);

impl DeniedMetrics {
    /// Parses the deny-list from raw metric names. Surrounding whitespace is ignored, as are empty entries
    /// (e.g., produced by a trailing comma).
    ///
    /// # Errors
    ///
    /// Returns an error for the first name that is not in the catalog.
    pub fn parse<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<Self, UnknownMetricError> {
        names
            .into_iter()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::parse)
            .collect()
    }

    /// Checks whether the specified metric is denied.
    pub fn contains(&self, name: MetricName) -> bool {
        self.0.contains(&name)
    }

    /// Returns the number of denied metrics.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Checks whether the deny-list is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over denied metrics in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = MetricName> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<MetricName> for DeniedMetrics {
    fn from_iter<I: IntoIterator<Item = MetricName>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
