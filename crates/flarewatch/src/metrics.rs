//! Metric families for all metrics in the catalog.

use crate::{
    catalog::{DeniedMetrics, MetricName},
    family::{CounterFamily, GaugeFamily},
    labels::*,
    registry::Registry,
};

macro_rules! cloudflare_metrics {
    ($($field:ident: $family:ident<$labels:ty> => $name:ident,)+) => {
        /// Metric families updated by the poller and read by the exporter.
        ///
        /// Cloning is cheap; clones share the underlying families.
        #[derive(Debug, Clone)]
        pub struct CloudflareMetrics {
            $(
                #[doc = concat!("Family for [`MetricName::", stringify!($name), "`].")]
                pub $field: $family<$labels>,
            )+
        }

        impl CloudflareMetrics {
            /// Creates families for all metrics. Families for denied metrics are disabled; they ignore updates
            /// and are skipped by [`Self::register()`].
            pub fn new(denied: &DeniedMetrics) -> Self {
                Self {
                    $($field: $family::new(!denied.contains(MetricName::$name)),)+
                }
            }

            /// Registers all enabled families in the provided `registry`.
            pub fn register(&self, registry: &mut Registry) {
                $(
                    if self.$field.is_enabled() {
                        registry.register(MetricName::$name, self.$field.clone());
                    }
                )+
            }

            /// Returns names of the registered (i.e., not denied) metrics.
            pub fn enabled_names(&self) -> Vec<MetricName> {
                let mut names = vec![];
                $(
                    if self.$field.is_enabled() {
                        names.push(MetricName::$name);
                    }
                )+
                names
            }
        }
    };
}

cloudflare_metrics! {
    zone_requests_total: CounterFamily<ZoneLabels> => ZoneRequestsTotal,
    zone_requests_cached: CounterFamily<ZoneLabels> => ZoneRequestsCached,
    zone_requests_ssl_encrypted: CounterFamily<ZoneLabels> => ZoneRequestsSslEncrypted,
    zone_requests_content_type: CounterFamily<ContentTypeLabels> => ZoneRequestsContentType,
    zone_requests_country: CounterFamily<CountryLabels> => ZoneRequestsCountry,
    zone_requests_status: CounterFamily<StatusLabels> => ZoneRequestsStatus,
    zone_requests_browser_map: CounterFamily<BrowserLabels> => ZoneRequestsBrowserMap,
    zone_requests_origin_status_country_host: CounterFamily<StatusCountryHostLabels> => ZoneRequestsOriginStatusCountryHost,
    zone_requests_status_country_host: CounterFamily<StatusCountryHostLabels> => ZoneRequestsStatusCountryHost,
    zone_bandwidth_total: CounterFamily<ZoneLabels> => ZoneBandwidthTotal,
    zone_bandwidth_cached: CounterFamily<ZoneLabels> => ZoneBandwidthCached,
    zone_bandwidth_ssl_encrypted: CounterFamily<ZoneLabels> => ZoneBandwidthSslEncrypted,
    zone_bandwidth_content_type: CounterFamily<ContentTypeLabels> => ZoneBandwidthContentType,
    zone_bandwidth_country: CounterFamily<CountryLabels> => ZoneBandwidthCountry,
    zone_threats_total: CounterFamily<ZoneLabels> => ZoneThreatsTotal,
    zone_threats_country: CounterFamily<CountryLabels> => ZoneThreatsCountry,
    zone_threats_type: CounterFamily<ThreatTypeLabels> => ZoneThreatsType,
    zone_pageviews_total: CounterFamily<ZoneLabels> => ZonePageviewsTotal,
    zone_uniques_total: CounterFamily<ZoneLabels> => ZoneUniquesTotal,
    colocation_visits: CounterFamily<ColocationLabels> => ZoneColocationVisits,
    colocation_edge_response_bytes: CounterFamily<ColocationLabels> => ZoneColocationEdgeResponseBytes,
    colocation_requests_total: CounterFamily<ColocationLabels> => ZoneColocationRequestsTotal,
    firewall_events: CounterFamily<FirewallLabels> => ZoneFirewallEventsCount,
    health_check_events: CounterFamily<HealthCheckLabels> => ZoneHealthCheckEventsOriginCount,
    worker_requests: CounterFamily<WorkerLabels> => WorkerRequests,
    worker_errors: CounterFamily<WorkerLabels> => WorkerErrors,
    worker_cpu_time: GaugeFamily<WorkerQuantileLabels> => WorkerCpuTime,
    worker_duration: GaugeFamily<WorkerQuantileLabels> => WorkerDuration,
    pool_health_status: GaugeFamily<PoolLabels> => PoolHealthStatus,
    pool_requests_total: CounterFamily<PoolOriginLabels> => PoolRequestsTotal,
    logpush_failed_jobs_account: CounterFamily<LogpushAccountLabels> => LogpushFailedJobsAccount,
    logpush_failed_jobs_zone: CounterFamily<LogpushZoneLabels> => LogpushFailedJobsZone,
}

impl Default for CloudflareMetrics {
    fn default() -> Self {
        Self::new(&DeniedMetrics::default())
    }
}
