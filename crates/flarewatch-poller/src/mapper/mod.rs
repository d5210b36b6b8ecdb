//! Projection of analytics responses onto metric families.

use flarewatch::{labels::*, CloudflareMetrics};

use std::{collections::HashMap, sync::Arc};

use self::regions::Region;
use crate::{
    fetch::responses::{
        ColocationZone, HttpGroup, LoadBalancerZone, LogpushAccount, LogpushGroup, LogpushZone,
        StatusCountryHostGroup, WorkersAccount, ZoneAdaptive, ZoneTotals,
    },
    resources::{Account, ZoneIndex},
    rules::RuleDescriptions,
};

mod regions;
#[cfg(test)]
mod tests;

/// Converts an account name to the label used for worker metrics: lower-cased, with spaces replaced by `-`.
pub fn worker_account_label(account_name: &str) -> String {
    account_name.to_lowercase().replace(' ', "-")
}

/// Maps analytics responses to metric updates.
///
/// Resources are correlated by ID only; a zone ID missing from the [`ZoneIndex`] produces empty
/// `zone` / `account` labels. Absent sub-collections produce no updates.
#[derive(Debug, Clone)]
pub struct MetricMapper {
    metrics: CloudflareMetrics,
    zones: Arc<ZoneIndex>,
}

impl MetricMapper {
    /// Creates a mapper updating the provided metrics.
    pub fn new(metrics: CloudflareMetrics, zones: Arc<ZoneIndex>) -> Self {
        Self { metrics, zones }
    }

    fn zone_labels(&self, zone_tag: &str) -> ZoneLabels {
        let (zone, account) = self.zones.resolve(zone_tag);
        ZoneLabels {
            zone: zone.to_owned(),
            account: account.to_owned(),
        }
    }

    /// Applies 1-minute HTTP request totals.
    pub fn apply_zone_totals(&self, zones: &[ZoneTotals]) {
        for zone in zones {
            let labels = self.zone_labels(&zone.zone_tag);
            for group in &zone.http_groups {
                self.apply_http_group(&labels, group);
            }
        }
    }

    fn apply_http_group(&self, labels: &ZoneLabels, group: &HttpGroup) {
        let metrics = &self.metrics;
        let sum = &group.sum;

        metrics.zone_requests_total.add(labels, sum.requests);
        metrics.zone_requests_cached.add(labels, sum.cached_requests);
        metrics.zone_requests_ssl_encrypted.add(labels, sum.encrypted_requests);
        metrics.zone_bandwidth_total.add(labels, sum.bytes);
        metrics.zone_bandwidth_cached.add(labels, sum.cached_bytes);
        metrics.zone_bandwidth_ssl_encrypted.add(labels, sum.encrypted_bytes);
        metrics.zone_threats_total.add(labels, sum.threats);
        metrics.zone_pageviews_total.add(labels, sum.page_views);
        metrics.zone_uniques_total.add(labels, group.uniq.uniques);

        for entry in &sum.content_type_map {
            let content_type_labels = ContentTypeLabels {
                zone: labels.zone.clone(),
                account: labels.account.clone(),
                content_type: entry.edge_response_content_type_name.clone(),
            };
            metrics
                .zone_requests_content_type
                .add(&content_type_labels, entry.requests);
            metrics
                .zone_bandwidth_content_type
                .add(&content_type_labels, entry.bytes);
        }

        for entry in &sum.country_map {
            let country = &entry.client_country_name;
            let country_labels = CountryLabels {
                zone: labels.zone.clone(),
                account: labels.account.clone(),
                country: country.clone(),
                region: Region::of_country(country).to_string(),
            };
            metrics.zone_requests_country.add(&country_labels, entry.requests);
            metrics.zone_bandwidth_country.add(&country_labels, entry.bytes);
            metrics.zone_threats_country.add(&country_labels, entry.threats);
        }

        for entry in &sum.response_status_map {
            let status_labels = StatusLabels {
                zone: labels.zone.clone(),
                account: labels.account.clone(),
                status: entry.edge_response_status.to_string(),
            };
            metrics.zone_requests_status.add(&status_labels, entry.requests);
        }

        for entry in &sum.browser_map {
            let browser_labels = BrowserLabels {
                zone: labels.zone.clone(),
                account: labels.account.clone(),
                family: entry.ua_browser_family.clone(),
            };
            metrics
                .zone_requests_browser_map
                .add(&browser_labels, entry.page_views);
        }

        for entry in &sum.threat_pathing_map {
            let threat_labels = ThreatTypeLabels {
                zone: labels.zone.clone(),
                account: labels.account.clone(),
                r#type: entry.threat_pathing_name.clone(),
            };
            metrics.zone_threats_type.add(&threat_labels, entry.requests);
        }
    }

    /// Applies firewall events, health check events and HTTP status breakdowns. Firewall rule IDs
    /// are resolved using `rules` keyed by zone ID; unresolved IDs are used as is.
    pub fn apply_zone_adaptive(
        &self,
        zones: &[ZoneAdaptive],
        rules: &HashMap<String, RuleDescriptions>,
    ) {
        let no_rules = RuleDescriptions::default();
        for zone in zones {
            let labels = self.zone_labels(&zone.zone_tag);
            let rules = rules.get(&zone.zone_tag).unwrap_or(&no_rules);

            for group in &zone.firewall_events_adaptive_groups {
                let dimensions = &group.dimensions;
                let firewall_labels = FirewallLabels {
                    zone: labels.zone.clone(),
                    account: labels.account.clone(),
                    action: dimensions.action.clone(),
                    source: dimensions.source.clone(),
                    rule: rules.describe(&dimensions.rule_id),
                    host: dimensions.host.clone(),
                    country: dimensions.client_country_name.clone(),
                };
                self.metrics.firewall_events.add(&firewall_labels, group.count);
            }

            for group in &zone.health_check_events_adaptive_groups {
                let dimensions = &group.dimensions;
                let health_labels = HealthCheckLabels {
                    zone: labels.zone.clone(),
                    account: labels.account.clone(),
                    health_status: dimensions.health_status.clone(),
                    origin_ip: dimensions.origin_ip.clone(),
                    region: dimensions.region.clone(),
                    fqdn: dimensions.fqdn.clone(),
                };
                self.metrics
                    .health_check_events
                    .add(&health_labels, group.count);
            }

            for group in &zone.origin_status_groups {
                let status = group.dimensions.origin_response_status;
                let status_labels = Self::status_country_host_labels(&labels, status, group);
                self.metrics
                    .zone_requests_origin_status_country_host
                    .add(&status_labels, group.count);
            }
            for group in &zone.edge_status_groups {
                let status = group.dimensions.edge_response_status;
                let status_labels = Self::status_country_host_labels(&labels, status, group);
                self.metrics
                    .zone_requests_status_country_host
                    .add(&status_labels, group.count);
            }
        }
    }

    fn status_country_host_labels(
        labels: &ZoneLabels,
        status: u16,
        group: &StatusCountryHostGroup,
    ) -> StatusCountryHostLabels {
        StatusCountryHostLabels {
            zone: labels.zone.clone(),
            account: labels.account.clone(),
            status: status.to_string(),
            country: group.dimensions.client_country_name.clone(),
            host: group.dimensions.host.clone(),
        }
    }

    /// Applies request stats per colocation.
    pub fn apply_colocation(&self, zones: &[ColocationZone]) {
        for zone in zones {
            let labels = self.zone_labels(&zone.zone_tag);
            for group in &zone.colo_groups {
                let colo_labels = ColocationLabels {
                    zone: labels.zone.clone(),
                    account: labels.account.clone(),
                    colocation: group.dimensions.colo_code.clone(),
                    host: group.dimensions.host.clone(),
                };
                self.metrics.colocation_visits.add(&colo_labels, group.sum.visits);
                self.metrics
                    .colocation_edge_response_bytes
                    .add(&colo_labels, group.sum.edge_response_bytes);
                self.metrics
                    .colocation_requests_total
                    .add(&colo_labels, group.count);
            }
        }
    }

    /// Applies load balancer pool request counts (counters) and pool health (gauges).
    pub fn apply_load_balancers(&self, zones: &[LoadBalancerZone]) {
        for zone in zones {
            let labels = self.zone_labels(&zone.zone_tag);

            for sample in &zone.load_balancing_requests_adaptive {
                for pool in &sample.pools {
                    let pool_labels = PoolLabels {
                        zone: labels.zone.clone(),
                        account: labels.account.clone(),
                        load_balancer_name: sample.lb_name.clone(),
                        pool_name: pool.pool_name.clone(),
                    };
                    self.metrics
                        .pool_health_status
                        .set(&pool_labels, pool.healthy.as_f64());
                }
            }

            for group in &zone.load_balancing_requests_adaptive_groups {
                let dimensions = &group.dimensions;
                let pool_labels = PoolOriginLabels {
                    zone: labels.zone.clone(),
                    account: labels.account.clone(),
                    load_balancer_name: dimensions.lb_name.clone(),
                    pool_name: dimensions.selected_pool_name.clone(),
                    origin_name: dimensions.selected_origin_name.clone(),
                };
                self.metrics.pool_requests_total.add(&pool_labels, group.count);
            }
        }
    }

    /// Applies failed logpush jobs for zones.
    pub fn apply_logpush_zones(&self, zones: &[LogpushZone]) {
        for zone in zones {
            let labels = self.zone_labels(&zone.zone_tag);
            for group in &zone.logpush_health_adaptive_groups {
                let dimensions = &group.dimensions;
                let logpush_labels = LogpushZoneLabels {
                    zone: labels.zone.clone(),
                    account: labels.account.clone(),
                    destination: dimensions.destination_type.clone(),
                    job_id: dimensions.job_id.to_string(),
                    r#final: dimensions.is_final.to_string(),
                };
                self.metrics
                    .logpush_failed_jobs_zone
                    .add(&logpush_labels, group.count);
            }
        }
    }

    /// Applies failed logpush jobs for an account. The account is labelled by its ID.
    pub fn apply_logpush_account(&self, account: &Account, results: &[LogpushAccount]) {
        let groups = results
            .iter()
            .flat_map(|result| &result.logpush_health_adaptive_groups);
        for group in groups {
            let LogpushGroup { count, dimensions } = group;
            let logpush_labels = LogpushAccountLabels {
                account: account.id.clone(),
                destination: dimensions.destination_type.clone(),
                job_id: dimensions.job_id.to_string(),
                r#final: dimensions.is_final.to_string(),
            };
            self.metrics
                .logpush_failed_jobs_account
                .add(&logpush_labels, *count);
        }
    }

    /// Applies worker invocation stats for an account. Request and error counts are counters;
    /// CPU time and duration quantiles are gauges.
    pub fn apply_workers(&self, account: &Account, results: &[WorkersAccount]) {
        let account_label = worker_account_label(&account.name);
        let groups = results
            .iter()
            .flat_map(|result| &result.workers_invocations_adaptive);
        for group in groups {
            let worker_labels = WorkerLabels {
                script_name: group.dimensions.script_name.clone(),
                account: account_label.clone(),
            };
            self.metrics.worker_requests.add(&worker_labels, group.sum.requests);
            self.metrics.worker_errors.add(&worker_labels, group.sum.errors);

            let q = &group.quantiles;
            let quantiles = [
                ("P50", q.cpu_time_p50, q.duration_p50),
                ("P75", q.cpu_time_p75, q.duration_p75),
                ("P99", q.cpu_time_p99, q.duration_p99),
                ("P999", q.cpu_time_p999, q.duration_p999),
            ];
            for (quantile, cpu_time, duration) in quantiles {
                let quantile_labels = WorkerQuantileLabels {
                    script_name: worker_labels.script_name.clone(),
                    account: account_label.clone(),
                    quantile: quantile.to_owned(),
                };
                self.metrics.worker_cpu_time.set(&quantile_labels, cpu_time);
                self.metrics.worker_duration.set(&quantile_labels, duration);
            }
        }
    }
}
