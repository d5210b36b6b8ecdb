//! Typed GraphQL responses.
//!
//! Every sub-collection is optional upstream. A missing or `null` collection is decoded as an empty one,
//! so that mapping code only needs to iterate.

use serde::{Deserialize, Deserializer};

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `data` of a query over zones.
#[derive(Debug, Deserialize)]
pub struct ZonesData<T> {
    /// Viewer.
    pub viewer: ZonesViewer<T>,
}

/// Viewer of a query over zones.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ZonesViewer<T> {
    /// Per-zone results.
    #[serde(default = "Vec::new", deserialize_with = "nullable")]
    pub zones: Vec<T>,
}

/// `data` of a query over an account.
#[derive(Debug, Deserialize)]
pub struct AccountsData<T> {
    /// Viewer.
    pub viewer: AccountsViewer<T>,
}

/// Viewer of a query over an account.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct AccountsViewer<T> {
    /// Per-account results.
    #[serde(default = "Vec::new", deserialize_with = "nullable")]
    pub accounts: Vec<T>,
}

// ---------- ZoneTotals ----------

/// Per-zone result of the `ZoneTotals` query.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ZoneTotals {
    pub zone_tag: String,
    #[serde(rename = "httpRequests1mGroups", deserialize_with = "nullable")]
    pub http_groups: Vec<HttpGroup>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HttpGroup {
    pub uniq: Uniques,
    pub sum: HttpSum,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Uniques {
    pub uniques: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpSum {
    #[serde(deserialize_with = "nullable")]
    pub browser_map: Vec<BrowserEntry>,
    pub bytes: u64,
    pub cached_bytes: u64,
    pub cached_requests: u64,
    #[serde(deserialize_with = "nullable")]
    pub content_type_map: Vec<ContentTypeEntry>,
    #[serde(deserialize_with = "nullable")]
    pub country_map: Vec<CountryEntry>,
    pub encrypted_bytes: u64,
    pub encrypted_requests: u64,
    pub page_views: u64,
    pub requests: u64,
    #[serde(deserialize_with = "nullable")]
    pub response_status_map: Vec<StatusEntry>,
    #[serde(deserialize_with = "nullable")]
    pub threat_pathing_map: Vec<ThreatPathingEntry>,
    pub threats: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BrowserEntry {
    pub page_views: u64,
    pub ua_browser_family: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContentTypeEntry {
    pub bytes: u64,
    pub requests: u64,
    pub edge_response_content_type_name: String,
}

/// Country breakdown entry. Despite its name, `clientCountryName` holds an ISO 3166-1 alpha-2 code.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CountryEntry {
    pub bytes: u64,
    pub client_country_name: String,
    pub requests: u64,
    pub threats: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatusEntry {
    pub edge_response_status: u16,
    pub requests: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThreatPathingEntry {
    pub requests: u64,
    pub threat_pathing_name: String,
}

// ---------- ZoneAdaptive ----------

/// Per-zone result of the `ZoneAdaptive` query.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ZoneAdaptive {
    pub zone_tag: String,
    #[serde(deserialize_with = "nullable")]
    pub firewall_events_adaptive_groups: Vec<FirewallGroup>,
    #[serde(deserialize_with = "nullable")]
    pub health_check_events_adaptive_groups: Vec<HealthCheckGroup>,
    /// Requests not served from cache, grouped by origin status.
    #[serde(rename = "httpRequestsAdaptiveGroups", deserialize_with = "nullable")]
    pub origin_status_groups: Vec<StatusCountryHostGroup>,
    /// All requests, grouped by edge status.
    #[serde(rename = "httpRequestsEdgeCountryHost", deserialize_with = "nullable")]
    pub edge_status_groups: Vec<StatusCountryHostGroup>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FirewallGroup {
    pub count: u64,
    pub dimensions: FirewallDimensions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FirewallDimensions {
    pub action: String,
    pub source: String,
    pub rule_id: String,
    #[serde(rename = "clientRequestHTTPHost")]
    pub host: String,
    pub client_country_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HealthCheckGroup {
    pub count: u64,
    pub dimensions: HealthCheckDimensions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HealthCheckDimensions {
    pub health_status: String,
    #[serde(rename = "originIP")]
    pub origin_ip: String,
    pub region: String,
    pub fqdn: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StatusCountryHostGroup {
    pub count: u64,
    pub dimensions: StatusCountryHostDimensions,
}

/// Dimensions of HTTP adaptive groups. Depending on the query, either the origin or the edge status is set.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatusCountryHostDimensions {
    pub origin_response_status: u16,
    pub edge_response_status: u16,
    pub client_country_name: String,
    #[serde(rename = "clientRequestHTTPHost")]
    pub host: String,
}

// ---------- Colocation ----------

/// Per-zone result of the `Colocation` query.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColocationZone {
    pub zone_tag: String,
    #[serde(deserialize_with = "nullable")]
    pub colo_groups: Vec<ColocationGroup>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ColocationGroup {
    pub count: u64,
    pub dimensions: ColocationDimensions,
    pub sum: ColocationSum,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColocationDimensions {
    pub colo_code: String,
    #[serde(rename = "clientRequestHTTPHost")]
    pub host: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColocationSum {
    pub edge_response_bytes: u64,
    pub visits: u64,
}

// ---------- LoadBalancer ----------

/// Per-zone result of the `LoadBalancer` query.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoadBalancerZone {
    pub zone_tag: String,
    #[serde(deserialize_with = "nullable")]
    pub load_balancing_requests_adaptive_groups: Vec<PoolRequestsGroup>,
    #[serde(deserialize_with = "nullable")]
    pub load_balancing_requests_adaptive: Vec<LoadBalancerSample>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PoolRequestsGroup {
    pub count: u64,
    pub dimensions: PoolRequestsDimensions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PoolRequestsDimensions {
    pub lb_name: String,
    pub selected_pool_name: String,
    pub selected_origin_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoadBalancerSample {
    pub lb_name: String,
    #[serde(deserialize_with = "nullable")]
    pub pools: Vec<PoolSample>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PoolSample {
    pub pool_name: String,
    pub healthy: PoolHealth,
}

/// Pool health; reported either as a number or as a boolean.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PoolHealth {
    /// Numeric health.
    Value(f64),
    /// Boolean health.
    Flag(bool),
}

impl Default for PoolHealth {
    fn default() -> Self {
        Self::Value(0.0)
    }
}

impl PoolHealth {
    /// Converts health to a gauge value.
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Value(value) => value,
            Self::Flag(flag) => f64::from(u8::from(flag)),
        }
    }
}

// ---------- Workers ----------

/// Per-account result of the `Workers` query.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkersAccount {
    #[serde(deserialize_with = "nullable")]
    pub workers_invocations_adaptive: Vec<WorkerGroup>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WorkerGroup {
    pub dimensions: WorkerDimensions,
    pub sum: WorkerSum,
    pub quantiles: WorkerQuantiles,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkerDimensions {
    pub script_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WorkerSum {
    pub requests: u64,
    pub errors: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkerQuantiles {
    pub cpu_time_p50: f64,
    pub cpu_time_p75: f64,
    pub cpu_time_p99: f64,
    pub cpu_time_p999: f64,
    pub duration_p50: f64,
    pub duration_p75: f64,
    pub duration_p99: f64,
    pub duration_p999: f64,
}

// ---------- Logpush ----------

/// Per-account result of the `LogpushAccount` query.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LogpushAccount {
    #[serde(deserialize_with = "nullable")]
    pub logpush_health_adaptive_groups: Vec<LogpushGroup>,
}

/// Per-zone result of the `LogpushZone` query.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LogpushZone {
    pub zone_tag: String,
    #[serde(deserialize_with = "nullable")]
    pub logpush_health_adaptive_groups: Vec<LogpushGroup>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LogpushGroup {
    pub count: u64,
    pub dimensions: LogpushDimensions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LogpushDimensions {
    pub destination_type: String,
    pub job_id: u64,
    #[serde(rename = "final")]
    pub is_final: u64,
}
