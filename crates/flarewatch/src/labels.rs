//! Label sets used by metric families.
//!
//! Label names are taken verbatim from field names; `r#type` and `r#final` are encoded as `type` and `final`.

use prometheus_client::encoding::EncodeLabelSet;

/// Labels identifying a zone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EncodeLabelSet)]
pub struct ZoneLabels {
    pub zone: String,
    pub account: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, EncodeLabelSet)]
pub struct ContentTypeLabels {
    pub zone: String,
    pub account: String,
    pub content_type: String,
}

/// Per-country labels. `region` is derived from the country code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EncodeLabelSet)]
pub struct CountryLabels {
    pub zone: String,
    pub account: String,
    pub country: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, EncodeLabelSet)]
pub struct StatusLabels {
    pub zone: String,
    pub account: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, EncodeLabelSet)]
pub struct BrowserLabels {
    pub zone: String,
    pub account: String,
    pub family: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, EncodeLabelSet)]
pub struct ThreatTypeLabels {
    pub zone: String,
    pub account: String,
    pub r#type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, EncodeLabelSet)]
pub struct StatusCountryHostLabels {
    pub zone: String,
    pub account: String,
    pub status: String,
    pub country: String,
    pub host: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, EncodeLabelSet)]
pub struct ColocationLabels {
    pub zone: String,
    pub account: String,
    pub colocation: String,
    pub host: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, EncodeLabelSet)]
pub struct FirewallLabels {
    pub zone: String,
    pub account: String,
    pub action: String,
    pub source: String,
    /// Normalized rule description, or the raw rule ID if no description is known.
    pub rule: String,
    pub host: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, EncodeLabelSet)]
pub struct HealthCheckLabels {
    pub zone: String,
    pub account: String,
    pub health_status: String,
    pub origin_ip: String,
    pub region: String,
    pub fqdn: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, EncodeLabelSet)]
pub struct WorkerLabels {
    pub script_name: String,
    pub account: String,
}

/// Worker labels with a quantile (one of `P50`, `P75`, `P99` or `P999`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, EncodeLabelSet)]
pub struct WorkerQuantileLabels {
    pub script_name: String,
    pub account: String,
    pub quantile: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, EncodeLabelSet)]
pub struct PoolLabels {
    pub zone: String,
    pub account: String,
    pub load_balancer_name: String,
    pub pool_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, EncodeLabelSet)]
pub struct PoolOriginLabels {
    pub zone: String,
    pub account: String,
    pub load_balancer_name: String,
    pub pool_name: String,
    pub origin_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, EncodeLabelSet)]
pub struct LogpushAccountLabels {
    pub account: String,
    pub destination: String,
    pub job_id: String,
    pub r#final: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, EncodeLabelSet)]
pub struct LogpushZoneLabels {
    pub zone: String,
    pub account: String,
    pub destination: String,
    pub job_id: String,
    pub r#final: String,
}
