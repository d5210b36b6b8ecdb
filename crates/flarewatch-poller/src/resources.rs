//! Monitored resources (zones and accounts) and their directory.

use serde::Deserialize;

use std::{collections::HashMap, sync::Arc};

use crate::client::{ApiError, CloudflareClient};

/// Plan ID of the free plan.
pub const FREE_PLAN_ID: &str = "0feeeeeeeeeeeeeeeeeeeeeeeeeeeeee";
const FREE_PLAN_LEGACY_ID: &str = "free";

/// Subscription tier of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Free plan; paid-only query families are never issued for such zones.
    Free,
    /// Any paid plan.
    Paid,
}

/// Account owning zones and worker scripts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Account {
    /// Opaque account ID.
    #[serde(default)]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

/// Zone (a domain managed by the provider).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    /// Opaque zone ID. This is the only field used for correlation.
    pub id: String,
    /// Display name, used only as a label value.
    pub name: String,
    /// Subscription tier.
    pub tier: Tier,
    /// Owning account.
    pub account: Account,
}

impl Zone {
    /// Checks whether this zone is on the free plan.
    pub fn is_free(&self) -> bool {
        self.tier == Tier::Free
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawPlan {
    #[serde(default)]
    id: String,
    #[serde(default)]
    legacy_id: String,
}

#[derive(Debug, Deserialize)]
struct RawZone {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    plan: RawPlan,
    #[serde(default)]
    account: Account,
}

impl From<RawZone> for Zone {
    fn from(raw: RawZone) -> Self {
        let is_free = raw.plan.id == FREE_PLAN_ID || raw.plan.legacy_id == FREE_PLAN_LEGACY_ID;
        Self {
            id: raw.id,
            name: raw.name,
            tier: if is_free { Tier::Free } else { Tier::Paid },
            account: raw.account,
        }
    }
}

/// Directory listing monitored resources from the management API.
#[derive(Debug, Clone)]
pub struct ResourceDirectory {
    client: Arc<CloudflareClient>,
}

impl ResourceDirectory {
    /// Creates a directory backed by the provided client.
    pub fn new(client: Arc<CloudflareClient>) -> Self {
        Self { client }
    }

    /// Lists all zones visible with the configured credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if any page of the listing cannot be fetched.
    pub async fn list_zones(&self) -> Result<Vec<Zone>, ApiError> {
        let zones: Vec<RawZone> = self.client.get_all_pages("/zones").await?;
        Ok(zones.into_iter().map(Zone::from).collect())
    }

    /// Lists all accounts visible with the configured credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if any page of the listing cannot be fetched.
    pub async fn list_accounts(&self) -> Result<Vec<Account>, ApiError> {
        self.client.get_all_pages("/accounts").await
    }
}

/// Filters zones by ID. If `include` is non-empty, only zones with the listed IDs are retained;
/// then, zones with IDs listed in `exclude` are removed. Relative order of zones is preserved.
pub fn filter_zones(zones: Vec<Zone>, include: &[String], exclude: &[String]) -> Vec<Zone> {
    zones
        .into_iter()
        .filter(|zone| include.is_empty() || include.contains(&zone.id))
        .filter(|zone| !exclude.contains(&zone.id))
        .collect()
}

#[derive(Debug)]
struct ZoneEntry {
    name: String,
    account_name: String,
}

/// Read-only index resolving zone IDs returned by analytics queries to display names.
#[derive(Debug, Default)]
pub struct ZoneIndex {
    entries: HashMap<String, ZoneEntry>,
}

impl ZoneIndex {
    /// Builds an index over the provided zones.
    pub fn new(zones: &[Zone]) -> Self {
        let entries = zones
            .iter()
            .map(|zone| {
                let entry = ZoneEntry {
                    name: zone.name.clone(),
                    account_name: zone.account.name.clone(),
                };
                (zone.id.clone(), entry)
            })
            .collect();
        Self { entries }
    }

    /// Resolves a zone ID to `(zone name, account name)`. An unknown ID resolves to empty names.
    pub fn resolve(&self, zone_id: &str) -> (&str, &str) {
        self.entries
            .get(zone_id)
            .map_or(("", ""), |entry| (&entry.name, &entry.account_name))
    }
}
