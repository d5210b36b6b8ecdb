//! Analytics queries against the upstream GraphQL API.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use std::sync::Arc;

use self::responses::{
    AccountsData, ColocationZone, LoadBalancerZone, LogpushAccount, LogpushZone, WorkersAccount,
    ZoneAdaptive, ZoneTotals, ZonesData,
};
use crate::{
    client::{ApiError, CloudflareClient},
    window::QueryWindow,
};

mod queries;
#[allow(missing_docs)]
pub mod responses;

/// Maximum number of groups returned for each sub-collection.
const QUERY_LIMIT: u32 = 9_999;

/// Issues analytics queries. Each method corresponds to a single round trip; on error, the caller
/// should discard the entire contribution of the call.
#[derive(Debug, Clone)]
pub struct AnalyticsFetcher {
    client: Arc<CloudflareClient>,
}

impl AnalyticsFetcher {
    /// Creates a fetcher backed by the provided client.
    pub fn new(client: Arc<CloudflareClient>) -> Self {
        Self { client }
    }

    async fn query_zones<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<Vec<T>, ApiError> {
        let data: ZonesData<T> = self.client.graphql(query, variables).await?;
        Ok(data.viewer.zones)
    }

    async fn query_accounts<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<Vec<T>, ApiError> {
        let data: AccountsData<T> = self.client.graphql(query, variables).await?;
        Ok(data.viewer.accounts)
    }

    fn zone_variables(zone_ids: &[String], window: &QueryWindow) -> Value {
        json!({
            "zoneIDs": zone_ids,
            "mintime": window.since_rfc3339(),
            "maxtime": window.until_rfc3339(),
            "limit": QUERY_LIMIT,
        })
    }

    fn account_variables(account_id: &str, window: &QueryWindow) -> Value {
        json!({
            "accountID": account_id,
            "mintime": window.since_rfc3339(),
            "maxtime": window.until_rfc3339(),
            "limit": QUERY_LIMIT,
        })
    }

    /// Fetches 1-minute HTTP request totals (requests, bandwidth, threats, page views, uniques
    /// and their breakdowns) for the specified zones.
    ///
    /// # Errors
    ///
    /// Propagates upstream API errors.
    pub async fn zone_totals(
        &self,
        zone_ids: &[String],
        window: &QueryWindow,
    ) -> Result<Vec<ZoneTotals>, ApiError> {
        // The 1-minute group family is filtered on a single bucket, so `maxtime` is not declared.
        let variables = json!({
            "zoneIDs": zone_ids,
            "mintime": window.since_rfc3339(),
            "limit": QUERY_LIMIT,
        });
        self.query_zones(queries::ZONE_TOTALS, variables).await
    }

    /// Fetches firewall events, health check events, and origin / edge statuses per country and host.
    ///
    /// # Errors
    ///
    /// Propagates upstream API errors.
    pub async fn zone_adaptive(
        &self,
        zone_ids: &[String],
        window: &QueryWindow,
    ) -> Result<Vec<ZoneAdaptive>, ApiError> {
        let variables = Self::zone_variables(zone_ids, window);
        self.query_zones(queries::ZONE_ADAPTIVE, variables).await
    }

    /// Fetches request stats per colocation and host.
    ///
    /// # Errors
    ///
    /// Propagates upstream API errors.
    pub async fn colocation(
        &self,
        zone_ids: &[String],
        window: &QueryWindow,
    ) -> Result<Vec<ColocationZone>, ApiError> {
        let variables = Self::zone_variables(zone_ids, window);
        self.query_zones(queries::COLOCATION, variables).await
    }

    /// Fetches load balancer pool request counts and pool health.
    ///
    /// # Errors
    ///
    /// Propagates upstream API errors.
    pub async fn load_balancers(
        &self,
        zone_ids: &[String],
        window: &QueryWindow,
    ) -> Result<Vec<LoadBalancerZone>, ApiError> {
        let variables = Self::zone_variables(zone_ids, window);
        self.query_zones(queries::LOAD_BALANCER, variables).await
    }

    /// Fetches failed logpush jobs for the specified zones.
    ///
    /// # Errors
    ///
    /// Propagates upstream API errors.
    pub async fn logpush_zones(
        &self,
        zone_ids: &[String],
        window: &QueryWindow,
    ) -> Result<Vec<LogpushZone>, ApiError> {
        let variables = Self::zone_variables(zone_ids, window);
        self.query_zones(queries::LOGPUSH_ZONE, variables).await
    }

    /// Fetches worker invocation stats for the specified account.
    ///
    /// # Errors
    ///
    /// Propagates upstream API errors.
    pub async fn workers(
        &self,
        account_id: &str,
        window: &QueryWindow,
    ) -> Result<Vec<WorkersAccount>, ApiError> {
        let variables = Self::account_variables(account_id, window);
        self.query_accounts(queries::WORKERS, variables).await
    }

    /// Fetches failed logpush jobs for the specified account.
    ///
    /// # Errors
    ///
    /// Propagates upstream API errors.
    pub async fn logpush_account(
        &self,
        account_id: &str,
        window: &QueryWindow,
    ) -> Result<Vec<LogpushAccount>, ApiError> {
        let variables = Self::account_variables(account_id, window);
        self.query_accounts(queries::LOGPUSH_ACCOUNT, variables).await
    }
}
