//! GraphQL query text for all analytics families.

pub(super) const ZONE_TOTALS: &str = r"
query ZoneTotals($zoneIDs: [String!], $mintime: Time!, $limit: Int!) {
  viewer {
    zones(filter: { zoneTag_in: $zoneIDs }) {
      zoneTag
      httpRequests1mGroups(limit: $limit, filter: { datetime: $mintime }) {
        uniq {
          uniques
        }
        sum {
          browserMap {
            pageViews
            uaBrowserFamily
          }
          bytes
          cachedBytes
          cachedRequests
          contentTypeMap {
            bytes
            requests
            edgeResponseContentTypeName
          }
          countryMap {
            bytes
            clientCountryName
            requests
            threats
          }
          encryptedBytes
          encryptedRequests
          pageViews
          requests
          responseStatusMap {
            edgeResponseStatus
            requests
          }
          threatPathingMap {
            requests
            threatPathingName
          }
          threats
        }
      }
    }
  }
}
";

pub(super) const ZONE_ADAPTIVE: &str = r"
query ZoneAdaptive($zoneIDs: [String!], $mintime: Time!, $maxtime: Time!, $limit: Int!) {
  viewer {
    zones(filter: { zoneTag_in: $zoneIDs }) {
      zoneTag
      firewallEventsAdaptiveGroups(
        limit: $limit
        filter: { datetime_geq: $mintime, datetime_lt: $maxtime }
      ) {
        count
        dimensions {
          action
          source
          ruleId
          clientRequestHTTPHost
          clientCountryName
        }
      }
      healthCheckEventsAdaptiveGroups(
        limit: $limit
        filter: { datetime_geq: $mintime, datetime_lt: $maxtime }
      ) {
        count
        dimensions {
          healthStatus
          originIP
          region
          fqdn
        }
      }
      httpRequestsAdaptiveGroups(
        limit: $limit
        filter: { datetime_geq: $mintime, datetime_lt: $maxtime, cacheStatus_notin: [hit] }
      ) {
        count
        dimensions {
          originResponseStatus
          clientCountryName
          clientRequestHTTPHost
        }
      }
      httpRequestsEdgeCountryHost: httpRequestsAdaptiveGroups(
        limit: $limit
        filter: { datetime_geq: $mintime, datetime_lt: $maxtime }
      ) {
        count
        dimensions {
          edgeResponseStatus
          clientCountryName
          clientRequestHTTPHost
        }
      }
    }
  }
}
";

pub(super) const COLOCATION: &str = r"
query Colocation($zoneIDs: [String!], $mintime: Time!, $maxtime: Time!, $limit: Int!) {
  viewer {
    zones(filter: { zoneTag_in: $zoneIDs }) {
      zoneTag
      coloGroups: httpRequestsAdaptiveGroups(
        limit: $limit
        filter: { datetime_geq: $mintime, datetime_lt: $maxtime }
      ) {
        count
        dimensions {
          coloCode
          clientRequestHTTPHost
        }
        sum {
          edgeResponseBytes
          visits
        }
      }
    }
  }
}
";

pub(super) const LOAD_BALANCER: &str = r"
query LoadBalancer($zoneIDs: [String!], $mintime: Time!, $maxtime: Time!, $limit: Int!) {
  viewer {
    zones(filter: { zoneTag_in: $zoneIDs }) {
      zoneTag
      loadBalancingRequestsAdaptiveGroups(
        limit: $limit
        filter: { datetime_geq: $mintime, datetime_lt: $maxtime }
      ) {
        count
        dimensions {
          lbName
          selectedPoolName
          selectedOriginName
        }
      }
      loadBalancingRequestsAdaptive(
        limit: $limit
        filter: { datetime_geq: $mintime, datetime_lt: $maxtime }
      ) {
        lbName
        pools {
          poolName
          healthy
        }
      }
    }
  }
}
";

pub(super) const WORKERS: &str = r"
query Workers($accountID: String!, $mintime: Time!, $maxtime: Time!, $limit: Int!) {
  viewer {
    accounts(filter: { accountTag: $accountID }) {
      workersInvocationsAdaptive(
        limit: $limit
        filter: { datetime_geq: $mintime, datetime_lt: $maxtime }
      ) {
        dimensions {
          scriptName
        }
        sum {
          requests
          errors
        }
        quantiles {
          cpuTimeP50
          cpuTimeP75
          cpuTimeP99
          cpuTimeP999
          durationP50
          durationP75
          durationP99
          durationP999
        }
      }
    }
  }
}
";

pub(super) const LOGPUSH_ACCOUNT: &str = r"
query LogpushAccount($accountID: String!, $mintime: Time!, $maxtime: Time!, $limit: Int!) {
  viewer {
    accounts(filter: { accountTag: $accountID }) {
      logpushHealthAdaptiveGroups(
        limit: $limit
        filter: { datetime_geq: $mintime, datetime_lt: $maxtime, status_neq: 200 }
      ) {
        count
        dimensions {
          destinationType
          jobId
          final
        }
      }
    }
  }
}
";

pub(super) const LOGPUSH_ZONE: &str = r"
query LogpushZone($zoneIDs: [String!], $mintime: Time!, $maxtime: Time!, $limit: Int!) {
  viewer {
    zones(filter: { zoneTag_in: $zoneIDs }) {
      zoneTag
      logpushHealthAdaptiveGroups(
        limit: $limit
        filter: { datetime_geq: $mintime, datetime_lt: $maxtime, status_neq: 200 }
      ) {
        count
        dimensions {
          destinationType
          jobId
          final
        }
      }
    }
  }
}
";
