//! Tests for the metric mapper.

use flarewatch::{DeniedMetrics, MetricName};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::*;
use crate::resources::{Account, Tier, Zone};

fn decode<T: DeserializeOwned>(value: Value) -> T {
    serde_json::from_value(value).unwrap()
}

fn test_zones() -> Vec<Zone> {
    let account = Account {
        id: "acc".to_owned(),
        name: "Acme Corp".to_owned(),
    };
    vec![
        Zone {
            id: "z1".to_owned(),
            name: "example.com".to_owned(),
            tier: Tier::Paid,
            account: account.clone(),
        },
        Zone {
            id: "z2".to_owned(),
            name: "example.org".to_owned(),
            tier: Tier::Free,
            account,
        },
    ]
}

fn mapper(metrics: &CloudflareMetrics) -> MetricMapper {
    MetricMapper::new(metrics.clone(), Arc::new(ZoneIndex::new(&test_zones())))
}

fn zone_labels(zone: &str) -> ZoneLabels {
    ZoneLabels {
        zone: zone.to_owned(),
        account: "Acme Corp".to_owned(),
    }
}

fn zone_totals() -> Vec<ZoneTotals> {
    decode(json!([{
        "zoneTag": "z1",
        "httpRequests1mGroups": [{
            "uniq": { "uniques": 12 },
            "sum": {
                "requests": 100,
                "cachedRequests": 40,
                "encryptedRequests": 90,
                "bytes": 2048,
                "cachedBytes": 1024,
                "encryptedBytes": 2000,
                "threats": 3,
                "pageViews": 25,
                "contentTypeMap": [
                    { "edgeResponseContentTypeName": "html", "requests": 60, "bytes": 1500 },
                ],
                "countryMap": [
                    { "clientCountryName": "DE", "requests": 70, "bytes": 1800, "threats": 2 },
                    { "clientCountryName": "XX", "requests": 30, "bytes": 248, "threats": 1 },
                ],
                "responseStatusMap": [
                    { "edgeResponseStatus": 200, "requests": 95 },
                    { "edgeResponseStatus": 404, "requests": 5 },
                ],
                "browserMap": [{ "uaBrowserFamily": "Firefox", "pageViews": 25 }],
                "threatPathingMap": [{ "threatPathingName": "bic.ban.unknown", "requests": 3 }],
            },
        }],
    }]))
}

#[test]
fn mapping_zone_totals() {
    let metrics = CloudflareMetrics::default();
    mapper(&metrics).apply_zone_totals(&zone_totals());

    let labels = zone_labels("example.com");
    let counter = |family: &flarewatch::CounterFamily<ZoneLabels>| family.get(&labels).unwrap().get();
    assert_eq!(counter(&metrics.zone_requests_total), 100);
    assert_eq!(counter(&metrics.zone_requests_cached), 40);
    assert_eq!(counter(&metrics.zone_requests_ssl_encrypted), 90);
    assert_eq!(counter(&metrics.zone_bandwidth_total), 2048);
    assert_eq!(counter(&metrics.zone_bandwidth_cached), 1024);
    assert_eq!(counter(&metrics.zone_bandwidth_ssl_encrypted), 2000);
    assert_eq!(counter(&metrics.zone_threats_total), 3);
    assert_eq!(counter(&metrics.zone_pageviews_total), 25);
    assert_eq!(counter(&metrics.zone_uniques_total), 12);

    let html_labels = ContentTypeLabels {
        zone: "example.com".to_owned(),
        account: "Acme Corp".to_owned(),
        content_type: "html".to_owned(),
    };
    assert_eq!(metrics.zone_requests_content_type.get(&html_labels).unwrap().get(), 60);
    assert_eq!(metrics.zone_bandwidth_content_type.get(&html_labels).unwrap().get(), 1500);

    let country_labels = |country: &str, region: &str| CountryLabels {
        zone: "example.com".to_owned(),
        account: "Acme Corp".to_owned(),
        country: country.to_owned(),
        region: region.to_owned(),
    };
    let de_labels = country_labels("DE", "Europe");
    assert_eq!(metrics.zone_requests_country.get(&de_labels).unwrap().get(), 70);
    assert_eq!(metrics.zone_bandwidth_country.get(&de_labels).unwrap().get(), 1800);
    assert_eq!(metrics.zone_threats_country.get(&de_labels).unwrap().get(), 2);
    let unknown_labels = country_labels("XX", "Unknown");
    assert_eq!(metrics.zone_requests_country.get(&unknown_labels).unwrap().get(), 30);

    let status_labels = StatusLabels {
        zone: "example.com".to_owned(),
        account: "Acme Corp".to_owned(),
        status: "404".to_owned(),
    };
    assert_eq!(metrics.zone_requests_status.get(&status_labels).unwrap().get(), 5);
    assert_eq!(metrics.zone_requests_status.len(), 2);

    let browser_labels = BrowserLabels {
        zone: "example.com".to_owned(),
        account: "Acme Corp".to_owned(),
        family: "Firefox".to_owned(),
    };
    assert_eq!(metrics.zone_requests_browser_map.get(&browser_labels).unwrap().get(), 25);

    let threat_labels = ThreatTypeLabels {
        zone: "example.com".to_owned(),
        account: "Acme Corp".to_owned(),
        r#type: "bic.ban.unknown".to_owned(),
    };
    assert_eq!(metrics.zone_threats_type.get(&threat_labels).unwrap().get(), 3);
}

#[test]
fn counters_accumulate_across_cycles() {
    let metrics = CloudflareMetrics::default();
    let mapper = mapper(&metrics);
    let labels = zone_labels("example.com");

    let mut previous = 0;
    for _ in 0..3 {
        mapper.apply_zone_totals(&zone_totals());
        let current = metrics.zone_requests_total.get(&labels).unwrap().get();
        assert_eq!(current, previous + 100);
        previous = current;
    }
}

#[test]
fn absent_sub_collections_produce_no_series() {
    let metrics = CloudflareMetrics::default();
    let mapper = mapper(&metrics);

    let zones: Vec<ZoneTotals> = decode(json!([
        { "zoneTag": "z1", "httpRequests1mGroups": [] },
        { "zoneTag": "z2" },
    ]));
    mapper.apply_zone_totals(&zones);
    let zones: Vec<ZoneAdaptive> = decode(json!([{ "zoneTag": "z1" }]));
    mapper.apply_zone_adaptive(&zones, &HashMap::new());
    let zones: Vec<LoadBalancerZone> = decode(json!([{ "zoneTag": "z1", "loadBalancingRequestsAdaptive": null }]));
    mapper.apply_load_balancers(&zones);

    assert!(metrics.zone_requests_total.is_empty());
    assert!(metrics.zone_uniques_total.is_empty());
    assert!(metrics.firewall_events.is_empty());
    assert!(metrics.health_check_events.is_empty());
    assert!(metrics.pool_health_status.is_empty());
    assert!(metrics.pool_requests_total.is_empty());
}

#[test]
fn unknown_zone_resolves_to_empty_labels() {
    let metrics = CloudflareMetrics::default();
    let zones: Vec<ZoneTotals> = decode(json!([{
        "zoneTag": "unknown",
        "httpRequests1mGroups": [{ "sum": { "requests": 7 } }],
    }]));
    mapper(&metrics).apply_zone_totals(&zones);

    let labels = ZoneLabels {
        zone: String::new(),
        account: String::new(),
    };
    assert_eq!(metrics.zone_requests_total.get(&labels).unwrap().get(), 7);
}

#[test]
fn mapping_zone_adaptive_groups() {
    let metrics = CloudflareMetrics::default();
    let zones: Vec<ZoneAdaptive> = decode(json!([{
        "zoneTag": "z1",
        "firewallEventsAdaptiveGroups": [
            {
                "count": 4,
                "dimensions": {
                    "action": "block",
                    "source": "firewallCustom",
                    "ruleId": "known",
                    "clientRequestHTTPHost": "www.example.com",
                    "clientCountryName": "US",
                },
            },
            {
                "count": 1,
                "dimensions": {
                    "action": "challenge",
                    "source": "firewallManaged",
                    "ruleId": "f3a1",
                    "clientRequestHTTPHost": "www.example.com",
                    "clientCountryName": "US",
                },
            },
        ],
        "healthCheckEventsAdaptiveGroups": [{
            "count": 2,
            "dimensions": {
                "healthStatus": "unhealthy",
                "originIP": "192.0.2.1",
                "region": "WEU",
                "fqdn": "origin.example.com",
            },
        }],
        "httpRequestsAdaptiveGroups": [{
            "count": 9,
            "dimensions": { "originResponseStatus": 502, "clientCountryName": "FR", "clientRequestHTTPHost": "api.example.com" },
        }],
        "httpRequestsEdgeCountryHost": [{
            "count": 11,
            "dimensions": { "edgeResponseStatus": 200, "clientCountryName": "FR", "clientRequestHTTPHost": "api.example.com" },
        }],
    }]));
    let rules = RuleDescriptions::from(HashMap::from([(
        "known".to_owned(),
        "Block Bad Bots".to_owned(),
    )]));
    let rules = HashMap::from([("z1".to_owned(), rules)]);
    mapper(&metrics).apply_zone_adaptive(&zones, &rules);

    let firewall_labels = |action: &str, source: &str, rule: &str| FirewallLabels {
        zone: "example.com".to_owned(),
        account: "Acme Corp".to_owned(),
        action: action.to_owned(),
        source: source.to_owned(),
        rule: rule.to_owned(),
        host: "www.example.com".to_owned(),
        country: "US".to_owned(),
    };
    let labels = firewall_labels("block", "firewallCustom", "block_bad_bots");
    assert_eq!(metrics.firewall_events.get(&labels).unwrap().get(), 4);
    let labels = firewall_labels("challenge", "firewallManaged", "f3a1");
    assert_eq!(metrics.firewall_events.get(&labels).unwrap().get(), 1);

    let health_labels = HealthCheckLabels {
        zone: "example.com".to_owned(),
        account: "Acme Corp".to_owned(),
        health_status: "unhealthy".to_owned(),
        origin_ip: "192.0.2.1".to_owned(),
        region: "WEU".to_owned(),
        fqdn: "origin.example.com".to_owned(),
    };
    assert_eq!(metrics.health_check_events.get(&health_labels).unwrap().get(), 2);

    let status_labels = |status: &str| StatusCountryHostLabels {
        zone: "example.com".to_owned(),
        account: "Acme Corp".to_owned(),
        status: status.to_owned(),
        country: "FR".to_owned(),
        host: "api.example.com".to_owned(),
    };
    let origin_counter = metrics.zone_requests_origin_status_country_host.get(&status_labels("502"));
    assert_eq!(origin_counter.unwrap().get(), 9);
    let edge_counter = metrics.zone_requests_status_country_host.get(&status_labels("200"));
    assert_eq!(edge_counter.unwrap().get(), 11);
}

#[test]
fn mapping_colocation_groups() {
    let metrics = CloudflareMetrics::default();
    let zones: Vec<ColocationZone> = decode(json!([{
        "zoneTag": "z1",
        "coloGroups": [{
            "count": 50,
            "dimensions": { "coloCode": "FRA", "clientRequestHTTPHost": "www.example.com" },
            "sum": { "edgeResponseBytes": 4096, "visits": 20 },
        }],
    }]));
    mapper(&metrics).apply_colocation(&zones);

    let labels = ColocationLabels {
        zone: "example.com".to_owned(),
        account: "Acme Corp".to_owned(),
        colocation: "FRA".to_owned(),
        host: "www.example.com".to_owned(),
    };
    assert_eq!(metrics.colocation_visits.get(&labels).unwrap().get(), 20);
    assert_eq!(metrics.colocation_edge_response_bytes.get(&labels).unwrap().get(), 4096);
    assert_eq!(metrics.colocation_requests_total.get(&labels).unwrap().get(), 50);
}

#[test]
fn pool_health_is_overwritten() {
    let metrics = CloudflareMetrics::default();
    let mapper = mapper(&metrics);
    let load_balancers = |healthy: Value| -> Vec<LoadBalancerZone> {
        decode(json!([{
            "zoneTag": "z1",
            "loadBalancingRequestsAdaptive": [{
                "lbName": "lb.example.com",
                "pools": [{ "poolName": "eu", "healthy": healthy }],
            }],
            "loadBalancingRequestsAdaptiveGroups": [{
                "count": 8,
                "dimensions": { "lbName": "lb.example.com", "selectedPoolName": "eu", "selectedOriginName": "o1" },
            }],
        }]))
    };
    let pool_labels = PoolLabels {
        zone: "example.com".to_owned(),
        account: "Acme Corp".to_owned(),
        load_balancer_name: "lb.example.com".to_owned(),
        pool_name: "eu".to_owned(),
    };
    let origin_labels = PoolOriginLabels {
        zone: "example.com".to_owned(),
        account: "Acme Corp".to_owned(),
        load_balancer_name: "lb.example.com".to_owned(),
        pool_name: "eu".to_owned(),
        origin_name: "o1".to_owned(),
    };

    mapper.apply_load_balancers(&load_balancers(json!(1)));
    assert_eq!(metrics.pool_health_status.get(&pool_labels).unwrap().get(), 1.0);
    mapper.apply_load_balancers(&load_balancers(json!(false)));
    assert_eq!(metrics.pool_health_status.get(&pool_labels).unwrap().get(), 0.0);
    // Request counts accumulate.
    assert_eq!(metrics.pool_requests_total.get(&origin_labels).unwrap().get(), 16);
}

#[test]
fn mapping_workers() {
    let metrics = CloudflareMetrics::default();
    let account = Account {
        id: "acc".to_owned(),
        name: "Acme Corp Prod".to_owned(),
    };
    let results: Vec<WorkersAccount> = decode(json!([{
        "workersInvocationsAdaptive": [{
            "dimensions": { "scriptName": "api" },
            "sum": { "requests": 120, "errors": 2 },
            "quantiles": {
                "cpuTimeP50": 1.5,
                "cpuTimeP75": 2.0,
                "cpuTimeP99": 8.0,
                "cpuTimeP999": 20.0,
                "durationP50": 0.5,
                "durationP75": 0.75,
                "durationP99": 3.0,
                "durationP999": 9.5,
            },
        }],
    }]));
    mapper(&metrics).apply_workers(&account, &results);

    let labels = WorkerLabels {
        script_name: "api".to_owned(),
        account: "acme-corp-prod".to_owned(),
    };
    assert_eq!(metrics.worker_requests.get(&labels).unwrap().get(), 120);
    assert_eq!(metrics.worker_errors.get(&labels).unwrap().get(), 2);

    let quantile_labels = |quantile: &str| WorkerQuantileLabels {
        script_name: "api".to_owned(),
        account: "acme-corp-prod".to_owned(),
        quantile: quantile.to_owned(),
    };
    assert_eq!(metrics.worker_cpu_time.get(&quantile_labels("P50")).unwrap().get(), 1.5);
    assert_eq!(metrics.worker_cpu_time.get(&quantile_labels("P999")).unwrap().get(), 20.0);
    assert_eq!(metrics.worker_duration.get(&quantile_labels("P75")).unwrap().get(), 0.75);
    assert_eq!(metrics.worker_duration.len(), 4);
}

#[test]
fn mapping_logpush_groups() {
    let metrics = CloudflareMetrics::default();
    let mapper = mapper(&metrics);
    let group = json!({
        "count": 3,
        "dimensions": { "destinationType": "s3", "jobId": 17, "final": 1 },
    });

    let account = Account {
        id: "acc".to_owned(),
        name: "Acme Corp".to_owned(),
    };
    let results: Vec<LogpushAccount> = decode(json!([{ "logpushHealthAdaptiveGroups": [group.clone()] }]));
    mapper.apply_logpush_account(&account, &results);
    let labels = LogpushAccountLabels {
        account: "acc".to_owned(),
        destination: "s3".to_owned(),
        job_id: "17".to_owned(),
        r#final: "1".to_owned(),
    };
    assert_eq!(metrics.logpush_failed_jobs_account.get(&labels).unwrap().get(), 3);

    let zones: Vec<LogpushZone> = decode(json!([{ "zoneTag": "z2", "logpushHealthAdaptiveGroups": [group] }]));
    mapper.apply_logpush_zones(&zones);
    let labels = LogpushZoneLabels {
        zone: "example.org".to_owned(),
        account: "Acme Corp".to_owned(),
        destination: "s3".to_owned(),
        job_id: "17".to_owned(),
        r#final: "1".to_owned(),
    };
    assert_eq!(metrics.logpush_failed_jobs_zone.get(&labels).unwrap().get(), 3);
}

#[test]
fn denied_metrics_are_not_updated() {
    let denied: DeniedMetrics = [MetricName::ZoneRequestsCached, MetricName::ZoneUniquesTotal]
        .into_iter()
        .collect();
    let metrics = CloudflareMetrics::new(&denied);
    mapper(&metrics).apply_zone_totals(&zone_totals());

    let labels = zone_labels("example.com");
    assert_eq!(metrics.zone_requests_total.get(&labels).unwrap().get(), 100);
    assert!(metrics.zone_requests_cached.is_empty());
    assert!(metrics.zone_uniques_total.is_empty());
}

#[test]
fn worker_account_labels() {
    assert_eq!(worker_account_label("Acme Corp"), "acme-corp");
    assert_eq!(worker_account_label("Acme Corp EU West"), "acme-corp-eu-west");
    assert_eq!(worker_account_label("ops"), "ops");
    assert_eq!(worker_account_label(""), "");
}
