//! End-to-end testing of the server binary against a mock Cloudflare API.

use anyhow::Context as _;
use http_body_util::{BodyExt as _, Empty, Full};
use hyper::{
    body::{Bytes, Incoming},
    server::conn::http1,
    service::service_fn,
    Request, Response, StatusCode,
};
use hyper_util::{
    client::legacy::Client,
    rt::{TokioExecutor, TokioIo},
};
use serde_json::{json, Value};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    net::TcpListener,
    process::{Child, Command},
};

use std::{
    convert::Infallible,
    net::{Ipv4Addr, SocketAddr},
    process::Stdio,
    time::{Duration, Instant},
};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const MAX_WAIT: Duration = Duration::from_secs(20);

/// Environment variables that could leak into the server config from the test environment.
const CONFIG_VARS: &[&str] = &[
    "LISTEN",
    "METRICS_PATH",
    "CF_API_TOKEN",
    "CF_API_EMAIL",
    "CF_API_KEY",
    "CF_ZONES",
    "CF_EXCLUDE_ZONES",
    "SCRAPE_DELAY",
    "SCRAPE_INTERVAL",
    "CF_BATCH_SIZE",
    "FREE_TIER",
    "METRICS_DENYLIST",
    "CF_API_URL",
    "REQUEST_TIMEOUT",
];

fn envelope(result: Value) -> Value {
    json!({
        "success": true,
        "errors": [],
        "messages": [],
        "result": result,
        "result_info": { "page": 1, "per_page": 50, "total_pages": 1 },
    })
}

fn mock_response(path: &str, body: &Value) -> (StatusCode, Value) {
    let query = body["query"].as_str().unwrap_or_default();
    match path {
        "/client/v4/zones" => {
            let zones = json!([{
                "id": "z1",
                "name": "example.com",
                "plan": { "id": "94f3b7b768b0458b56d2cac4fe5ec0f9", "legacy_id": "enterprise" },
                "account": { "id": "acc", "name": "Acme Corp" },
            }]);
            (StatusCode::OK, envelope(zones))
        }
        "/client/v4/accounts" => (StatusCode::OK, envelope(json!([]))),
        "/client/v4/graphql" if query.trim_start().starts_with("query ZoneTotals") => {
            let data = json!({
                "viewer": {
                    "zones": [{
                        "zoneTag": "z1",
                        "httpRequests1mGroups": [{
                            "uniq": { "uniques": 7 },
                            "sum": {
                                "requests": 100,
                                "cachedRequests": 40,
                                "countryMap": [{ "clientCountryName": "DE", "requests": 60 }],
                            },
                        }],
                    }],
                },
            });
            (StatusCode::OK, json!({ "data": data, "errors": null }))
        }
        "/client/v4/graphql" => {
            let data = json!({ "viewer": { "zones": [], "accounts": [] } });
            (StatusCode::OK, json!({ "data": data, "errors": null }))
        }
        _ => (StatusCode::NOT_FOUND, json!({ "success": false })),
    }
}

async fn handle_request(request: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    let path = request.uri().path().to_owned();
    let body = request
        .into_body()
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .unwrap_or_default();
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    let (status, response_body) = mock_response(&path, &body);
    let mut response = Response::new(Full::new(Bytes::from(response_body.to_string())));
    *response.status_mut() = status;
    Ok(response)
}

async fn start_mock_upstream() -> anyhow::Result<SocketAddr> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
    let local_addr = listener.local_addr()?;
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service_fn(handle_request))
                    .await
                    .ok();
            });
        }
    });
    Ok(local_addr)
}

async fn start_server(upstream_addr: SocketAddr) -> anyhow::Result<(Child, SocketAddr)> {
    let mut command = Command::new(env!("CARGO_BIN_EXE_flarewatch-server"));
    for &var in CONFIG_VARS {
        command.env_remove(var);
    }
    command
        .args(["--listen", "127.0.0.1:0"])
        .args(["--cf-api-url", &format!("http://{upstream_addr}/client/v4")])
        .args(["--cf-api-token", "test-token"])
        .args(["--scrape-interval", "1"])
        .args(["--metrics-denylist", "cloudflare_zone_uniques_total"])
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);
    let mut server = command.spawn().context("failed spawning server")?;

    let stdout = server.stdout.take().context("no server stdout")?;
    let mut lines = BufReader::new(stdout).lines();
    let local_addr = tokio::time::timeout(MAX_WAIT, async {
        while let Some(line) = lines.next_line().await? {
            if let Some(addr) = line.strip_prefix("local_addr=") {
                return anyhow::Ok(addr.parse()?);
            }
        }
        anyhow::bail!("server stdout closed before reporting its address")
    })
    .await
    .context("timed out waiting for server address")??;
    Ok((server, local_addr))
}

async fn get(url: &str) -> anyhow::Result<(StatusCode, String)> {
    let client = Client::builder(TokioExecutor::new()).build_http::<Empty<Bytes>>();
    let response = client.get(url.parse()?).await?;
    let status = response.status();
    let body = response.into_body().collect().await?.to_bytes();
    Ok((status, String::from_utf8(body.to_vec())?))
}

#[tokio::test]
async fn server_polls_and_exports_metrics() -> anyhow::Result<()> {
    let upstream_addr = start_mock_upstream().await?;
    let (_server, server_addr) = start_server(upstream_addr).await?;

    let (status, body) = get(&format!("http://{server_addr}/health")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"status":"pass"}"#);

    let expected_lines = [
        r#"cloudflare_zone_requests_total{zone="example.com",account="Acme Corp"}"#,
        r#"cloudflare_zone_requests_cached{zone="example.com",account="Acme Corp"}"#,
        r#"cloudflare_zone_requests_country{zone="example.com",account="Acme Corp",country="DE",region="Europe"}"#,
    ];
    let started_at = Instant::now();
    let metrics = loop {
        let (status, body) = get(&format!("http://{server_addr}/metrics")).await?;
        assert_eq!(status, StatusCode::OK);
        if expected_lines.iter().all(|line| body.contains(line)) {
            break body;
        }
        assert!(
            started_at.elapsed() < MAX_WAIT,
            "timed out waiting for metrics; last scrape:\n{body}"
        );
        tokio::time::sleep(POLL_INTERVAL).await;
    };

    assert!(metrics.contains("# TYPE cloudflare_zone_requests_total counter"), "{metrics}");
    assert!(!metrics.contains("cloudflare_zone_uniques_total"), "{metrics}");
    assert!(!metrics.contains("# EOF"), "{metrics}");

    let (status, _) = get(&format!("http://{server_addr}/bogus")).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn server_fails_on_unreachable_upstream() -> anyhow::Result<()> {
    // Bind and immediately drop a listener to get a port that refuses connections.
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
    let upstream_addr = listener.local_addr()?;
    drop(listener);

    let mut command = Command::new(env!("CARGO_BIN_EXE_flarewatch-server"));
    for &var in CONFIG_VARS {
        command.env_remove(var);
    }
    let status = command
        .args(["--listen", "127.0.0.1:0"])
        .args(["--cf-api-url", &format!("http://{upstream_addr}/client/v4")])
        .args(["--cf-api-token", "test-token"])
        .args(["--request-timeout", "5"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .status();
    let status = tokio::time::timeout(MAX_WAIT, status).await??;
    assert!(!status.success());
    Ok(())
}
