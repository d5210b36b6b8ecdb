//! Command-line / environment configuration of the server.

use anyhow::Context as _;
use clap::Parser;
use flarewatch::DeniedMetrics;
use flarewatch_exporter::DEFAULT_METRICS_PATH;
use flarewatch_poller::{
    split_list, BatchSize, Credentials, PollerConfig, DEFAULT_API_URL, MAX_BATCH_SIZE,
};

use std::{
    net::{Ipv4Addr, SocketAddr, ToSocketAddrs},
    time::Duration,
};

/// Prometheus exporter for Cloudflare analytics.
///
/// Every option can be set via an environment variable named after the option,
/// e.g. `CF_API_TOKEN` for `--cf-api-token`.
#[derive(Debug, Parser)]
#[command(version, about)]
pub(crate) struct Cli {
    /// Address to serve metrics on. An address without a host (e.g., `:8080`) binds all interfaces.
    #[arg(long, env = "LISTEN", default_value = ":8080")]
    listen: String,
    /// Path to serve metrics on.
    #[arg(long, env = "METRICS_PATH", default_value = DEFAULT_METRICS_PATH)]
    metrics_path: String,
    /// Cloudflare API token. Takes precedence over the email + key pair.
    #[arg(long, env = "CF_API_TOKEN", hide_env_values = true)]
    cf_api_token: Option<String>,
    /// Email of the Cloudflare account; used together with `--cf-api-key`.
    #[arg(long, env = "CF_API_EMAIL")]
    cf_api_email: Option<String>,
    /// Global Cloudflare API key; used together with `--cf-api-email`.
    #[arg(long, env = "CF_API_KEY", hide_env_values = true)]
    cf_api_key: Option<String>,
    /// Comma-delimited list of zone IDs to poll. If empty, all visible zones are polled.
    #[arg(long, env = "CF_ZONES", default_value = "")]
    cf_zones: String,
    /// Comma-delimited list of zone IDs to never poll.
    #[arg(long, env = "CF_EXCLUDE_ZONES", default_value = "")]
    cf_exclude_zones: String,
    /// Offset of the query window into the past, in seconds.
    #[arg(long, env = "SCRAPE_DELAY", default_value_t = 300)]
    scrape_delay: u64,
    /// Interval between polling cycles, in seconds.
    #[arg(long, env = "SCRAPE_INTERVAL", default_value_t = 60)]
    scrape_interval: u64,
    /// Maximum number of zones per analytics query.
    #[arg(long, env = "CF_BATCH_SIZE", default_value_t = MAX_BATCH_SIZE)]
    cf_batch_size: usize,
    /// Only issue queries available on the free plan.
    #[arg(long, env = "FREE_TIER")]
    free_tier: bool,
    /// Comma-delimited list of metric names that must not be exposed.
    #[arg(long, env = "METRICS_DENYLIST", default_value = "")]
    metrics_denylist: String,
    /// Base URL of the Cloudflare API.
    #[arg(long, env = "CF_API_URL", default_value = DEFAULT_API_URL)]
    cf_api_url: String,
    /// Deadline for a single upstream request, in seconds.
    #[arg(long, env = "REQUEST_TIMEOUT", default_value_t = 30)]
    request_timeout: u64,
}

/// Validated server configuration.
#[derive(Debug)]
pub(crate) struct ServerConfig {
    pub listen: SocketAddr,
    pub metrics_path: String,
    pub denied_metrics: DeniedMetrics,
    pub poller: PollerConfig,
}

impl Cli {
    pub fn into_config(self) -> anyhow::Result<ServerConfig> {
        let listen = parse_listen_address(&self.listen)
            .with_context(|| format!("invalid listen address `{}`", self.listen))?;

        let denylist = split_list(&self.metrics_denylist);
        let denied_metrics = DeniedMetrics::parse(denylist.iter().map(String::as_str))
            .context("invalid metrics deny-list")?;

        let credentials = Credentials::new(self.cf_api_token, self.cf_api_email, self.cf_api_key)?;
        let mut poller = PollerConfig::new(credentials)
            .with_api_url(&self.cf_api_url)?
            .with_scrape_delay(Duration::from_secs(self.scrape_delay))?
            .with_scrape_interval(Duration::from_secs(self.scrape_interval))?
            .with_request_timeout(Duration::from_secs(self.request_timeout))?;
        poller.batch_size = BatchSize::new(self.cf_batch_size)?;
        poller.free_tier = self.free_tier;
        poller.include_zones = split_list(&self.cf_zones);
        poller.exclude_zones = split_list(&self.cf_exclude_zones);

        Ok(ServerConfig {
            listen,
            metrics_path: self.metrics_path,
            denied_metrics,
            poller,
        })
    }
}

/// Parses a listen address. An address without a host (`:8080`) binds all IPv4 interfaces;
/// host names are resolved.
fn parse_listen_address(raw: &str) -> anyhow::Result<SocketAddr> {
    if let Some(port) = raw.strip_prefix(':') {
        let port = port.parse().context("invalid port")?;
        return Ok((Ipv4Addr::UNSPECIFIED, port).into());
    }
    if let Ok(address) = raw.parse() {
        return Ok(address);
    }
    raw.to_socket_addrs()
        .context("cannot resolve address")?
        .next()
        .context("address resolved to nothing")
}
