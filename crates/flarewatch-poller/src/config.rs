//! Poller configuration.

use chrono::TimeDelta;
use hyper::{http::uri::InvalidUri, Uri};

use std::{fmt, time::Duration};

/// Maximum number of zones queried in a single analytics call.
pub const MAX_BATCH_SIZE: usize = 10;
/// Default upstream API base URL.
pub const DEFAULT_API_URL: &str = "https://api.cloudflare.com/client/v4";

/// Errors that can occur when validating [`PollerConfig`]. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// Neither an API token nor an email + key pair is provided.
    #[error("no credentials provided; set an API token, or both an API email and an API key")]
    MissingCredentials,
    /// Batch size is outside `[1, MAX_BATCH_SIZE]`.
    #[error("batch size {0} is out of range; expected a value between 1 and {MAX_BATCH_SIZE}")]
    BatchSize(usize),
    /// Scrape interval is zero.
    #[error("scrape interval must be positive")]
    ZeroInterval,
    /// Scrape delay cannot be represented as a time delta.
    #[error("scrape delay {0:?} is too large")]
    ScrapeDelay(Duration),
    /// Request timeout is zero.
    #[error("request timeout must be positive")]
    ZeroTimeout,
    /// Upstream API URL cannot be parsed.
    #[error("invalid API URL `{url}`: {source}")]
    ApiUrl {
        /// Offending URL.
        url: String,
        /// Parsing error.
        #[source]
        source: InvalidUri,
    },
}

/// Maximum number of zones per analytics query, validated to lie in `[1, MAX_BATCH_SIZE]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSize(usize);

impl BatchSize {
    /// Validates the batch size.
    ///
    /// # Errors
    ///
    /// Returns an error if `size` is zero or exceeds [`MAX_BATCH_SIZE`].
    pub fn new(size: usize) -> Result<Self, ConfigError> {
        if (1..=MAX_BATCH_SIZE).contains(&size) {
            Ok(Self(size))
        } else {
            Err(ConfigError::BatchSize(size))
        }
    }

    /// Returns the size.
    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for BatchSize {
    fn default() -> Self {
        Self(MAX_BATCH_SIZE)
    }
}

/// Upstream API credentials.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Scoped API token sent as a bearer token.
    Token(String),
    /// Global API key together with the account email.
    KeyEmail {
        /// Account email.
        email: String,
        /// Global API key.
        key: String,
    },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(_) => formatter.debug_tuple("Token").field(&"_").finish(),
            Self::KeyEmail { email, .. } => formatter
                .debug_struct("KeyEmail")
                .field("email", email)
                .finish_non_exhaustive(),
        }
    }
}

impl Credentials {
    /// Selects credentials from the provided values. A non-empty token takes precedence; otherwise,
    /// both email and key must be non-empty.
    ///
    /// # Errors
    ///
    /// Returns an error if no complete set of credentials is provided.
    pub fn new(
        token: Option<String>,
        email: Option<String>,
        key: Option<String>,
    ) -> Result<Self, ConfigError> {
        let non_empty = |value: Option<String>| value.filter(|value| !value.trim().is_empty());
        if let Some(token) = non_empty(token) {
            return Ok(Self::Token(token));
        }
        match (non_empty(email), non_empty(key)) {
            (Some(email), Some(key)) => Ok(Self::KeyEmail { email, key }),
            _ => Err(ConfigError::MissingCredentials),
        }
    }
}

/// Configuration of the polling engine.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Upstream API base URL without a trailing slash.
    pub api_url: String,
    /// Upstream API credentials.
    pub credentials: Credentials,
    /// Deadline for a single upstream request, including reading the response body.
    pub request_timeout: Duration,
    /// Offset of the query window into the past.
    pub scrape_delay: TimeDelta,
    /// Interval between polling cycles.
    pub scrape_interval: Duration,
    /// Maximum number of zones per analytics query.
    pub batch_size: BatchSize,
    /// If set, paid-only query families are never issued.
    pub free_tier: bool,
    /// If non-empty, only zones with these IDs are polled.
    pub include_zones: Vec<String>,
    /// Zones with these IDs are never polled.
    pub exclude_zones: Vec<String>,
}

impl PollerConfig {
    /// Default offset of the query window into the past.
    pub const DEFAULT_SCRAPE_DELAY: Duration = Duration::from_secs(300);
    /// Default interval between polling cycles.
    pub const DEFAULT_SCRAPE_INTERVAL: Duration = Duration::from_secs(60);
    /// Default deadline for a single upstream request.
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Creates a configuration with default settings and the specified credentials.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            credentials,
            request_timeout: Self::DEFAULT_REQUEST_TIMEOUT,
            scrape_delay: TimeDelta::seconds(300),
            scrape_interval: Self::DEFAULT_SCRAPE_INTERVAL,
            batch_size: BatchSize::default(),
            free_tier: false,
            include_zones: vec![],
            exclude_zones: vec![],
        }
    }

    /// Sets the upstream API base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn with_api_url(mut self, url: &str) -> Result<Self, ConfigError> {
        let url = url.trim_end_matches('/');
        url.parse::<Uri>().map_err(|source| ConfigError::ApiUrl {
            url: url.to_owned(),
            source,
        })?;
        self.api_url = url.to_owned();
        Ok(self)
    }

    /// Sets the scrape delay.
    ///
    /// # Errors
    ///
    /// Returns an error if the delay is out of range of [`TimeDelta`].
    pub fn with_scrape_delay(mut self, delay: Duration) -> Result<Self, ConfigError> {
        self.scrape_delay = TimeDelta::from_std(delay).map_err(|_| ConfigError::ScrapeDelay(delay))?;
        Ok(self)
    }

    /// Sets the interval between polling cycles.
    ///
    /// # Errors
    ///
    /// Returns an error if the interval is zero.
    pub fn with_scrape_interval(mut self, interval: Duration) -> Result<Self, ConfigError> {
        if interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        self.scrape_interval = interval;
        Ok(self)
    }

    /// Sets the deadline for a single upstream request.
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout is zero.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        self.request_timeout = timeout;
        Ok(self)
    }
}

/// Splits a comma-delimited list, trimming whitespace and dropping empty entries.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}
