//! Upstream API client.

use http_body_util::{BodyExt as _, Full};
use hyper::{
    body::Bytes,
    header::{self, HeaderValue},
    Method, Request, StatusCode,
};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;

use std::time::Duration;

use crate::config::{Credentials, PollerConfig};

/// Number of items requested per page from paginated endpoints.
const PER_PAGE: u32 = 50;
/// Maximum length of an erroneous response body included into [`ApiError`].
const MAX_ERROR_BODY_LEN: usize = 512;

/// Errors produced by the upstream API client.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ApiError {
    /// Request could not be built (e.g., credentials contain chars not allowed in headers).
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] hyper::http::Error),
    /// Transport-level error (connection failure, TLS error etc.).
    #[error("transport error: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),
    /// Error reading the response body.
    #[error("error reading response body: {0}")]
    Body(#[from] hyper::Error),
    /// Request has timed out.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    /// Upstream responded with a non-success HTTP status.
    #[error("unexpected HTTP status {status}: {body}")]
    Status {
        /// Response status.
        status: StatusCode,
        /// Response body (possibly truncated).
        body: String,
    },
    /// Response cannot be decoded.
    #[error("cannot decode response: {0}")]
    Decode(#[from] serde_json::Error),
    /// Upstream reported an error in the REST envelope.
    #[error("upstream error: {0}")]
    Upstream(String),
    /// Upstream reported errors for a GraphQL query.
    #[error("GraphQL error: {0}")]
    GraphQl(String),
}

#[derive(Debug, Deserialize)]
struct UpstreamMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

fn join_messages(messages: &[UpstreamMessage]) -> String {
    let messages: Vec<_> = messages
        .iter()
        .map(|msg| {
            if msg.code == 0 {
                msg.message.clone()
            } else {
                format!("{} (code {})", msg.message, msg.code)
            }
        })
        .collect();
    messages.join("; ")
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
struct ResultInfo {
    #[serde(default)]
    total_pages: u32,
}

/// REST response envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<UpstreamMessage>,
    result: Option<T>,
    result_info: Option<ResultInfo>,
}

impl<T> Envelope<T> {
    fn into_result(self) -> Result<(T, Option<ResultInfo>), ApiError> {
        if !self.success {
            return Err(ApiError::Upstream(join_messages(&self.errors)));
        }
        let result = self
            .result
            .ok_or_else(|| ApiError::Upstream("response has no result".to_owned()))?;
        Ok((result, self.result_info))
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Option<Vec<UpstreamMessage>>,
}

type HttpClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// Client for the upstream REST and GraphQL APIs.
///
/// Every request is bounded by the configured timeout, which covers both sending the request
/// and reading the response body.
#[derive(Debug, Clone)]
pub struct CloudflareClient {
    http: HttpClient,
    base_url: String,
    credentials: Credentials,
    timeout: Duration,
}

impl CloudflareClient {
    /// Creates a client based on the provided config.
    pub fn new(config: &PollerConfig) -> Self {
        let connector = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .build();
        let http = Client::builder(TokioExecutor::new()).build(connector);
        Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_owned(),
            credentials: config.credentials.clone(),
            timeout: config.request_timeout,
        }
    }

    fn build_request(
        &self,
        method: Method,
        path_and_query: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Request<Full<Bytes>>, ApiError> {
        let uri = format!("{}{path_and_query}", self.base_url);
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::ACCEPT, HeaderValue::from_static("application/json"));
        builder = match &self.credentials {
            Credentials::Token(token) => {
                builder.header(header::AUTHORIZATION, format!("Bearer {token}"))
            }
            Credentials::KeyEmail { email, key } => builder
                .header("X-Auth-Email", email.as_str())
                .header("X-Auth-Key", key.as_str()),
        };

        let body = if let Some(body) = body {
            builder = builder.header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
            Full::new(Bytes::from(body))
        } else {
            Full::new(Bytes::new())
        };
        Ok(builder.body(body)?)
    }

    async fn send(
        &self,
        method: Method,
        path_and_query: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Bytes, ApiError> {
        let request = self.build_request(method, path_and_query, body)?;
        let exchange = async {
            let response = self.http.request(request).await?;
            let status = response.status();
            let body = response.into_body().collect().await?.to_bytes();
            Ok::<_, ApiError>((status, body))
        };
        let (status, body) = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| ApiError::Timeout(self.timeout))??;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&body);
            let body = match body.char_indices().nth(MAX_ERROR_BODY_LEN) {
                Some((pos, _)) => format!("{}...", &body[..pos]),
                None => body.into_owned(),
            };
            return Err(ApiError::Status { status, body });
        }
        Ok(body)
    }

    /// Gets a single (non-paginated) result from a REST endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success HTTP status, or `success: false` in the envelope.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let body = self.send(Method::GET, path, None).await?;
        let envelope: Envelope<T> = serde_json::from_slice(&body)?;
        Ok(envelope.into_result()?.0)
    }

    /// Gets all pages from a paginated REST endpoint and concatenates results.
    ///
    /// # Errors
    ///
    /// Returns an error if fetching any of the pages fails.
    pub async fn get_all_pages<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        let separator = if path.contains('?') { '&' } else { '?' };
        let mut items = vec![];
        let mut page = 1;
        loop {
            let path_and_query = format!("{path}{separator}page={page}&per_page={PER_PAGE}");
            let body = self.send(Method::GET, &path_and_query, None).await?;
            let envelope: Envelope<Vec<T>> = serde_json::from_slice(&body)?;
            let (page_items, result_info) = envelope.into_result()?;
            let page_len = page_items.len();
            items.extend(page_items);

            let total_pages = result_info.map_or(0, |info| info.total_pages);
            tracing::trace!(path, page, total_pages, page_len, "Fetched page");
            if page >= total_pages || page_len == 0 {
                break;
            }
            page += 1;
        }
        Ok(items)
    }

    /// Executes a GraphQL query.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success HTTP status, or if the response contains
    /// a non-empty `errors` array.
    pub async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, ApiError> {
        let body = json!({ "query": query, "variables": variables });
        let body = serde_json::to_vec(&body)?;
        let body = self.send(Method::POST, "/graphql", Some(body)).await?;

        let response: GraphQlResponse<T> = serde_json::from_slice(&body)?;
        if let Some(errors) = response.errors.filter(|errors| !errors.is_empty()) {
            return Err(ApiError::GraphQl(join_messages(&errors)));
        }
        response
            .data
            .ok_or_else(|| ApiError::GraphQl("response has no data".to_owned()))
    }
}
