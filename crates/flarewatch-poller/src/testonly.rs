//! Mock upstream API used in tests.

use http_body_util::BodyExt as _;
use hyper::{
    body::Incoming, header, server::conn::http1, service::service_fn, HeaderMap, Method, Request,
    Response, StatusCode,
};
use hyper_util::rt::TokioIo;
use serde_json::{json, Value};
use tokio::{net::TcpListener, task::JoinHandle};

use std::{
    convert::Infallible,
    net::{Ipv4Addr, SocketAddr},
    sync::{Arc, Mutex},
    time::Duration,
};

#[derive(Debug, Clone)]
pub(crate) struct MockRequest {
    pub method: Method,
    pub path: String,
    pub query: String,
    pub headers: HeaderMap,
    /// Name of the GraphQL operation, e.g. `ZoneTotals` for `query ZoneTotals(...)`.
    pub operation: Option<String>,
    pub variables: Value,
}

impl MockRequest {
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key == name).then_some(value)
        })
    }

    /// Returns zone IDs passed to a GraphQL query.
    pub fn zone_ids(&self) -> Vec<String> {
        self.variables["zoneIDs"]
            .as_array()
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| Some(id.as_str()?.to_owned()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn operation_name(query: &str) -> Option<String> {
    let rest = query.trim_start().strip_prefix("query")?.trim_start();
    let name: String = rest
        .chars()
        .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
        .collect();
    (!name.is_empty()).then_some(name)
}

#[derive(Debug)]
pub(crate) struct MockResponse {
    status: StatusCode,
    body: String,
    delay: Option<Duration>,
}

impl MockResponse {
    pub fn json(value: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body: value.to_string(),
            delay: None,
        }
    }

    /// Successful REST envelope with a single page of results.
    pub fn envelope(result: Value) -> Self {
        Self::json(json!({
            "success": true,
            "errors": [],
            "messages": [],
            "result": result,
            "result_info": { "page": 1, "per_page": 50, "total_pages": 1 },
        }))
    }

    /// Successful GraphQL response.
    pub fn graphql(data: Value) -> Self {
        Self::json(json!({ "data": data, "errors": null }))
    }

    pub fn status(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            body: body.to_owned(),
            delay: None,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

const BASE_PATH: &str = "/client/v4";

type Handler = dyn Fn(&MockRequest) -> MockResponse + Send + Sync;

#[derive(Debug)]
pub(crate) struct MockUpstream {
    local_addr: SocketAddr,
    requests: Arc<Mutex<Vec<MockRequest>>>,
    server_task: JoinHandle<()>,
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.server_task.abort();
    }
}

impl MockUpstream {
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&MockRequest) -> MockResponse + Send + Sync + 'static,
    {
        let handler: Arc<Handler> = Arc::new(handler);
        let requests = Arc::<Mutex<Vec<MockRequest>>>::default();
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let local_addr = listener.local_addr().unwrap();

        let server_requests = requests.clone();
        let server_task = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let handler = handler.clone();
                let requests = server_requests.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |request| {
                        let handler = handler.clone();
                        let requests = requests.clone();
                        async move {
                            let response = Self::handle(request, &*handler, &requests).await;
                            Ok::<_, Infallible>(response)
                        }
                    });
                    http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await
                        .ok();
                });
            }
        });

        Self {
            local_addr,
            requests,
            server_task,
        }
    }

    async fn handle(
        request: Request<Incoming>,
        handler: &Handler,
        requests: &Mutex<Vec<MockRequest>>,
    ) -> Response<String> {
        let (parts, body) = request.into_parts();
        let body = body.collect().await.unwrap().to_bytes();
        let body: Value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        let operation = body["query"].as_str().and_then(operation_name);

        let request = MockRequest {
            method: parts.method,
            path: parts
                .uri
                .path()
                .strip_prefix(BASE_PATH)
                .unwrap_or(parts.uri.path())
                .to_owned(),
            query: parts.uri.query().unwrap_or_default().to_owned(),
            headers: parts.headers,
            operation,
            variables: body["variables"].clone(),
        };
        let response = handler(&request);
        requests.lock().unwrap().push(request);

        if let Some(delay) = response.delay {
            tokio::time::sleep(delay).await;
        }
        let mut http_response = Response::new(response.body);
        *http_response.status_mut() = response.status;
        http_response.headers_mut().insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        http_response
    }

    pub fn base_url(&self) -> String {
        format!("http://{}{BASE_PATH}", self.local_addr)
    }

    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Returns GraphQL requests with the specified operation name.
    pub fn graphql_requests(&self, operation: &str) -> Vec<MockRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.operation.as_deref() == Some(operation))
            .collect()
    }
}
