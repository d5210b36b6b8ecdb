//! `MetricsExporter` and closely related types.

use std::{
    convert::Infallible,
    fmt,
    future::{self, Future},
    net::SocketAddr,
    pin::Pin,
    sync::Arc,
    time::{Duration, Instant},
};

use hyper::{
    header::{self, HeaderValue},
    server::conn::http1,
    service::service_fn,
    Method, Request, Response, StatusCode,
};
use hyper_util::rt::TokioIo;
use tokio::{io, net::TcpListener, sync::watch};

use flarewatch::{Format, Registry};


/// Default path to serve metrics on.
pub const DEFAULT_METRICS_PATH: &str = "/metrics";
/// Path of the liveness endpoint.
pub const HEALTH_PATH: &str = "/health";

/// Pause after a failed `accept()`. Errors such as `EMFILE` are usually transient.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);
const HEALTH_CONTENT_TYPE: &str = "application/health+json";
const HEALTH_BODY: &str = r#"{"status":"pass"}"#;

#[derive(Clone)]
struct MetricsExporterInner {
    registry: Arc<Registry>,
    format: Format,
    metrics_path: Arc<str>,
}

impl MetricsExporterInner {
    fn render_body(&self) -> Result<String, fmt::Error> {
        let started_at = Instant::now();
        let mut buffer = String::with_capacity(4_096);
        self.registry.encode(&mut buffer, self.format)?;

        let latency = started_at.elapsed();
        let scraped_size = buffer.len();
        tracing::debug!(
            latency_sec = latency.as_secs_f64(),
            scraped_size,
            "Scraped metrics in {latency:?} (scraped size: {scraped_size}B)"
        );
        Ok(buffer)
    }

    fn render(&self) -> Response<String> {
        match self.render_body() {
            Ok(body) => text_response(StatusCode::OK, self.format.content_type(), body),
            Err(err) => {
                tracing::error!(%err, "Failed encoding metrics");
                empty_response(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    fn handle<B>(&self, request: &Request<B>) -> Response<String> {
        let path = request.uri().path();
        let method = request.method();
        let is_read = *method == Method::GET || *method == Method::HEAD;

        if path == &*self.metrics_path {
            if is_read {
                self.render()
            } else {
                method_not_allowed()
            }
        } else if path == HEALTH_PATH {
            if is_read {
                text_response(StatusCode::OK, HEALTH_CONTENT_TYPE, HEALTH_BODY.to_owned())
            } else {
                method_not_allowed()
            }
        } else {
            empty_response(StatusCode::NOT_FOUND)
        }
    }
}

fn text_response(status: StatusCode, content_type: &'static str, body: String) -> Response<String> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

fn empty_response(status: StatusCode) -> Response<String> {
    let mut response = Response::new(String::new());
    *response.status_mut() = status;
    response
}

fn method_not_allowed() -> Response<String> {
    let mut response = empty_response(StatusCode::METHOD_NOT_ALLOWED);
    response
        .headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static("GET, HEAD"));
    response
}

async fn back_off_after_accept_error(err: &io::Error) {
    tracing::warn!(%err, "Failed accepting connection; retrying in {ACCEPT_ERROR_BACKOFF:?}");
    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
}

/// Normalizes the metrics path so that it starts with a `/`.
pub fn normalize_metrics_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_owned()
    } else {
        format!("/{path}")
    }
}

/// Exporter of Cloudflare metrics to Prometheus.
///
/// The exporter serves a snapshot of a [`Registry`] on each scrape. The snapshot is served regardless of
/// the outcome of the most recent polling cycle, so scrapers get stale-but-valid data rather than no data.
///
/// # Examples
///
/// See crate-level docs for the examples of usage.
pub struct MetricsExporter<'a> {
    inner: MetricsExporterInner,
    shutdown_future: Pin<Box<dyn Future<Output = ()> + Send + 'a>>,
}

impl fmt::Debug for MetricsExporter<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("MetricsExporter")
            .field("registry", &self.inner.registry)
            .field("format", &self.inner.format)
            .field("metrics_path", &self.inner.metrics_path)
            .finish_non_exhaustive()
    }
}

impl<'a> MetricsExporter<'a> {
    /// Creates an exporter based on the provided metrics [`Registry`]. Note that the registry
    /// is in `Arc`, meaning it can be used elsewhere (e.g., to export data in another format).
    pub fn new(registry: Arc<Registry>) -> Self {
        let metric_count = registry.registered_names().len();
        tracing::info!("Created metrics exporter with {metric_count} metrics");
        Self {
            inner: MetricsExporterInner {
                registry,
                format: Format::Prometheus,
                metrics_path: DEFAULT_METRICS_PATH.into(),
            },
            shutdown_future: Box::pin(future::pending()),
        }
    }

    /// Sets the export [`Format`]. By default, [`Format::Prometheus`] is used.
    #[must_use]
    pub fn with_format(mut self, format: Format) -> Self {
        self.inner.format = format;
        self
    }

    /// Sets the path to serve metrics on. A leading `/` is added if it's missing.
    /// By default, metrics are served on [`DEFAULT_METRICS_PATH`].
    #[must_use]
    pub fn with_metrics_path(mut self, path: &str) -> Self {
        self.inner.metrics_path = normalize_metrics_path(path).into();
        self
    }

    /// Configures graceful shutdown for the exporter server.
    #[must_use]
    pub fn with_graceful_shutdown<F>(mut self, shutdown: F) -> Self
    where
        F: Future<Output = ()> + Send + 'a,
    {
        self.shutdown_future = Box::pin(shutdown);
        self
    }

    /// Starts the server on the specified address. This future resolves when the server is shut down.
    ///
    /// # Errors
    ///
    /// Returns an error if binding to the specified address fails.
    pub async fn start(self, bind_address: SocketAddr) -> io::Result<()> {
        tracing::info!("Starting Prometheus exporter web server on {bind_address}");
        self.bind(bind_address).await?.start().await?;
        tracing::info!("Prometheus metrics exporter server shut down");
        Ok(())
    }

    /// Creates an HTTP exporter server and binds it to the specified address.
    ///
    /// The server exposes the following endpoints:
    ///
    /// - `GET` on the metrics path: serves the metrics in the configured text format
    /// - `GET /health`: liveness check, independent of polling success
    ///
    /// Other methods on these paths are answered with 405; other paths with 404.
    ///
    /// # Errors
    ///
    /// Returns an error if binding to the specified address fails.
    pub async fn bind(mut self, bind_address: SocketAddr) -> io::Result<MetricsServer<'a>> {
        let listener = TcpListener::bind(bind_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(
            %local_addr,
            metrics_path = %self.inner.metrics_path,
            "Bound Prometheus exporter"
        );

        let server = async move {
            let (started_shutdown_sender, started_shutdown) = watch::channel(());
            loop {
                let stream = tokio::select! {
                    res = listener.accept() => match res {
                        Ok((stream, _)) => stream,
                        Err(err) => {
                            back_off_after_accept_error(&err).await;
                            continue;
                        }
                    },
                    () = &mut self.shutdown_future => break,
                };

                let io = TokioIo::new(stream);
                let inner = self.inner.clone();
                let mut started_shutdown = started_shutdown.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |request| {
                        let response = inner.handle(&request);
                        future::ready(Ok::<_, Infallible>(response))
                    });
                    let conn = http1::Builder::new().serve_connection(io, service);
                    tokio::pin!(conn);

                    let res = tokio::select! {
                        _ = started_shutdown.changed() => {
                            conn.as_mut().graceful_shutdown();
                            conn.await
                        }
                        res = conn.as_mut() => res,
                    };
                    if let Err(err) = res {
                        tracing::warn!(%err, "Error serving connection");
                    }
                });
            }

            tracing::info!("Stop signal received, Prometheus metrics exporter is shutting down");
            // Send the graceful shutdown signal to all alive connections.
            drop(started_shutdown);
            started_shutdown_sender.send_replace(());
            // Wait until all connections are dropped.
            started_shutdown_sender.closed().await;

            Ok(())
        };

        Ok(MetricsServer {
            server: Box::pin(server),
            local_addr,
        })
    }
}

/// Metrics server bound to a certain local address returned by [`MetricsExporter::bind()`].
///
/// Useful e.g. if you need to find out which port the server was bound to if the 0th port was specified.
#[must_use = "Server should be `start()`ed"]
pub struct MetricsServer<'a> {
    server: Pin<Box<dyn Future<Output = io::Result<()>> + Send + 'a>>,
    local_addr: SocketAddr,
}

impl fmt::Debug for MetricsServer<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("MetricsServer")
            .field("local_addr", &self.local_addr)
            .finish_non_exhaustive()
    }
}

impl MetricsServer<'_> {
    /// Returns the local address this server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Starts this server. Resolves once the server is shut down.
    ///
    /// # Errors
    ///
    /// Does not currently return errors: failed `accept()` calls are logged and retried after a short pause.
    pub async fn start(self) -> io::Result<()> {
        self.server.await
    }
}
