use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::get,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::aggregator::Aggregator;
use crate::cache::SnapshotCache;
use crate::documents::DocumentFetcher;
use crate::source::{FederalRegisterClient, FetchError, RegisterSource};
use crate::{config::AppConfig, handlers, middleware as app_middleware};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<SnapshotCache>,
    pub fetcher: DocumentFetcher,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(cfg: &AppConfig, source: Arc<dyn RegisterSource>) -> Self {
        let fetcher = DocumentFetcher::from_config(source, cfg);
        let aggregator = Aggregator::from_config(fetcher.clone(), cfg);
        Self {
            cache: Arc::new(SnapshotCache::new(aggregator, cfg.cache_ttl())),
            fetcher,
            config: Arc::new(cfg.clone()),
        }
    }
}

pub struct FedregServer {
    addr: SocketAddr,
    app: Router,
}

/// Router backed by the real Federal Register client.
pub fn build_app(cfg: &AppConfig) -> Result<Router, FetchError> {
    let client = FederalRegisterClient::new(&cfg.upstream)?;
    Ok(build_app_with_source(cfg, Arc::new(client)))
}

pub fn build_app_with_source(cfg: &AppConfig, source: Arc<dyn RegisterSource>) -> Router {
    router(AppState::new(cfg, source))
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_bytes;
    Router::new()
        // HTML pages
        .route("/", get(handlers::index))
        .route("/recent", get(handlers::recent_page))
        // JSON API
        .route("/api", get(handlers::api_index))
        .route("/api/agency-stats", get(handlers::agency_stats))
        .route("/api/recent", get(handlers::recent_api))
        .route("/api/agency/{slug}", get(handlers::agency_detail))
        .route("/api/agencies/search", get(handlers::search_agency))
        .route("/api/health", get(handlers::health))
        .route("/refresh", get(handlers::refresh).post(handlers::refresh))
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
        // Middleware stack (order: request id -> compression/cors/trace -> body limit)
        .layer(middleware::from_fn(app_middleware::request_id))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .headers()
                        .get(app_middleware::REQUEST_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
    source: Option<Arc<dyn RegisterSource>>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
            source: None,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    /// Use a custom upstream instead of the Federal Register client.
    pub fn with_source(mut self, source: Arc<dyn RegisterSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn build(self) -> Result<FedregServer, FetchError> {
        let app = match self.source {
            Some(source) => build_app_with_source(&self.config, source),
            None => build_app(&self.config)?,
        };

        Ok(FedregServer {
            addr: self.addr,
            app,
        })
    }
}

impl FedregServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
