//! HTTP server for Prometheus metrics endpoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info, warn};

use crate::client::{BeestatClient, FetchError};
use crate::exposition::Exposition;

/// Content type of the Prometheus text exposition format.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Application state shared across handlers. Immutable; every scrape
/// fetches and transforms a fresh snapshot.
#[derive(Clone)]
struct AppState {
    client: Arc<BeestatClient>,
    exposition: Arc<Exposition>,
}

/// Create the HTTP router.
fn create_router(
    client: Arc<BeestatClient>,
    exposition: Arc<Exposition>,
    metrics_path: &str,
) -> Router {
    let state = AppState { client, exposition };

    Router::new()
        .route(metrics_path, get(metrics_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Handler for the metrics endpoint.
async fn metrics_handler(State(state): State<AppState>) -> Response {
    let started = Instant::now();

    let snapshot = match state.client.poll().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            let status = fetch_error_status(&e);
            if e.is_malformed_payload() {
                error!(error = %e, "Malformed beestat payload");
            } else {
                warn!(error = %e, "Failed to fetch thermostats from beestat");
            }
            return (status, format!("{}\n", e)).into_response();
        }
    };

    match state
        .exposition
        .render(&snapshot.thermostats, &snapshot.runtime_profiles)
    {
        Ok(body) => {
            debug!(
                thermostats = snapshot.thermostats.len(),
                bytes = body.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Served scrape"
            );
            (StatusCode::OK, [("content-type", CONTENT_TYPE)], body).into_response()
        }
        Err(e) => {
            error!(error = %e, "Malformed beestat payload");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("{}\n", e)).into_response()
        }
    }
}

/// Map a fetch failure to the scrape response status.
fn fetch_error_status(err: &FetchError) -> StatusCode {
    if err.is_malformed_payload() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::BAD_GATEWAY
    }
}

/// Handler for the /health endpoint.
async fn health_handler() -> Response {
    (StatusCode::OK, "healthy\n").into_response()
}

/// HTTP server configuration.
pub struct HttpServer {
    client: Arc<BeestatClient>,
    exposition: Arc<Exposition>,
    listen_addr: SocketAddr,
    metrics_path: String,
}

impl HttpServer {
    /// Create a new HTTP server.
    pub fn new(
        client: Arc<BeestatClient>,
        exposition: Arc<Exposition>,
        listen_addr: SocketAddr,
        metrics_path: String,
    ) -> Self {
        Self {
            client,
            exposition,
            listen_addr,
            metrics_path,
        }
    }

    /// Build the router without binding, for embedding or testing.
    pub fn router(&self) -> Router {
        create_router(
            self.client.clone(),
            self.exposition.clone(),
            &self.metrics_path,
        )
    }

    /// Run the HTTP server until the shutdown signal is received.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", self.listen_addr, e))?;

        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until the shutdown signal is received.
    pub async fn serve(
        self,
        listener: tokio::net::TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let router = self.router();
        let addr = listener.local_addr()?;

        info!(
            addr = %addr,
            path = %self.metrics_path,
            upstream = %self.client.base_url(),
            "HTTP server listening"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                loop {
                    if shutdown.changed().await.is_err() {
                        break;
                    }
                    if *shutdown.borrow() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
            .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

        info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BeestatConfig;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn unreachable_client() -> Arc<BeestatClient> {
        let config = BeestatConfig {
            api_key: "test".to_string(),
            base_url: "http://127.0.0.1:1".to_string(),
            timeout_secs: 2,
            sync: false,
        };
        Arc::new(BeestatClient::new(&config).unwrap())
    }

    fn make_router(path: &str) -> Router {
        create_router(unreachable_client(), Arc::new(Exposition::default()), path)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = make_router("/metrics")
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_upstream_unreachable() {
        let response = make_router("/metrics")
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_custom_metrics_path() {
        let router = make_router("/beestat/metrics");

        let response = router
            .clone()
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = router
            .oneshot(
                Request::get("/beestat/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_fetch_error_status() {
        let malformed = FetchError::from(beestat_common::Error::malformed("x"));
        assert_eq!(
            fetch_error_status(&malformed),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let upstream = FetchError::Status {
            resource: "thermostat",
            method: "read_id",
            status: reqwest::StatusCode::UNAUTHORIZED,
        };
        assert_eq!(fetch_error_status(&upstream), StatusCode::BAD_GATEWAY);
    }
}
