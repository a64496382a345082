//! Gate HTTP Server
//!
//! Sample application: a gated root route plus an ungated health check.

use crate::adapters::inbound::gate_layer::protect;
use crate::application::GeoGateService;
use crate::domain::entities::GeoContext;
use crate::infrastructure::ShutdownController;
use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Build the application router.
///
/// `GET /` is gated; `GET /health` is not.
pub fn build_router(service: Arc<GeoGateService>) -> Router {
    let gated = protect(Router::new().route("/", get(root_handler)), service);

    Router::new()
        .route("/health", get(health_handler))
        .merge(gated)
        .layer(TraceLayer::new_for_http())
}

/// HTTP server hosting the gated application.
pub struct GateServer {
    listen_addr: String,
    service: Arc<GeoGateService>,
}

impl GateServer {
    pub fn new(listen_addr: String, service: Arc<GeoGateService>) -> Self {
        Self {
            listen_addr,
            service,
        }
    }

    /// Bind the configured address and serve until shutdown.
    #[cfg_attr(coverage_nightly, coverage(off))]
    pub async fn run(&self, shutdown: ShutdownController) -> anyhow::Result<()> {
        let listener = TcpListener::bind(&self.listen_addr).await?;
        self.run_with_listener(listener, shutdown).await
    }

    /// Serve on an already bound listener until shutdown.
    ///
    /// In-flight requests are allowed to finish once shutdown begins.
    pub async fn run_with_listener(
        &self,
        listener: TcpListener,
        shutdown: ShutdownController,
    ) -> anyhow::Result<()> {
        let app = build_router(self.service.clone());
        tracing::info!("geo gate listening on {}", listener.local_addr()?);

        let mut shutdown_rx = shutdown.subscribe();
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            if !shutdown.is_shutdown() {
                let _ = shutdown_rx.recv().await;
            }
        })
        .await?;

        tracing::info!("geo gate stopped");
        Ok(())
    }
}

// Handler functions

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn root_handler(Extension(ctx): Extension<GeoContext>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "statusCode": 200,
            "message": format!(
                "Allowed request from IP: {}, Country: {}, City: {}",
                ctx.ip, ctx.location.country, ctx.location.city
            ),
        })),
    )
}
