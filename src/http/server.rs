//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router sending every path and method to the echo handler
//! - Wire up middleware (tracing, capture, panic containment)
//! - Serve HTTP/1.1 and cleartext HTTP/2 on a bound listener
//! - Stop accepting on the shutdown signal

use std::sync::Arc;

use axum::{middleware, routing::any, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::capture::{capture_requests, CaptureState, LogSink};
use crate::config::InspectorConfig;
use crate::http::echo::echo_handler;

/// HTTP server for the request inspector.
pub struct InspectorServer {
    router: Router,
}

impl InspectorServer {
    /// Create a new server writing records to `sink`.
    pub fn new(config: InspectorConfig, sink: Arc<dyn LogSink>) -> Self {
        Self {
            router: Self::build_router(&config, sink),
        }
    }

    fn build_router(config: &InspectorConfig, sink: Arc<dyn LogSink>) -> Router {
        let routes = Router::new()
            .route("/{*path}", any(echo_handler))
            .route("/", any(echo_handler));

        with_capture(routes, CaptureState::new(sink, config.capture.clone()))
            .layer(TraceLayer::new_for_http())
    }

    /// The fully layered router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Put the capture stage in front of `routes`.
///
/// Panics inside `routes` become a 500 before the capture stage sees the
/// response, so they are still recorded.
pub fn with_capture(routes: Router, state: CaptureState) -> Router {
    routes
        .layer(CatchPanicLayer::new())
        .layer(middleware::from_fn_with_state(state, capture_requests))
}
