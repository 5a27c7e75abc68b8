//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, body limit, request ID)
//! - Bind server to listener
//! - Drain in-flight bids on shutdown

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::bidding::BidService;
use crate::blockchain::client::ChainClient;
use crate::config::RelayConfig;
use crate::http::{bid, health};
use crate::lifecycle::shutdown::wait_for;
use crate::lifecycle::Runtime;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<BidService>,
    pub chain: Arc<dyn ChainClient>,
}

impl From<Runtime> for AppState {
    fn from(runtime: Runtime) -> Self {
        Self {
            service: runtime.service,
            chain: runtime.chain,
        }
    }
}

/// HTTP server for the bid relay.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RelayConfig, runtime: Runtime) -> Self {
        let router = Self::build_router(&config, AppState::from(runtime));
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        Router::new()
            .route("/bid", post(bid::place_bid))
            .route("/health", get(health::health))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
                    .layer(DefaultBodyLimit::max(config.security.max_body_size)),
            )
    }

    /// The fully layered router, for in-process requests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then let in-flight bids finish.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "Bid relay listening"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(wait_for(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
