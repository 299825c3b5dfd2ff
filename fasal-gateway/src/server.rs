//! Gateway server setup

use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use fasal_core::store::FasalStore;

use crate::routes::create_router;
use crate::state::{AppState, GatewayConfig};

type ServerError = Box<dyn std::error::Error + Send + Sync>;

/// Binds the listen address and serves on a spawned task (port 0 picks a
/// free port). Returns the bound address and the serving task.
pub async fn start_server(
    config: &GatewayConfig,
    store: Arc<dyn FasalStore>,
) -> Result<(SocketAddr, JoinHandle<std::io::Result<()>>), ServerError> {
    let mut router: Router = create_router(AppState::new(store)).layer(TraceLayer::new_for_http());
    if config.enable_cors {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    let bound = listener.local_addr()?;
    tracing::info!("Policy gateway listening on {}", bound);

    let handle = tokio::spawn(async move { axum::serve(listener, router).await });
    Ok((bound, handle))
}

/// Serves until the process is stopped.
pub async fn run_server(config: &GatewayConfig, store: Arc<dyn FasalStore>) -> Result<(), ServerError> {
    let (_, handle) = start_server(config, store).await?;
    handle.await??;
    Ok(())
}
