use std::{env, future::Future, net::SocketAddr, sync::Arc};

use axum::Router;
use configs::AppConfig;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::routes::{self, ServerState};
use service::{
    image::{mock::MockImageHost, HttpImageHost, ImageHost},
    runtime,
    store::JsonDocumentStore,
    RestaurantService,
};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Host/port from config, overridden by `SERVER_HOST` / `SERVER_PORT` when set
fn load_bind_addr(cfg: &configs::ServerConfig) -> anyhow::Result<SocketAddr> {
    let host = env::var("SERVER_HOST").unwrap_or_else(|_| cfg.host.clone());
    let port = env::var("SERVER_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(cfg.port);
    Ok(format!("{}:{}", host, port).parse()?)
}

fn build_image_host(cfg: &AppConfig) -> Result<Arc<dyn ImageHost>, StartupError> {
    if cfg.image_host.client_id.trim().is_empty() {
        warn!("image_host.client_id not set; uploads go to the in-process mock host");
        return Ok(Arc::new(MockImageHost::default()));
    }
    let host = HttpImageHost::from_config(&cfg.image_host).map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    info!(endpoint = %cfg.image_host.endpoint, "image host configured");
    Ok(Arc::new(host))
}

/// Open the document store and wire the restaurant service from configuration
pub async fn build_state(cfg: &AppConfig) -> Result<ServerState, StartupError> {
    let path = cfg.storage.file_path();
    let store = JsonDocumentStore::open(&path)
        .await
        .map_err(|e| StartupError::Storage(format!("{}: {e}", path.display())))?;
    info!(path = %path.display(), "document store opened");

    let restaurants = RestaurantService::new(
        Arc::new(store),
        build_image_host(cfg)?,
        Arc::new(cfg.catalog.clone()),
        cfg.storage.collections.clone(),
    );
    Ok(ServerState { restaurants: Arc::new(restaurants) })
}

/// Resolves on Ctrl+C; a broken signal handler never triggers shutdown.
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received Ctrl+C, draining connections"),
        Err(e) => {
            warn!(error = %e, "cannot listen for Ctrl+C; shutdown only by process exit");
            std::future::pending::<()>().await
        }
    }
}

/// Serve until Ctrl+C. Logging and configuration are the caller's job.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    serve(cfg, shutdown_signal()).await
}

/// Build the app from `cfg` and serve it; in-flight requests finish once `shutdown` resolves.
pub async fn serve<F>(cfg: AppConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    runtime::ensure_env(&config_path, &cfg.storage.data_dir).await?;

    let state = build_state(&cfg).await?;
    let app: Router = routes::build_router(state, build_cors());

    let addr = load_bind_addr(&cfg.server)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "restaurant server listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    info!("restaurant server stopped");
    Ok(())
}
