use std::sync::Arc;

use aimkg_rs::driver::Neo4jStore;
use aimkg_rs::embedder::{AnyEmbedder, CacheConfig, CachedEmbedder, EmbedderClient};
use aimkg_rs::index::IndexCatalog;
use aimkg_rs::search::Recommender;
use aimkg_rs::AimkgConfig;
use tokio::signal;
use tracing::{error, info};

use aimkg_server::{config::ServerConfig, init_tracing, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Tracing ───────────────────────────────────────────────────────────────
    init_tracing()?;
    info!("aimkg-server starting");

    // ── Config ────────────────────────────────────────────────────────────────
    let config = AimkgConfig::from_env().map_err(|e| {
        error!("Configuration error: {}", e);
        e
    })?;
    let server = ServerConfig::from_env().map_err(|e| {
        error!("Configuration error: {}", e);
        e
    })?;

    info!(
        neo4j = %config.neo4j_uri,
        embedding_backend = %config.embedding_backend,
        index_dir = %config.index_dir.display(),
        addr = %server.bind_addr,
        "configuration loaded"
    );

    // ── Recommender ───────────────────────────────────────────────────────────
    let store = Neo4jStore::connect(&config).await?;
    let embedder = CachedEmbedder::new(AnyEmbedder::from_config(&config), CacheConfig::default());
    info!(model = embedder.model(), dim = embedder.dim(), "embedder ready");
    let catalog = IndexCatalog::new(&config.index_dir, server.index_cache_ttl);
    let recommender = Arc::new(Recommender::new(store, embedder, catalog, &config));

    // ── Axum router ───────────────────────────────────────────────────────────
    let app = routes::router(recommender);

    // ── Listen ────────────────────────────────────────────────────────────────
    info!(addr = %server.bind_addr, "listening");
    let listener = tokio::net::TcpListener::bind(server.bind_addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

/// Graceful shutdown on SIGTERM or Ctrl-C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { info!("received Ctrl-C, shutting down"); }
        _ = terminate => { info!("received SIGTERM, shutting down"); }
    }
}
