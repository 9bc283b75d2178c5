use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use axum_server::Handle;
use tokio::net::{TcpListener, lookup_host};
use tracing::{Level, info};

use linkboard::config::AppConfig;
use linkboard::database::init_db;
use linkboard::state::AppState;
use linkboard::store::LinkStore;
use linkboard::tls::load_rustls_config;
use linkboard::{build_redirect_router, build_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load().context("Failed to load config")?;

    let tls = load_rustls_config(&config.tls)
        .await
        .context("Failed to load TLS key/certificate/CA")?;

    let db = init_db(&config.database)
        .await
        .context("Failed to initialize database")?;
    info!("Database connection established");

    let host = config.server.host.clone();
    let port = config.server.port;
    let redirect = config.redirect.clone();

    let addr = lookup_host((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to resolve {host}:{port}"))?
        .next()
        .with_context(|| format!("No address for {host}:{port}"))?;

    let handle = Handle::new();
    tokio::spawn(shutdown_on_signal(handle.clone()));

    let app = build_router(AppState::new(config, LinkStore::new(db)));
    let api = axum_server::bind_rustls(addr, tls)
        .handle(handle)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>());
    info!("API server listening on https://{addr}");

    if !redirect.enabled {
        api.await.context("API server failed")?;
        return Ok(());
    }

    let redirect_listener = TcpListener::bind((host.as_str(), redirect.port))
        .await
        .with_context(|| format!("Failed to bind {host}:{}", redirect.port))?;
    info!(
        https_port = redirect.https_port,
        "Redirect server listening on {}",
        redirect_listener.local_addr()?
    );

    let redirect_server = axum::serve(redirect_listener, build_redirect_router(redirect))
        .with_graceful_shutdown(shutdown_signal());

    tokio::try_join!(api, redirect_server.into_future())?;
    Ok(())
}

async fn shutdown_on_signal(handle: Handle) {
    shutdown_signal().await;
    handle.graceful_shutdown(Some(Duration::from_secs(10)));
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
