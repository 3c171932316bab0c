use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use stateset_insights as insights;
use stateset_insights::services::{HistoryProvider, JsonFileHistory, StaticHistory};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = insights::config::load_config().context("failed to load configuration")?;
    insights::config::init_tracing(cfg.log_level(), cfg.log_json);

    let provider: Arc<dyn HistoryProvider> = match cfg.snapshot_path.as_deref() {
        Some(path) => {
            info!(path, "serving insights from snapshot file");
            Arc::new(JsonFileHistory::new(path))
        }
        None => {
            warn!("no snapshot_path configured; GET insights will report an empty history");
            Arc::new(StaticHistory::default())
        }
    };

    let cors_layer = if cfg.is_development() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", cfg.host, cfg.port))?;
    let app = insights::app(insights::AppState::new(cfg, provider)).layer(cors_layer);

    info!("stateset-insights listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM. A handler that cannot be
/// installed never fires.
async fn shutdown_signal() {
    let name = tokio::select! {
        name = interrupt() => name,
        name = terminate() => name,
    };
    info!(signal = name, "draining connections before shutdown");
}

async fn interrupt() -> &'static str {
    if let Err(err) = signal::ctrl_c().await {
        warn!("Ctrl+C handler unavailable: {}", err);
        std::future::pending::<()>().await;
    }
    "SIGINT"
}

#[cfg(unix)]
async fn terminate() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(err) => {
            warn!("SIGTERM handler unavailable: {}", err);
            return std::future::pending().await;
        }
    };
    sigterm.recv().await;
    "SIGTERM"
}

#[cfg(not(unix))]
async fn terminate() -> &'static str {
    std::future::pending().await
}
