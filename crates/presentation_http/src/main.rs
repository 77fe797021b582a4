//! Articles HTTP Server
//!
//! Main entry point for the HTTP API server.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use application::ports::ArticleStore;
use infrastructure::{AppConfig, InMemoryArticleStore, SecurityValidator};
use presentation_http::{
    AppState, PipelineConfig, middleware::spawn_cleanup_task, routes::create_app,
};
use tokio::{net::TcpListener, signal, sync::watch};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "articles_server=info,presentation_http=info,application=info,infrastructure=info,tower_http=info";

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Configuration decides the log format, so it is loaded before tracing
    let (config, load_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    init_tracing(config.server.json_logs());

    info!("Articles server v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Some(e) = load_error {
        warn!("Failed to load config, using defaults: {}", e);
    }

    let warnings = SecurityValidator::validate(&config);
    SecurityValidator::log_warnings(&warnings);
    if SecurityValidator::should_block_startup(&config, &warnings) {
        anyhow::bail!(
            "refusing to start with critical security warnings; fix the configuration or set {}=true",
            infrastructure::validation::ALLOW_INSECURE_ENV
        );
    }

    info!(
        host = %config.server.host,
        port = %config.server.port,
        environment = ?config.environment,
        api_keys = config.security.api_keys.len(),
        rate_limit_enabled = config.security.rate_limit_enabled,
        "Configuration loaded"
    );

    let store: Arc<dyn ArticleStore> = if config.store.seed_demo_articles {
        Arc::new(InMemoryArticleStore::with_demo_articles())
    } else {
        Arc::new(InMemoryArticleStore::new())
    };

    let pipeline = PipelineConfig::from_app_config(&config);
    let state = AppState::new(store, &pipeline.rate_limit);

    let cleanup = spawn_cleanup_task(
        Arc::clone(&state.rate_limiter),
        Duration::from_secs(config.security.rate_limit_cleanup_interval_secs.max(1)),
        Duration::from_secs(config.security.rate_limit_cleanup_max_age_secs),
    );

    let app = create_app(state, &pipeline);

    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_secs.unwrap_or(30));
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    })
    .into_future();

    tokio::select! {
        result = server => result?,
        () = async {
            let _ = shutdown_rx.wait_for(|requested| *requested).await;
            info!("Waiting up to {:?} for connections to close...", shutdown_timeout);
            tokio::time::sleep(shutdown_timeout).await;
        } => {
            warn!("Shutdown timeout elapsed, closing remaining connections");
        }
    }

    cleanup.abort();
    info!("Server shutdown complete");

    Ok(())
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        // Log error but continue waiting - this is a best-effort signal handler
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
