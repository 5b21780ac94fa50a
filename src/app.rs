/*
 * Responsibility
 * - tracing / panic hook の初期化
 * - Config読み込み → 依存生成 (store, AuthService) → Router 組み立て
 * - Middleware の適用 (auth / security headers / CORS / HTTP)
 * - axum::serve() で起動、Ctrl-C / SIGTERM で graceful shutdown
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::{self, handlers::health::health};
use crate::config::Config;
use crate::middleware;
use crate::services::auth::build_auth_service;
use crate::services::id_codec::IdCodec;
use crate::services::store::{DocumentStore, MemoryStore, PgStore};
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,todo_api=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // stderr can be hidden depending on how the process is launched
        tracing::error!(?info, "panic");

        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env().context("failed to load configuration")?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let id_codec = IdCodec::new(config.sqids_min_length, &config.sqids_alphabet)
        .context("invalid SQIDS_* configuration")?;

    let store: Arc<dyn DocumentStore> = match &config.database_url {
        Some(url) => Arc::new(
            PgStore::connect(url, id_codec)
                .await
                .context("failed to connect to the database")?,
        ),
        None => {
            tracing::warn!("DATABASE_URL is not set; using the in-memory store");
            Arc::new(MemoryStore::new(id_codec))
        }
    };

    let auth = build_auth_service(&config.auth).context("invalid AUTH_JWT_* configuration")?;

    Ok(AppState::new(store, auth))
}

/// Routes with authentication applied, before the outer HTTP layers.
///
/// `/health` stays outside the authenticator.
pub fn router(state: AppState) -> Router {
    let api = middleware::auth::access::apply(api::routes(&state), state.clone());

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .with_state(state)
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let app = router(state);
    let app = middleware::security_headers::apply(app);
    let app = middleware::cors::apply(app, config);
    middleware::http::apply(app, &config.http)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
