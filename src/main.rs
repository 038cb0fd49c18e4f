//! K-Pop Quiz Arena binary entrypoint wiring the REST API, storage supervision and session sweeping.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{Router, http::HeaderValue};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kpop_quiz_arena::{
    config::AppConfig,
    dao::arena_store::memory::MemoryArenaStore,
    routes,
    services::{identity::IdentityProvider, worldcup_service},
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let identity = identity_provider(&config);
    let port = config.port;
    let cors = cors_layer(&config)?;

    let app_state = AppState::new(config, identity);
    install_storage(&app_state).await;
    tokio::spawn(worldcup_service::run_session_sweeper(app_state.clone()));

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state, cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

#[cfg(feature = "oauth-login")]
fn identity_provider(config: &AppConfig) -> Option<Arc<dyn IdentityProvider>> {
    use kpop_quiz_arena::services::identity::OAuthIdentityProvider;

    match OAuthIdentityProvider::from_config(&config.oauth) {
        Some(provider) => Some(Arc::new(provider)),
        None => {
            warn!("OAUTH_CLIENT_ID/OAUTH_CLIENT_SECRET not set; login is disabled");
            None
        }
    }
}

#[cfg(not(feature = "oauth-login"))]
fn identity_provider(_config: &AppConfig) -> Option<Arc<dyn IdentityProvider>> {
    warn!("built without the oauth-login feature; login is disabled");
    None
}

/// Supervise PostgreSQL when a database URL is configured, otherwise serve from memory.
async fn install_storage(state: &SharedState) {
    if let Some(url) = state.config().database_url.clone() {
        if spawn_postgres_supervisor(state, url) {
            return;
        }
    } else {
        warn!("DATABASE_URL not set; data is kept in memory and lost on restart");
    }
    state.set_store(Arc::new(MemoryArenaStore::new())).await;
}

#[cfg(feature = "postgres-store")]
fn spawn_postgres_supervisor(state: &SharedState, url: String) -> bool {
    use kpop_quiz_arena::{
        dao::{
            arena_store::{
                ArenaStore,
                postgres::{PostgresArenaStore, PostgresConfig},
            },
            storage::StorageError,
        },
        services::storage_supervisor,
    };

    let config = PostgresConfig::new(url);
    tokio::spawn(storage_supervisor::run(state.clone(), move || {
        let config = config.clone();
        async move {
            let store = PostgresArenaStore::connect(config)
                .await
                .map_err(StorageError::from)?;
            Ok::<_, StorageError>(Arc::new(store) as Arc<dyn ArenaStore>)
        }
    }));
    true
}

#[cfg(not(feature = "postgres-store"))]
fn spawn_postgres_supervisor(_state: &SharedState, _url: String) -> bool {
    warn!("built without the postgres-store feature; ignoring DATABASE_URL and keeping data in memory");
    false
}

fn cors_layer(config: &AppConfig) -> anyhow::Result<CorsLayer> {
    match &config.cors_origin {
        Some(origin) => {
            let origin = HeaderValue::from_str(origin).context("parsing CORS_ORIGIN")?;
            Ok(CorsLayer::new()
                .allow_origin(origin)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any))
        }
        None if config.environment.is_development() => Ok(CorsLayer::permissive()),
        None => {
            warn!("CORS_ORIGIN not set in production; cross-origin requests are rejected");
            Ok(CorsLayer::new())
        }
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState, cors: CorsLayer) -> Router<()> {
    routes::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
