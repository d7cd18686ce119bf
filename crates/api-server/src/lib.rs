//! coinwatch API server
//!
//! Issues bearer tokens, proxies CoinGecko prices, and serves each caller's
//! persistent watchlist.

pub mod auth;
mod auth_routes;
mod coin_routes;
pub mod config;
pub mod request_id;
mod security_headers;
mod watchlist_routes;

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use coingecko_client::{CoinGeckoClient, MarketDataError, MarketDataProvider};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use watchlist_store::{StoreError, WatchlistStore};

use auth::{AuthError, TokenIssuer};
use config::ServerConfig;

/// Shared handler state. Cloned per request; everything heavy is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<WatchlistStore>,
    pub market_data: Arc<dyn MarketDataProvider>,
    pub tokens: Arc<TokenIssuer>,
    pub enable_hsts: bool,
}

/// Error type returned by handlers.
///
/// Validation failures and lookups that miss are answered directly; anything
/// else is logged and reported as a 500 carrying the error message.
#[derive(Debug)]
pub enum AppError {
    InvalidInput(String),
    NotFound,
    Internal(anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidInput(msg) => AppError::InvalidInput(msg),
            StoreError::NotFound => AppError::NotFound,
            other => AppError::Internal(other.into()),
        }
    }
}

impl From<MarketDataError> for AppError {
    fn from(err: MarketDataError) -> Self {
        AppError::Internal(err.into())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Internal(err.into())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound => (StatusCode::NOT_FOUND, "No encontrado".to_string()),
            AppError::Internal(err) => {
                tracing::error!("Request failed: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Assemble every route and middleware around `state`.
pub fn build_router(state: AppState) -> Router {
    let routes = Router::new()
        .merge(auth_routes::auth_routes())
        .merge(coin_routes::coin_routes())
        .merge(watchlist_routes::watchlist_routes(state.clone()))
        .route("/health", get(health))
        .fallback(route_not_found);

    with_middleware(routes, state)
}

/// Outermost first: tracing span, request id, security headers, panic
/// recovery. Security headers sit outside panic recovery so the 500 built
/// for a panic carries them too.
fn with_middleware(routes: Router<AppState>, state: AppState) -> Router {
    routes
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(|request: &Request<Body>| {
                            tracing::info_span!(
                                "request",
                                method = %request.method(),
                                uri = %request.uri(),
                                request_id = tracing::field::Empty,
                            )
                        })
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(middleware::from_fn(request_id::request_id_middleware))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    security_headers::security_headers_middleware,
                ))
                .layer(CatchPanicLayer::custom(handle_panic)),
        )
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn route_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Ruta no encontrada" })),
    )
        .into_response()
}

/// Turn a handler panic into a 500 so the server keeps serving.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!("Handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Error interno" })),
    )
        .into_response()
}

fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
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
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Shutdown signal received");
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env()?;
    tracing::info!("Watchlist file: {}", config.watchlist_path.display());
    tracing::info!("Market data: {}", config.coingecko_base_url);
    tracing::info!("Token lifetime: {}s", config.token_ttl_secs);

    let store = Arc::new(WatchlistStore::open(config.watchlist_path.clone()).await);

    let market_data = CoinGeckoClient::new(
        config.coingecko_base_url.clone(),
        Duration::from_secs(config.coingecko_timeout_secs),
    )
    .context("Failed to build CoinGecko client")?;

    let state = AppState {
        store,
        market_data: Arc::new(market_data),
        tokens: Arc::new(TokenIssuer::new(
            config.jwt_secret.as_bytes(),
            config.token_ttl_secs,
        )),
        enable_hsts: config.enable_hsts,
    };

    let app = build_router(state);

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
