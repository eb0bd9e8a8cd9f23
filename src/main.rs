use axum::http::HeaderValue;
use axum::{routing::get, Router};
use std::net::SocketAddr;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ever_token_bridge::{api, config::Config, constants::API_VERSION, services::TokenWallet};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ever_token_bridge=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting Everscale token bridge service");
    tracing::info!(
        "Environment: {} (testnet: {})",
        config.environment,
        config.is_testnet()
    );
    tracing::info!("API Version: {}", API_VERSION);
    tracing::info!("EVER RPC: {}", config.ever_rpc_url);

    let wallets = TokenWallet::from_config(&config)?;
    let app_state = api::AppState::new(config.clone(), wallets);

    let app = build_router(app_state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: api::AppState) -> Router {
    let cors = cors_from_config(&state.config);

    Router::new()
        .route("/health", get(api::health::health_check))
        .route("/api/v1/tokens/{root}", get(api::token::get_token))
        .route(
            "/api/v1/tokens/{root}/wallets/{owner}",
            get(api::token::get_wallet_address),
        )
        .route(
            "/api/v1/tokens/{root}/balances/{owner}",
            get(api::token::get_token_balance),
        )
        .route(
            "/api/v1/wallets/{wallet}/balance",
            get(api::token::get_wallet_balance),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_from_config(config: &Config) -> CorsLayer {
    let raw = config.cors_allowed_origins.trim();
    if raw.is_empty() || raw == "*" {
        return CorsLayer::very_permissive();
    }

    let allowed: Vec<HeaderValue> = raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if allowed.is_empty() {
        tracing::warn!("No valid CORS origins parsed; falling back to permissive");
        return CorsLayer::very_permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
