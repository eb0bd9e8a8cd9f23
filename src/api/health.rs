use axum::{extract::State, Json};
use serde::Serialize;

use super::AppState;
use crate::constants::API_VERSION;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub api_version: String,
    pub environment: String,
    pub cached_wallet_addresses: usize,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        api_version: API_VERSION.to_string(),
        environment: state.config.environment.clone(),
        cached_wallet_addresses: state.wallets.cached_wallet_addresses().await,
    })
}
