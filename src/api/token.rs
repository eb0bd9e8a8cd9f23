use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::{
    error::{AppError, Result},
    models::{Address, ApiResponse, CustomToken},
    services::BalanceRequest,
    utils::format_balance,
};

use super::AppState;

#[derive(Debug, Serialize)]
pub struct WalletAddressResponse {
    pub root: Address,
    pub owner: Address,
    pub wallet: Address,
}

#[derive(Debug, Serialize)]
pub struct TokenBalanceResponse {
    pub token: CustomToken,
    pub owner: Address,
    /// `None` when the owner has no deployed token wallet yet.
    pub formatted_balance: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WalletBalanceResponse {
    pub wallet: Address,
    pub balance: String,
}

// Internal helper that supports `token_not_found` operations.
fn token_not_found(root: &str) -> AppError {
    AppError::NotFound(format!("token root {} is not deployed", root.trim()))
}

/// GET /api/v1/tokens/{root}
pub async fn get_token(
    State(state): State<AppState>,
    Path(root): Path<String>,
) -> Result<Json<ApiResponse<CustomToken>>> {
    let token = state
        .wallets
        .token_data(&root)
        .await?
        .ok_or_else(|| token_not_found(&root))?;

    Ok(Json(ApiResponse::success(token)))
}

/// GET /api/v1/tokens/{root}/wallets/{owner}
pub async fn get_wallet_address(
    State(state): State<AppState>,
    Path((root, owner)): Path<(String, String)>,
) -> Result<Json<ApiResponse<WalletAddressResponse>>> {
    let wallet = state.wallets.wallet_address(&root, &owner, None).await?;

    Ok(Json(ApiResponse::success(WalletAddressResponse {
        root: Address::parse(&root)?,
        owner: Address::parse(&owner)?,
        wallet,
    })))
}

/// GET /api/v1/tokens/{root}/balances/{owner}
///
/// An undeployed owner wallet is not an error here; the token comes back
/// without a balance.
pub async fn get_token_balance(
    State(state): State<AppState>,
    Path((root, owner)): Path<(String, String)>,
) -> Result<Json<ApiResponse<TokenBalanceResponse>>> {
    let owner_address = Address::parse(&owner)?;

    let token = match state.wallets.token_with_balance(&root, &owner).await {
        Ok(token) => token.ok_or_else(|| token_not_found(&root))?,
        Err(err) => {
            if err.is_transient() {
                tracing::warn!("Token balance read failed: {}", err);
            }
            return Err(err);
        }
    };

    let formatted_balance = token
        .balance
        .as_deref()
        .map(|raw| format_balance(raw, token.decimals))
        .transpose()?;

    Ok(Json(ApiResponse::success(TokenBalanceResponse {
        token,
        owner: owner_address,
        formatted_balance,
    })))
}

/// GET /api/v1/wallets/{wallet}/balance
pub async fn get_wallet_balance(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
) -> Result<Json<ApiResponse<WalletBalanceResponse>>> {
    let balance = state
        .wallets
        .balance(&BalanceRequest::direct(wallet.as_str()), None)
        .await?;

    Ok(Json(ApiResponse::success(WalletBalanceResponse {
        wallet: Address::parse(&wallet)?,
        balance,
    })))
}
