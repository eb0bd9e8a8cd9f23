// src/api/mod.rs

pub mod health;
pub mod token;

use crate::config::Config;
use crate::services::TokenWallet;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub wallets: Arc<TokenWallet>,
}

impl AppState {
    pub fn new(config: Config, wallets: TokenWallet) -> Self {
        Self {
            config,
            wallets: Arc::new(wallets),
        }
    }
}
