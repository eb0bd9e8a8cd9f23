// Collaborators of the transfer-prepare flow. The bridge UI state, the transfer
// being reviewed and the EVER wallet connection live outside this crate.

use crate::{error::Result, models::PrepareState};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Evm,
    Everscale,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkShape {
    pub chain_id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub network_type: NetworkType,
    pub currency_symbol: String,
}

/// Snapshot of the EVER wallet connection flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WalletReadiness {
    pub is_ready: bool,
    pub is_connecting: bool,
    pub is_connected: bool,
    pub is_initializing: bool,
}

#[async_trait::async_trait]
pub trait EverWallet: Send + Sync {
    fn readiness(&self) -> WalletReadiness;

    async fn connect(&self) -> Result<()>;
}

/// Bridge form state for the interactive (pre-transfer) flow.
#[async_trait::async_trait]
pub trait BridgeProvider: Send + Sync {
    /// Deploys/prepares the Everscale-side contract; resolves once the
    /// preparation round is over.
    async fn prepare_everscale_to_evm(&self) -> Result<()>;

    fn ever_wallet(&self) -> Arc<dyn EverWallet>;

    fn left_network(&self) -> Option<NetworkShape>;
}

/// Read-only view of a transfer; `contract_address` is set once it exists on-chain.
pub trait TransferProvider: Send + Sync {
    fn contract_address(&self) -> Option<String>;

    fn prepare_state(&self) -> Option<PrepareState>;

    fn ever_wallet(&self) -> Arc<dyn EverWallet>;

    fn left_network(&self) -> Option<NetworkShape>;
}
