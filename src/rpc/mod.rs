pub mod jrpc_client;
#[cfg(test)]
pub mod testing;

pub use jrpc_client::JrpcClient;

use crate::{error::Result, models::Address};
use serde::{Deserialize, Serialize};

/// Point-in-time snapshot of a contract account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractState {
    #[serde(default)]
    pub balance: String,
    #[serde(default)]
    pub gen_timings: GenTimings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transaction_id: Option<LastTransactionId>,
    pub is_deployed: bool,
    #[serde(default)]
    pub boc: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenTimings {
    #[serde(default)]
    pub gen_lt: String,
    #[serde(default)]
    pub gen_utime: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastTransactionId {
    pub is_exact: bool,
    pub lt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

/// A read-only ABI method invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractCall {
    pub abi: &'static str,
    pub method: &'static str,
    pub params: serde_json::Value,
}

impl ContractCall {
    pub fn new(abi: &'static str, method: &'static str, params: serde_json::Value) -> Self {
        Self {
            abi,
            method,
            params,
        }
    }
}

/// Contract-call capability the token wallet core depends on.
///
/// Implementations must not sign or broadcast anything; every call is a local
/// run against the latest (or the supplied cached) account state.
#[async_trait::async_trait]
pub trait ContractRpc: Send + Sync {
    /// Returns `Ok(None)` when the node has no account state for `address`.
    async fn get_full_contract_state(&self, address: &Address) -> Result<Option<ContractState>>;

    /// Runs `call` locally and returns the decoded ABI output object.
    async fn run_local(
        &self,
        address: &Address,
        call: ContractCall,
        cached_state: Option<&ContractState>,
    ) -> Result<serde_json::Value>;
}
