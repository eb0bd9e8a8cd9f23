use super::address::Address;
use serde::{Deserialize, Serialize};

/// Stage of the Everscale-side contract a cross-chain transfer needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrepareStatus {
    #[default]
    Disabled,
    Pending,
    Confirmed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareState {
    pub status: PrepareStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<Address>,
}

impl PrepareState {
    pub fn confirmed(contract_address: Address) -> Self {
        Self {
            status: PrepareStatus::Confirmed,
            contract_address: Some(contract_address),
        }
    }

    /// A reported contract address counts as confirmation even if the status lags.
    pub fn is_confirmed(&self) -> bool {
        self.status == PrepareStatus::Confirmed || self.contract_address.is_some()
    }
}
