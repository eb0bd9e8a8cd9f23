use super::address::Address;
use serde::{Deserialize, Serialize};

/// Token root metadata merged with the (optional) per-owner wallet read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomToken {
    pub root: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: String,
    pub root_owner_address: Address,
    pub root_public_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet: Option<Address>,
    pub is_updating: bool,
    pub is_updating_wallet_address: bool,
    /// Unix milliseconds of the metadata read.
    pub updated_at: i64,
}

impl CustomToken {
    pub fn from_details(root: Address, details: TokenDetails) -> Self {
        Self {
            root,
            name: details.name,
            symbol: details.symbol,
            decimals: details.decimals,
            total_supply: details.total_supply,
            root_owner_address: details.root_owner_address,
            root_public_key: details.root_public_key,
            icon: None,
            balance: None,
            wallet: None,
            is_updating: false,
            is_updating_wallet_address: false,
            updated_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn begin_update(&mut self) {
        self.is_updating = true;
    }

    /// Clears the in-flight flag whether or not the balance read succeeded.
    pub fn finish_update(&mut self, balance: Option<String>) {
        if balance.is_some() {
            self.balance = balance;
            self.updated_at = chrono::Utc::now().timestamp_millis();
        }
        self.is_updating = false;
    }

    pub fn begin_wallet_update(&mut self) {
        self.is_updating_wallet_address = true;
    }

    pub fn finish_wallet_update(&mut self, wallet: Option<Address>) {
        if wallet.is_some() {
            self.wallet = wallet;
        }
        self.is_updating_wallet_address = false;
    }
}

/// Decoded `getDetails` output of a token root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDetails {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: String,
    pub root_owner_address: Address,
    pub root_public_key: String,
}
