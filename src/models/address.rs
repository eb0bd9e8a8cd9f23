use crate::{
    constants::{ADDRESS_HEX_LEN, WORKCHAIN_BASE, WORKCHAIN_MASTER},
    error::{AppError, Result},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Everscale contract address in its raw `<workchain>:<hex>` form.
///
/// Equality and hashing use the normalized (trimmed, lower-case) text, so
/// `0:ABC…` and `0:abc…` are the same address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parses and normalizes a raw address.
    ///
    /// # Returns
    /// * `Err(AppError::InvalidAddress)` when the workchain is not `0`/`-1` or the
    ///   account part is not 32 hex-encoded bytes.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let Some((workchain, account)) = trimmed.split_once(':') else {
            return Err(AppError::InvalidAddress(format!(
                "'{trimmed}' is missing the workchain separator"
            )));
        };
        if workchain != WORKCHAIN_BASE && workchain != WORKCHAIN_MASTER {
            return Err(AppError::InvalidAddress(format!(
                "'{trimmed}' has unsupported workchain '{workchain}'"
            )));
        }
        if account.len() != ADDRESS_HEX_LEN || hex::decode(account).is_err() {
            return Err(AppError::InvalidAddress(format!(
                "'{trimmed}' account id must be {ADDRESS_HEX_LEN} hex characters"
            )));
        }
        Ok(Self(format!("{workchain}:{}", account.to_ascii_lowercase())))
    }

    pub fn is_valid(raw: &str) -> bool {
        Self::parse(raw).is_ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}
