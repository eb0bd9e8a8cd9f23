/// Application constants

pub const API_VERSION: &str = "v1";

// Token contract ABIs (TIP-3)
pub const ABI_TOKEN_ROOT: &str = "TokenRoot";
pub const ABI_TOKEN_WALLET: &str = "TokenWallet";

// Token root methods
pub const METHOD_GET_WALLET_ADDRESS: &str = "getWalletAddress";
pub const METHOD_GET_DETAILS: &str = "getDetails";
pub const METHOD_DECIMALS: &str = "decimals";
pub const METHOD_SYMBOL: &str = "symbol";

// Token wallet methods
pub const METHOD_BALANCE: &str = "balance";

/// Responsible methods answer to `_answer_id`; local runs always use zero.
pub const ANSWER_ID: &str = "0";

/// Wallets are derived for the owner address only, never for a public key.
pub const WALLET_PUBLIC_KEY_PLACEHOLDER: &str = "0";

// Everscale address layout
pub const ADDRESS_HEX_LEN: usize = 64;
pub const WORKCHAIN_BASE: &str = "0";
pub const WORKCHAIN_MASTER: &str = "-1";

pub const PUBLIC_KEY_HEX_LEN: usize = 64;
