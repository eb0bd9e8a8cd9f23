use serde::Deserialize;
use std::env;
use std::time::Duration;

const DEFAULT_RPC_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,

    // Blockchain
    pub ever_rpc_url: String,
    pub rpc_timeout_ms: u64,
    pub token_wallet_trace: bool,

    // CORS
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            ever_rpc_url: env::var("EVER_RPC_URL")?,
            rpc_timeout_ms: env::var("RPC_TIMEOUT_MS")
                .ok()
                .and_then(|value| value.parse::<u64>().ok())
                .filter(|value| *value > 0)
                .unwrap_or(DEFAULT_RPC_TIMEOUT_MS),
            token_wallet_trace: env::var("TOKEN_WALLET_TRACE")
                .map(|value| is_truthy(&value))
                .unwrap_or(true),

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.ever_rpc_url.trim().is_empty() {
            anyhow::bail!("EVER_RPC_URL is empty");
        }
        url::Url::parse(&self.ever_rpc_url)
            .map_err(|e| anyhow::anyhow!("Invalid EVER_RPC_URL: {e}"))?;

        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }

        Ok(())
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    pub fn is_testnet(&self) -> bool {
        self.environment == "development" || self.environment == "testnet"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: "development".to_string(),
            ever_rpc_url: "https://jrpc.everwallet.net/rpc".to_string(),
            rpc_timeout_ms: DEFAULT_RPC_TIMEOUT_MS,
            token_wallet_trace: true,
            cors_allowed_origins: "*".to_string(),
        }
    }
}

// Internal helper that checks conditions for `is_truthy`.
fn is_truthy(value: &str) -> bool {
    let normalized = value.trim().to_ascii_lowercase();
    normalized == "1" || normalized == "true" || normalized == "yes" || normalized == "on"
}
