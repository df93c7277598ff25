use std::time::Duration;

use ethers::types::Address;
use thiserror::Error;

use crate::market::ServiceSettings;

/// Chain id the engine targets when none is configured (Somnia testnet).
pub const DEFAULT_CHAIN_ID: u64 = 50312;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: `{value}`")]
    Invalid { var: &'static str, value: String },

    #[error("no known USDC address for chain {0}; set POOLWATCH_USDC_ADDRESS")]
    UnknownUsdc(u64),
}

/// USDC deployments the engine can price against without extra config.
pub fn known_usdc_address(chain_id: u64) -> Option<Address> {
    match chain_id {
        50312 => "0xf2A558c41e9A5505d2E5614a4AAb85f397816d00".parse().ok(),
        _ => None,
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// HTTP JSON-RPC endpoint for batched reads and log queries.
    pub rpc_url: String,

    /// WebSocket endpoint for the live `Swap` subscription.
    pub ws_url: String,

    /// Pair contract to follow, as configured.
    ///
    /// Kept unparsed: a malformed or zero address is not a startup error,
    /// the service simply reports an empty pool for it.
    pub pair_address: String,

    pub chain_id: u64,

    /// Quote token. Every price is USDC per base token.
    pub usdc_address: Address,

    // =========================
    // Refresh configuration
    // =========================
    /// Minimum spacing between two refresh starts.
    ///
    /// Triggers arriving sooner are dropped, not queued.
    pub fetch_cooldown_ms: u64,

    /// Size of the swap history window, in blocks back from the chain head.
    pub lookback_blocks: u64,

    /// Wait before re-opening a swap subscription that ended or failed.
    pub resubscribe_delay_ms: u64,

    /// JSON logs when `APP_ENV=production`.
    pub json_logs: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(var))
        };

        let number = |var: &'static str, default: u64| -> Result<u64, ConfigError> {
            match lookup(var) {
                None => Ok(default),
                Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
                    var,
                    value: v.clone(),
                }),
            }
        };

        let chain_id = number("POOLWATCH_CHAIN_ID", DEFAULT_CHAIN_ID)?;

        let usdc_address = match lookup("POOLWATCH_USDC_ADDRESS") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "POOLWATCH_USDC_ADDRESS",
                value: v.clone(),
            })?,
            None => known_usdc_address(chain_id).ok_or(ConfigError::UnknownUsdc(chain_id))?,
        };

        Ok(Self {
            rpc_url: required("POOLWATCH_RPC_URL")?,
            ws_url: required("POOLWATCH_WS_URL")?,
            pair_address: required("POOLWATCH_PAIR_ADDRESS")?,
            chain_id,
            usdc_address,

            // Refresh defaults:
            // - at most one batch of reads every 5s
            // - roughly the last 1000 blocks of swaps
            fetch_cooldown_ms: number("POOLWATCH_FETCH_COOLDOWN_MS", 5_000)?,
            lookback_blocks: number("POOLWATCH_LOOKBACK_BLOCKS", 1_000)?,
            resubscribe_delay_ms: number("POOLWATCH_RESUBSCRIBE_DELAY_MS", 3_000)?,

            json_logs: lookup("APP_ENV").as_deref() == Some("production"),
        })
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            usdc: self.usdc_address,
            fetch_cooldown: Duration::from_millis(self.fetch_cooldown_ms),
            lookback_blocks: self.lookback_blocks,
        }
    }

    pub fn resubscribe_delay(&self) -> Duration {
        Duration::from_millis(self.resubscribe_delay_ms)
    }
}
