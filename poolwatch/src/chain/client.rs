use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::{Address, Log};
use tracing::{debug, instrument};

use crate::chain::bindings::{swap_filter, Erc20Decimals, PairContract};
use crate::chain::errors::ChainError;
use crate::market::types::RawPairState;

/// Read-only view of the chain as needed by the pool engine.
///
/// Implementations must not mutate chain state; every method is a plain RPC
/// read. Tests substitute an in-memory implementation.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Current block height.
    async fn block_number(&self) -> Result<u64, ChainError>;

    /// Reserves, both token addresses and LP supply in one batched round trip.
    async fn pair_state(&self, pair: Address) -> Result<RawPairState, ChainError>;

    /// ERC-20 `decimals()` of `token`.
    async fn token_decimals(&self, token: Address) -> Result<u8, ChainError>;

    /// Raw `Swap` logs emitted by `pair` in the inclusive range `[from, to]`.
    async fn swap_logs(&self, pair: Address, from: u64, to: u64) -> Result<Vec<Log>, ChainError>;

    /// Unix timestamp (seconds) of `block`.
    async fn block_timestamp(&self, block: u64) -> Result<u64, ChainError>;
}

/// [`ChainReader`] backed by an `ethers` middleware (HTTP in production).
pub struct EthersChainReader<M> {
    client: Arc<M>,
}

impl<M> Clone for EthersChainReader<M> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
        }
    }
}

impl<M: Middleware> EthersChainReader<M> {
    pub fn new(client: Arc<M>) -> Self {
        Self { client }
    }
}

impl EthersChainReader<Provider<Http>> {
    /// Builds an HTTP JSON-RPC reader with bounded request time.
    pub fn connect_http(url: &str) -> Result<Self, ChainError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        let endpoint =
            reqwest::Url::parse(url).map_err(|_| ChainError::InvalidEndpoint(url.to_string()))?;

        let provider = Provider::new(Http::new_with_client(endpoint, http));

        Ok(Self::new(Arc::new(provider)))
    }
}

#[async_trait]
impl<M> ChainReader for EthersChainReader<M>
where
    M: Middleware + 'static,
{
    async fn block_number(&self) -> Result<u64, ChainError> {
        let n = self
            .client
            .get_block_number()
            .await
            .map_err(ChainError::rpc)?;
        Ok(n.as_u64())
    }

    #[instrument(skip(self), fields(pair = %pair), level = "debug")]
    async fn pair_state(&self, pair: Address) -> Result<RawPairState, ChainError> {
        let contract = PairContract::new(pair, Arc::clone(&self.client));

        let reserves_call = contract.get_reserves();
        let token0_call = contract.token_0();
        let token1_call = contract.token_1();
        let supply_call = contract.total_supply();

        let (reserves, token0, token1, total_supply) = tokio::try_join!(
            async {
                reserves_call
                    .call()
                    .await
                    .map_err(|e| ChainError::contract("getReserves", e))
            },
            async {
                token0_call
                    .call()
                    .await
                    .map_err(|e| ChainError::contract("token0", e))
            },
            async {
                token1_call
                    .call()
                    .await
                    .map_err(|e| ChainError::contract("token1", e))
            },
            async {
                supply_call
                    .call()
                    .await
                    .map_err(|e| ChainError::contract("totalSupply", e))
            },
        )?;

        let (reserve0, reserve1, _block_timestamp_last) = reserves;

        debug!(
            reserve0 = %reserve0,
            reserve1 = %reserve1,
            token0 = ?token0,
            token1 = ?token1,
            "pair state fetched"
        );

        Ok(RawPairState {
            reserve0,
            reserve1,
            token0,
            token1,
            total_supply,
        })
    }

    #[instrument(skip(self), fields(token = %token), level = "debug")]
    async fn token_decimals(&self, token: Address) -> Result<u8, ChainError> {
        let contract = Erc20Decimals::new(token, Arc::clone(&self.client));
        contract
            .decimals()
            .call()
            .await
            .map_err(|e| ChainError::contract("decimals", e))
    }

    #[instrument(skip(self), fields(pair = %pair), level = "debug")]
    async fn swap_logs(&self, pair: Address, from: u64, to: u64) -> Result<Vec<Log>, ChainError> {
        let filter = swap_filter(pair).from_block(from).to_block(to);

        let logs = self
            .client
            .get_logs(&filter)
            .await
            .map_err(ChainError::rpc)?;

        debug!(count = logs.len(), "swap logs fetched");
        Ok(logs)
    }

    async fn block_timestamp(&self, block: u64) -> Result<u64, ChainError> {
        let found = self
            .client
            .get_block(block)
            .await
            .map_err(ChainError::rpc)?
            .ok_or(ChainError::BlockNotFound(block))?;

        Ok(found.timestamp.low_u64())
    }
}
