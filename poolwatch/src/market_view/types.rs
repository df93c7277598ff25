use ethers::types::{Address, U256};
use serde::Serialize;

use crate::market::types::{PoolMetrics, SwapEvent};

/// Everything a consumer of one pool sees.
///
/// Published as a whole; readers never observe a half-updated swap list or
/// metrics computed from a different snapshot than the list beside them.
#[derive(Clone, Debug, Serialize)]
pub struct PoolView {
    /// USDC per base token; 0 while the pool has no data.
    pub current_pool_price: f64,

    /// Reserves, both tokens and a strictly positive price are present.
    pub has_pool_data: bool,

    /// Raw reserves in chain order `(reserve0, reserve1)`.
    pub reserves: Option<(u128, u128)>,
    pub token0: Option<Address>,
    pub token1: Option<Address>,
    pub usdc_address: Address,

    /// Newest first.
    pub swap_events: Vec<SwapEvent>,
    pub pool_metrics: PoolMetrics,
    pub total_supply: Option<U256>,

    pub is_loading: bool,
    pub error: Option<String>,
}

impl PoolView {
    /// View of a pool nothing is known about yet.
    pub fn empty(usdc_address: Address) -> Self {
        Self {
            current_pool_price: 0.0,
            has_pool_data: false,
            reserves: None,
            token0: None,
            token1: None,
            usdc_address,
            swap_events: Vec::new(),
            pool_metrics: PoolMetrics::default(),
            total_supply: None,
            is_loading: false,
            error: None,
        }
    }
}
