use std::fmt;

use ethers::types::{Address, H256, U256};
use serde::Serialize;

use crate::error::PoolError;
use crate::market::price;

/// Fallback precision when a token's `decimals()` cannot be read.
pub const DEFAULT_DECIMALS: u8 = 18;

/// Pair state in chain order, exactly as returned by one batched read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPairState {
    pub reserve0: u128,
    pub reserve1: u128,
    pub token0: Address,
    pub token1: Address,
    pub total_supply: U256,
}

/// Which pair slot holds USDC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QuoteSide {
    Token0,
    Token1,
}

impl QuoteSide {
    /// Locates USDC among the two pair tokens.
    ///
    /// Addresses compare as raw bytes, so hex casing never matters.
    pub fn detect(token0: Address, token1: Address, usdc: Address) -> Result<Self, PoolError> {
        match (token0 == usdc, token1 == usdc) {
            (true, false) => Ok(Self::Token0),
            (false, true) => Ok(Self::Token1),
            (true, true) => Err(PoolError::BothSidesUsdc),
            (false, false) => Err(PoolError::NoUsdcSide { token0, token1 }),
        }
    }
}

/// Pair state oriented as base token (priced asset) vs quote (USDC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairState {
    pub reserve_base: u128,
    pub reserve_quote: u128,
    pub base_token: Address,
    pub quote_token: Address,
    pub base_decimals: u8,
    pub quote_decimals: u8,
    pub total_supply: U256,
    pub quote_side: QuoteSide,
}

impl PairState {
    /// Orients a raw read around the USDC side.
    pub fn orient(
        raw: &RawPairState,
        decimals0: u8,
        decimals1: u8,
        usdc: Address,
    ) -> Result<Self, PoolError> {
        let side = QuoteSide::detect(raw.token0, raw.token1, usdc)?;

        let state = match side {
            QuoteSide::Token0 => Self {
                reserve_base: raw.reserve1,
                reserve_quote: raw.reserve0,
                base_token: raw.token1,
                quote_token: raw.token0,
                base_decimals: decimals1,
                quote_decimals: decimals0,
                total_supply: raw.total_supply,
                quote_side: side,
            },
            QuoteSide::Token1 => Self {
                reserve_base: raw.reserve0,
                reserve_quote: raw.reserve1,
                base_token: raw.token0,
                quote_token: raw.token1,
                base_decimals: decimals0,
                quote_decimals: decimals1,
                total_supply: raw.total_supply,
                quote_side: side,
            },
        };

        Ok(state)
    }

    /// Base reserve in whole tokens.
    pub fn base_units(&self) -> f64 {
        price::to_units(U256::from(self.reserve_base), self.base_decimals)
    }

    /// USDC reserve in whole dollars.
    pub fn quote_units(&self) -> f64 {
        price::to_units(U256::from(self.reserve_quote), self.quote_decimals)
    }

    /// USDC per base token; 0 when the base reserve is empty.
    pub fn spot_price(&self) -> f64 {
        price::ratio(self.quote_units(), self.base_units())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// USDC paid in, base token taken out.
    Buy,
    /// Base token paid in, USDC taken out.
    Sell,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => f.write_str("BUY"),
            Direction::Sell => f.write_str("SELL"),
        }
    }
}

/// One decoded and valued swap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwapEvent {
    pub tx_hash: H256,
    pub block_number: u64,
    pub log_index: u64,
    pub timestamp: u64,
    pub sender: Address,
    pub recipient: Address,

    pub amount_base_in: U256,
    pub amount_quote_in: U256,
    pub amount_base_out: U256,
    pub amount_quote_out: U256,

    /// USD value of each leg, both at the spot price of the refresh.
    pub usd_in: f64,
    pub usd_out: f64,
    pub price_per_unit: f64,

    pub direction: Direction,
}

impl SwapEvent {
    /// Trade size used for volume: the larger of the two legs.
    pub fn usd_volume(&self) -> f64 {
        self.usd_in.max(self.usd_out)
    }
}

/// Point-in-time pool analytics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PoolMetrics {
    pub volume_24h: f64,
    pub tvl: f64,
    pub liquidity: f64,
    pub total_supply: U256,
}
