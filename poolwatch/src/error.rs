use ethers::types::Address;
use thiserror::Error;

/// Reasons a pool cannot be priced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("invalid pair address `{0}`")]
    InvalidPairAddress(String),

    #[error("pair address is the zero address")]
    ZeroPairAddress,

    #[error("neither pool token ({token0:?}, {token1:?}) is USDC")]
    NoUsdcSide { token0: Address, token1: Address },

    #[error("both pool tokens are USDC")]
    BothSidesUsdc,
}
