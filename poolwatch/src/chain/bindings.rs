//! Contract bindings for the pair and its ERC-20 tokens.

use ethers::contract::{abigen, EthEvent};
use ethers::types::{Address, Filter, U256};

abigen!(
    PairContract,
    r#"[
        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast)
        function token0() external view returns (address)
        function token1() external view returns (address)
        function totalSupply() external view returns (uint256)
    ]"#
);

abigen!(
    Erc20Decimals,
    r#"[
        function decimals() external view returns (uint8)
    ]"#
);

/// `Swap` event emitted by the pair on every trade.
#[derive(Clone, Debug, PartialEq, Eq, EthEvent)]
#[ethevent(name = "Swap", abi = "Swap(address,uint256,uint256,uint256,uint256,address)")]
pub struct SwapLog {
    #[ethevent(indexed)]
    pub sender: Address,
    pub amount0_in: U256,
    pub amount1_in: U256,
    pub amount0_out: U256,
    pub amount1_out: U256,
    #[ethevent(indexed)]
    pub to: Address,
}

/// Log filter matching `Swap` events of one pair.
pub fn swap_filter(pair: Address) -> Filter {
    Filter::new().address(pair).topic0(SwapLog::signature())
}
