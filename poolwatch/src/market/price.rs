//! Spot price of a USDC-quoted constant-product pair.
//!
//! Everything here is pure: same inputs, same output, no hidden state.

use ethers::types::{Address, U256};

use crate::market::types::QuoteSide;

const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

/// Converts a raw integer amount into whole units (`amount / 10^decimals`).
///
/// Covers the full `U256` range; precision is that of `f64`.
pub fn to_units(amount: U256, decimals: u8) -> f64 {
    let raw = amount
        .0
        .iter()
        .rev()
        .fold(0.0_f64, |acc, limb| acc * TWO_POW_64 + *limb as f64);

    raw / 10f64.powi(decimals as i32)
}

/// `quote / base`, or 0 when the base side is empty.
pub(crate) fn ratio(quote_units: f64, base_units: f64) -> f64 {
    if base_units > 0.0 {
        quote_units / base_units
    } else {
        0.0
    }
}

/// USDC per base token for a pair read in chain order.
///
/// Returns 0 when the non-USDC reserve is zero, or when the pair does not
/// have exactly one USDC side.
pub fn spot_price(
    reserves: (u128, u128),
    token0: Address,
    token1: Address,
    usdc: Address,
    decimals0: u8,
    decimals1: u8,
) -> f64 {
    let Ok(side) = QuoteSide::detect(token0, token1, usdc) else {
        return 0.0;
    };

    let (reserve0, reserve1) = reserves;
    let units0 = to_units(U256::from(reserve0), decimals0);
    let units1 = to_units(U256::from(reserve1), decimals1);

    match side {
        QuoteSide::Token0 => ratio(units0, units1),
        QuoteSide::Token1 => ratio(units1, units0),
    }
}
