//! Pool-level aggregates derived from reserves, price and swap history.
//!
//! Recomputed from scratch on every refresh; nothing accumulates between calls.

use crate::market::types::{PairState, PoolMetrics, SwapEvent};

/// Trailing window for volume, in seconds.
pub const VOLUME_WINDOW_SECS: i64 = 86_400;

/// Sum of `max(usd_in, usd_out)` over swaps younger than 24h at `now_secs`.
pub fn volume_24h(events: &[SwapEvent], now_secs: u64) -> f64 {
    let now = now_secs as i64;
    events
        .iter()
        .filter(|e| now - (e.timestamp as i64) < VOLUME_WINDOW_SECS)
        .map(SwapEvent::usd_volume)
        .sum()
}

/// USDC reserve plus the base reserve valued at `price`.
pub fn tvl(usdc_reserve: f64, base_reserve: f64, price: f64) -> f64 {
    usdc_reserve + base_reserve * price
}

/// Geometric mean of the two USD-valued reserves.
pub fn liquidity(usdc_reserve: f64, base_reserve: f64, price: f64) -> f64 {
    (usdc_reserve * (base_reserve * price)).sqrt()
}

pub fn aggregate(state: &PairState, price: f64, events: &[SwapEvent], now_secs: u64) -> PoolMetrics {
    let usdc_reserve = state.quote_units();
    let base_reserve = state.base_units();

    PoolMetrics {
        volume_24h: volume_24h(events, now_secs),
        tvl: tvl(usdc_reserve, base_reserve, price),
        liquidity: liquidity(usdc_reserve, base_reserve, price),
        total_supply: state.total_supply,
    }
}

#[cfg(test)]
mod tests {
    use ethers::types::{Address, H256, U256};

    use super::*;
    use crate::market::types::{Direction, QuoteSide, RawPairState};

    const NOW: u64 = 1_700_000_000;

    fn scenario_a() -> PairState {
        let usdc = Address::from_low_u64_be(1);
        let raw = RawPairState {
            reserve0: 1_000_000u128 * 1_000_000,
            reserve1: 500_000u128 * 10u128.pow(18),
            token0: usdc,
            token1: Address::from_low_u64_be(2),
            total_supply: U256::from(777u64),
        };
        PairState::orient(&raw, 6, 18, usdc).unwrap()
    }

    fn swap_at(timestamp: u64, usd_in: f64, usd_out: f64) -> SwapEvent {
        SwapEvent {
            tx_hash: H256::zero(),
            block_number: 1,
            log_index: 0,
            timestamp,
            sender: Address::zero(),
            recipient: Address::zero(),
            amount_base_in: U256::zero(),
            amount_quote_in: U256::zero(),
            amount_base_out: U256::zero(),
            amount_quote_out: U256::zero(),
            usd_in,
            usd_out,
            price_per_unit: 0.0,
            direction: Direction::Buy,
        }
    }

    #[test]
    fn tvl_of_balanced_pool_without_swaps() {
        let state = scenario_a();
        assert_eq!(state.quote_side, QuoteSide::Token0);

        let price = state.spot_price();
        let m = aggregate(&state, price, &[], NOW);

        assert!((m.tvl - 2_000_000.0).abs() < 1e-6, "tvl was {}", m.tvl);
        assert!((m.liquidity - 1_000_000.0).abs() < 1e-6, "liquidity was {}", m.liquidity);
        assert_eq!(m.volume_24h, 0.0);
        assert_eq!(m.total_supply, U256::from(777u64));
    }

    #[test]
    fn volume_counts_only_the_last_24h() {
        let events = vec![
            swap_at(NOW - 10, 100.0, 90.0),
            swap_at(NOW - 86_399, 5.0, 7.0),
            swap_at(NOW - 86_400, 1_000.0, 1_000.0),
            swap_at(NOW - 200_000, 1_000.0, 1_000.0),
        ];
        assert_eq!(volume_24h(&events, NOW), 107.0);
    }

    #[test]
    fn future_timestamps_count_toward_volume() {
        let events = vec![swap_at(NOW + 30, 3.0, 4.0)];
        assert_eq!(volume_24h(&events, NOW), 4.0);
    }

    #[test]
    fn empty_pool_has_zero_aggregates() {
        assert_eq!(tvl(0.0, 0.0, 0.0), 0.0);
        assert_eq!(liquidity(0.0, 0.0, 0.0), 0.0);
    }
}
