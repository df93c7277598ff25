#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use ethers::abi::{encode, Token};
use ethers::contract::EthEvent;
use ethers::types::{Address, Bytes, Log, H256, U256, U64};
use parking_lot::Mutex;

use poolwatch::chain::bindings::SwapLog;
use poolwatch::chain::{ChainError, ChainReader};
use poolwatch::market::RawPairState;

pub const USDC: u64 = 0xA1;
pub const TOKEN: u64 = 0xB2;
pub const PAIR: &str = "0x00000000000000000000000000000000000000cc";

pub fn addr(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

pub fn e6(n: u64) -> U256 {
    U256::from(n) * U256::exp10(6)
}

pub fn e18(n: u64) -> U256 {
    U256::from(n) * U256::exp10(18)
}

/// USDC as token0, 1,000,000 USDC vs 500,000 tokens: spot price 2.0.
pub fn balanced_pool() -> RawPairState {
    RawPairState {
        reserve0: 1_000_000u128 * 1_000_000,
        reserve1: 500_000u128 * 10u128.pow(18),
        token0: addr(USDC),
        token1: addr(TOKEN),
        total_supply: U256::from(1_000u64),
    }
}

/// A buyer paying `usdc` (6 decimals) for `tokens` (18 decimals).
pub fn buy_log(block: u64, index: u64, usdc: u64, tokens: u64) -> Log {
    swap_log(block, index, e6(usdc), U256::zero(), U256::zero(), e18(tokens))
}

/// A seller paying `tokens` (18 decimals) for `usdc` (6 decimals).
pub fn sell_log(block: u64, index: u64, tokens: u64, usdc: u64) -> Log {
    swap_log(block, index, U256::zero(), e18(tokens), e6(usdc), U256::zero())
}

fn swap_log(
    block: u64,
    index: u64,
    amount0_in: U256,
    amount1_in: U256,
    amount0_out: U256,
    amount1_out: U256,
) -> Log {
    Log {
        address: addr(0xCC),
        topics: vec![
            SwapLog::signature(),
            H256::from(addr(0x51)),
            H256::from(addr(0x52)),
        ],
        data: Bytes::from(encode(&[
            Token::Uint(amount0_in),
            Token::Uint(amount1_in),
            Token::Uint(amount0_out),
            Token::Uint(amount1_out),
        ])),
        block_number: Some(U64::from(block)),
        transaction_hash: Some(H256::from_low_u64_be(block * 1_000 + index)),
        log_index: Some(U256::from(index)),
        ..Default::default()
    }
}

/// In-memory chain serving one pair. Counts every call it receives.
pub struct MockChain {
    pub head: AtomicU64,
    pub pair: Mutex<RawPairState>,
    pub decimals: HashMap<Address, u8>,
    pub logs: Mutex<Vec<Log>>,
    /// Block timestamps; blocks not listed resolve to `default_timestamp`.
    pub timestamps: Mutex<HashMap<u64, u64>>,
    pub default_timestamp: AtomicU64,

    pub fail_pair_state: AtomicBool,
    pub fail_decimals: AtomicBool,
    pub pair_state_delay: Mutex<Option<Duration>>,

    pub pair_state_calls: AtomicUsize,
    pub decimals_calls: AtomicUsize,
    pub block_number_calls: AtomicUsize,
    pub swap_logs_calls: AtomicUsize,
    pub timestamp_calls: AtomicUsize,
    pub last_range: Mutex<Option<(u64, u64)>>,
}

impl MockChain {
    pub fn new(pair: RawPairState) -> Self {
        let decimals = HashMap::from([(addr(USDC), 6u8), (addr(TOKEN), 18u8)]);

        Self {
            head: AtomicU64::new(10_000),
            pair: Mutex::new(pair),
            decimals,
            logs: Mutex::new(Vec::new()),
            timestamps: Mutex::new(HashMap::new()),
            default_timestamp: AtomicU64::new(poolwatch::time::now_secs()),
            fail_pair_state: AtomicBool::new(false),
            fail_decimals: AtomicBool::new(false),
            pair_state_delay: Mutex::new(None),
            pair_state_calls: AtomicUsize::new(0),
            decimals_calls: AtomicUsize::new(0),
            block_number_calls: AtomicUsize::new(0),
            swap_logs_calls: AtomicUsize::new(0),
            timestamp_calls: AtomicUsize::new(0),
            last_range: Mutex::new(None),
        }
    }

    pub fn with_logs(self, logs: Vec<Log>) -> Self {
        *self.logs.lock() = logs;
        self
    }

    /// Total RPC round trips observed.
    pub fn total_calls(&self) -> usize {
        self.pair_state_calls.load(Ordering::SeqCst)
            + self.decimals_calls.load(Ordering::SeqCst)
            + self.block_number_calls.load(Ordering::SeqCst)
            + self.swap_logs_calls.load(Ordering::SeqCst)
            + self.timestamp_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainReader for MockChain {
    async fn block_number(&self) -> Result<u64, ChainError> {
        self.block_number_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.head.load(Ordering::SeqCst))
    }

    async fn pair_state(&self, _pair: Address) -> Result<RawPairState, ChainError> {
        self.pair_state_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.pair_state_delay.lock();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }

        if self.fail_pair_state.load(Ordering::SeqCst) {
            return Err(ChainError::Rpc("connection refused".into()));
        }
        Ok(self.pair.lock().clone())
    }

    async fn token_decimals(&self, token: Address) -> Result<u8, ChainError> {
        self.decimals_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_decimals.load(Ordering::SeqCst) {
            return Err(ChainError::Contract {
                call: "decimals",
                reason: "execution reverted".into(),
            });
        }
        self.decimals
            .get(&token)
            .copied()
            .ok_or_else(|| ChainError::Contract {
                call: "decimals",
                reason: "no code at address".into(),
            })
    }

    async fn swap_logs(&self, _pair: Address, from: u64, to: u64) -> Result<Vec<Log>, ChainError> {
        self.swap_logs_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_range.lock() = Some((from, to));

        let logs = self
            .logs
            .lock()
            .iter()
            .filter(|l| {
                let b = l.block_number.map(|n| n.as_u64()).unwrap_or_default();
                b >= from && b <= to
            })
            .cloned()
            .collect();
        Ok(logs)
    }

    async fn block_timestamp(&self, block: u64) -> Result<u64, ChainError> {
        self.timestamp_calls.fetch_add(1, Ordering::SeqCst);

        let ts = self.timestamps.lock().get(&block).copied();
        Ok(ts.unwrap_or_else(|| self.default_timestamp.load(Ordering::SeqCst)))
    }
}
