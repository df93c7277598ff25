//! Pool price service.
//!
//! Owns everything one consumer needs to follow a single pair:
//! the fetch gate, a token-decimals cache and the published [`PoolView`].
//!
//! Data flow per refresh:
//! ChainReader → PairState → spot price → swap history → metrics → PoolViewStore

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use common::logger::{child_span, root_span, warn_if_slow, TraceId};
use ethers::types::Address;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, error, field, info, warn, Instrument};

use crate::chain::{validate_pair_address, ChainError, ChainReader, SwapNotice};
use crate::error::PoolError;
use crate::market::gate::{FetchGate, GateDenied, DEFAULT_FETCH_COOLDOWN};
use crate::market::metrics;
use crate::market::swaps::{self, SwapBatch, SwapQuery, DEFAULT_LOOKBACK_BLOCKS};
use crate::market::types::{PairState, PoolMetrics, RawPairState, DEFAULT_DECIMALS};
use crate::market_view::{PoolView, PoolViewStore};
use crate::metrics::Counters;
use crate::time::now_secs;

/// Batched reads slower than this are reported under the `performance` target.
const SLOW_READ: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// USDC contract on the connected network; always the quote side.
    pub usdc: Address,
    pub fetch_cooldown: Duration,
    pub lookback_blocks: u64,
}

impl ServiceSettings {
    pub fn new(usdc: Address) -> Self {
        Self {
            usdc,
            fetch_cooldown: DEFAULT_FETCH_COOLDOWN,
            lookback_blocks: DEFAULT_LOOKBACK_BLOCKS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    InvalidPair,
    InFlight,
    Cooldown,
}

/// What a refresh trigger ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Trigger dropped before any network I/O.
    Skipped(SkipReason),
    /// A priced snapshot was published.
    Published,
    /// Pair data was read but the pool has no single USDC side.
    InvalidPool(PoolError),
    /// An RPC failure; the previous snapshot stays in place.
    Failed(String),
}

enum Loaded {
    Priced {
        raw: RawPairState,
        state: PairState,
        price: f64,
        batch: SwapBatch,
    },
    /// The base reserve is empty, so the pool has no price.
    Drained {
        raw: RawPairState,
    },
    Unpriceable {
        raw: RawPairState,
        reason: PoolError,
    },
}

pub struct PoolPriceService<R: ?Sized> {
    reader: Arc<R>,
    pair: Option<Address>,
    settings: ServiceSettings,
    gate: FetchGate,
    decimals: Mutex<HashMap<Address, u8>>,
    view: PoolViewStore,
    counters: Counters,
}

impl<R> PoolPriceService<R>
where
    R: ChainReader + ?Sized,
{
    /// Creates the service for `pair_address`.
    ///
    /// A malformed or zero address yields a service that never touches the
    /// network and keeps reporting an empty, unpriced pool.
    pub fn new(
        reader: Arc<R>,
        pair_address: &str,
        settings: ServiceSettings,
        counters: Counters,
    ) -> Self {
        let pair = match validate_pair_address(pair_address) {
            Ok(pair) => Some(pair),
            Err(e) => {
                warn!(error = %e, pair = pair_address, "pool disabled: invalid pair address");
                None
            }
        };

        Self {
            reader,
            pair,
            gate: FetchGate::new(settings.fetch_cooldown),
            view: PoolViewStore::new(PoolView::empty(settings.usdc)),
            settings,
            decimals: Mutex::new(HashMap::new()),
            counters,
        }
    }

    pub fn pair(&self) -> Option<Address> {
        self.pair
    }

    /// Handle to the published snapshot.
    pub fn view(&self) -> PoolViewStore {
        self.view.clone()
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// Full refresh: re-reads the pair and the default swap window.
    pub async fn refresh_data(&self) -> RefreshOutcome {
        self.refresh(None).await
    }

    /// Refreshes pair state and swap history.
    ///
    /// With `from_block`, only swaps at or above that block are refetched and
    /// merged into the held history. Triggers while another refresh runs, or
    /// inside the cooldown, return immediately without touching state.
    pub async fn refresh(&self, from_block: Option<u64>) -> RefreshOutcome {
        let Some(pair) = self.pair else {
            Counters::bump(&self.counters.skipped_invalid_pair);
            return RefreshOutcome::Skipped(SkipReason::InvalidPair);
        };

        let _permit = match self.gate.try_acquire() {
            Ok(permit) => permit,
            Err(GateDenied::InFlight) => {
                Counters::bump(&self.counters.skipped_in_flight);
                debug!(pair = %pair, "refresh skipped: already in flight");
                return RefreshOutcome::Skipped(SkipReason::InFlight);
            }
            Err(GateDenied::Cooldown { remaining }) => {
                Counters::bump(&self.counters.skipped_cooldown);
                debug!(
                    pair = %pair,
                    remaining_ms = remaining.as_millis() as u64,
                    "refresh skipped: cooling down"
                );
                return RefreshOutcome::Skipped(SkipReason::Cooldown);
            }
        };

        Counters::bump(&self.counters.refreshes_started);

        self.view
            .update(|v| {
                v.is_loading = true;
                v.error = None;
            })
            .await;

        let span = root_span("pool_refresh", &TraceId::new());
        span.record("pair", field::display(pair));

        let loaded = self.load(pair, from_block).instrument(span).await;

        match loaded {
            Ok(Loaded::Priced {
                raw,
                state,
                price,
                batch,
            }) => {
                self.publish(raw, state, price, batch).await;
                Counters::bump(&self.counters.refreshes_published);
                RefreshOutcome::Published
            }
            Ok(Loaded::Drained { raw }) => {
                warn!(pair = %pair, "pool has an empty base reserve; publishing without price");
                self.publish_drained(raw).await;
                Counters::bump(&self.counters.refreshes_published);
                RefreshOutcome::Published
            }
            Ok(Loaded::Unpriceable { raw, reason }) => {
                warn!(pair = %pair, error = %reason, "pool cannot be priced");
                self.publish_unpriceable(raw, &reason).await;
                RefreshOutcome::InvalidPool(reason)
            }
            Err(e) => {
                Counters::bump(&self.counters.refresh_failures);
                error!(pair = %pair, error = %e, "pool refresh failed");

                let message = e.to_string();
                self.view
                    .update(|v| {
                        v.is_loading = false;
                        v.error = Some(message.clone());
                    })
                    .await;

                RefreshOutcome::Failed(message)
            }
        }
    }

    /// Consumes swap notices, refreshing anchored at each notice's block.
    pub async fn run(self: Arc<Self>, mut notices: mpsc::Receiver<SwapNotice>) {
        info!(pair = ?self.pair, "pool refresh loop started");

        while let Some(notice) = notices.recv().await {
            Counters::bump(&self.counters.swap_notices);
            debug!(block = notice.block_number, "swap notice received");
            self.refresh(Some(notice.block_number)).await;
        }

        warn!("swap notice channel closed; pool refresh loop terminated");
    }

    async fn load(&self, pair: Address, from_block: Option<u64>) -> Result<Loaded, ChainError> {
        let raw = warn_if_slow("pair_state", SLOW_READ, self.reader.pair_state(pair)).await?;

        let (decimals0, decimals1) = async {
            let d0 = self.decimals_of(raw.token0).await;
            let d1 = self.decimals_of(raw.token1).await;
            (d0, d1)
        }
        .instrument(child_span("token_decimals"))
        .await;

        let state = match PairState::orient(&raw, decimals0, decimals1, self.settings.usdc) {
            Ok(state) => state,
            Err(reason) => return Ok(Loaded::Unpriceable { raw, reason }),
        };

        let price = state.spot_price();
        if price <= 0.0 {
            return Ok(Loaded::Drained { raw });
        }

        let query = SwapQuery {
            pair,
            state: &state,
            price,
            from_block,
            lookback_blocks: self.settings.lookback_blocks,
        };
        let batch = warn_if_slow(
            "fetch_swaps",
            SLOW_READ,
            swaps::fetch_swaps(&*self.reader, query, &self.counters),
        )
        .await?;

        Ok(Loaded::Priced {
            raw,
            state,
            price,
            batch,
        })
    }

    /// Token decimals, cached once read; falls back to 18 without caching.
    async fn decimals_of(&self, token: Address) -> u8 {
        let cached = self.decimals.lock().get(&token).copied();
        if let Some(d) = cached {
            return d;
        }

        match self.reader.token_decimals(token).await {
            Ok(d) => {
                self.decimals.lock().insert(token, d);
                d
            }
            Err(e) => {
                warn!(
                    token = ?token,
                    error = %e,
                    fallback = DEFAULT_DECIMALS,
                    "decimals unavailable; using fallback"
                );
                DEFAULT_DECIMALS
            }
        }
    }

    async fn publish(
        &self,
        raw: RawPairState,
        state: PairState,
        price: f64,
        batch: SwapBatch,
    ) {
        let now = now_secs();

        self.view
            .update(|v| {
                let events = swaps::merge_anchored(&v.swap_events, batch, &state, price);
                let pool_metrics = metrics::aggregate(&state, price, &events, now);

                v.current_pool_price = price;
                v.has_pool_data = price > 0.0;
                v.reserves = Some((raw.reserve0, raw.reserve1));
                v.token0 = Some(raw.token0);
                v.token1 = Some(raw.token1);
                v.total_supply = Some(raw.total_supply);
                v.swap_events = events;
                v.pool_metrics = pool_metrics;
                v.is_loading = false;
                v.error = None;

                info!(
                    price = v.current_pool_price,
                    swaps = v.swap_events.len(),
                    volume_24h = v.pool_metrics.volume_24h,
                    tvl = v.pool_metrics.tvl,
                    liquidity = v.pool_metrics.liquidity,
                    "pool snapshot published"
                );
            })
            .await;
    }

    /// Publishes pair data with every derived field zeroed.
    async fn publish_drained(&self, raw: RawPairState) {
        let usdc = self.settings.usdc;

        self.view
            .update(|v| {
                *v = PoolView {
                    reserves: Some((raw.reserve0, raw.reserve1)),
                    token0: Some(raw.token0),
                    token1: Some(raw.token1),
                    total_supply: Some(raw.total_supply),
                    pool_metrics: PoolMetrics {
                        total_supply: raw.total_supply,
                        ..PoolMetrics::default()
                    },
                    ..PoolView::empty(usdc)
                };
            })
            .await;
    }

    async fn publish_unpriceable(&self, raw: RawPairState, reason: &PoolError) {
        let usdc = self.settings.usdc;
        let message = reason.to_string();

        self.view
            .update(|v| {
                *v = PoolView {
                    reserves: Some((raw.reserve0, raw.reserve1)),
                    token0: Some(raw.token0),
                    token1: Some(raw.token1),
                    total_supply: Some(raw.total_supply),
                    error: Some(message),
                    ..PoolView::empty(usdc)
                };
            })
            .await;
    }
}
