//! Swap history reconstruction from raw `Swap` logs.
//!
//! Every held swap is valued at the spot price of the latest refresh, not at
//! the price prevailing in its own block.

use std::cmp::Reverse;
use std::collections::HashMap;

use ethers::contract::EthEvent;
use ethers::abi::RawLog;
use ethers::types::{Address, Log, U256};
use tracing::{debug, instrument, warn};

use crate::chain::bindings::SwapLog;
use crate::chain::{ChainError, ChainReader};
use crate::market::price::{ratio, to_units};
use crate::market::types::{Direction, PairState, QuoteSide, SwapEvent};
use crate::metrics::Counters;

/// Default history window when no anchor block is given.
pub const DEFAULT_LOOKBACK_BLOCKS: u64 = 1_000;

/// Inputs of one swap-history fetch.
#[derive(Debug, Clone, Copy)]
pub struct SwapQuery<'a> {
    pub pair: Address,
    pub state: &'a PairState,
    pub price: f64,
    /// Anchor block; `None` means `latest - lookback_blocks`.
    pub from_block: Option<u64>,
    pub lookback_blocks: u64,
}

/// Amounts and valuation of a decoded swap, independent of log metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Valuation {
    pub direction: Direction,
    pub amount_base_in: U256,
    pub amount_quote_in: U256,
    pub amount_base_out: U256,
    pub amount_quote_out: U256,
    pub usd_in: f64,
    pub usd_out: f64,
    pub price_per_unit: f64,
}

/// Classifies a swap and values both legs at `price`.
///
/// USDC paid in means the base token was bought; anything else is a sell.
pub fn value_swap(log: &SwapLog, state: &PairState, price: f64) -> Valuation {
    let (quote_in, base_in, quote_out, base_out) = match state.quote_side {
        QuoteSide::Token0 => (log.amount0_in, log.amount1_in, log.amount0_out, log.amount1_out),
        QuoteSide::Token1 => (log.amount1_in, log.amount0_in, log.amount1_out, log.amount0_out),
    };

    value_legs(base_in, quote_in, base_out, quote_out, state, price)
}

/// Re-values an already oriented swap at `price`.
pub fn revalue(event: &SwapEvent, state: &PairState, price: f64) -> SwapEvent {
    let v = value_legs(
        event.amount_base_in,
        event.amount_quote_in,
        event.amount_base_out,
        event.amount_quote_out,
        state,
        price,
    );

    SwapEvent {
        direction: v.direction,
        usd_in: v.usd_in,
        usd_out: v.usd_out,
        price_per_unit: v.price_per_unit,
        ..event.clone()
    }
}

fn value_legs(
    base_in: U256,
    quote_in: U256,
    base_out: U256,
    quote_out: U256,
    state: &PairState,
    price: f64,
) -> Valuation {
    let (direction, usd_in, usd_out, price_per_unit) = if !quote_in.is_zero() {
        let usd_in = to_units(quote_in, state.quote_decimals);
        let base_out_units = to_units(base_out, state.base_decimals);
        (
            Direction::Buy,
            usd_in,
            base_out_units * price,
            ratio(usd_in, base_out_units),
        )
    } else {
        let base_in_units = to_units(base_in, state.base_decimals);
        let usd_out = to_units(quote_out, state.quote_decimals);
        (
            Direction::Sell,
            base_in_units * price,
            usd_out,
            ratio(usd_out, base_in_units),
        )
    };

    Valuation {
        direction,
        amount_base_in: base_in,
        amount_quote_in: quote_in,
        amount_base_out: base_out,
        amount_quote_out: quote_out,
        usd_in,
        usd_out,
        price_per_unit,
    }
}

/// Decodes the `Swap` payload of a raw log.
pub fn decode_swap(log: &Log) -> Result<SwapLog, ChainError> {
    let raw = RawLog {
        topics: log.topics.clone(),
        data: log.data.to_vec(),
    };
    SwapLog::decode_log(&raw).map_err(|e| ChainError::MalformedLog(e.to_string()))
}

/// Newest first: block number descending, then log index descending.
pub fn sort_newest_first(events: &mut [SwapEvent]) {
    events.sort_by_key(|e| Reverse((e.block_number, e.log_index)));
}

/// Result of one swap-history fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SwapBatch {
    /// Newest first.
    pub events: Vec<SwapEvent>,
    /// Anchor the fetch started from, if any.
    pub anchor: Option<u64>,
    /// Oldest block still inside the lookback window at fetch time.
    pub window_start: u64,
}

/// Folds a fetched batch into the held history.
///
/// Without an anchor the batch replaces the history. With one, held events in
/// `[window_start, anchor)` are kept and re-valued at `price`; everything at
/// or above the anchor comes from the batch, and anything older than the
/// window is dropped.
pub fn merge_anchored(
    held: &[SwapEvent],
    batch: SwapBatch,
    state: &PairState,
    price: f64,
) -> Vec<SwapEvent> {
    let Some(anchor) = batch.anchor else {
        return batch.events;
    };

    let mut merged = batch.events;
    merged.extend(
        held.iter()
            .filter(|e| e.block_number >= batch.window_start && e.block_number < anchor)
            .map(|e| revalue(e, state, price)),
    );
    sort_newest_first(&mut merged);
    merged
}

/// Fetches, decodes, values and orders the pair's swaps.
///
/// A log that cannot be turned into a [`SwapEvent`] is logged and dropped;
/// only failures of the block-number or log queries abort the fetch.
#[instrument(
    skip(reader, query, counters),
    fields(pair = %query.pair, from_block = ?query.from_block)
)]
pub async fn fetch_swaps<R>(
    reader: &R,
    query: SwapQuery<'_>,
    counters: &Counters,
) -> Result<SwapBatch, ChainError>
where
    R: ChainReader + ?Sized,
{
    let latest = reader.block_number().await?;
    let window_start = latest.saturating_sub(query.lookback_blocks);
    let from = query.from_block.unwrap_or(window_start);

    let mut batch = SwapBatch {
        events: Vec::new(),
        anchor: query.from_block,
        window_start,
    };

    if from > latest {
        debug!(from, latest, "anchor beyond chain head; nothing to fetch");
        return Ok(batch);
    }

    let logs = reader.swap_logs(query.pair, from, latest).await?;
    debug!(count = logs.len(), from, latest, "swap logs received");

    let mut timestamps: HashMap<u64, u64> = HashMap::new();
    let mut events = Vec::with_capacity(logs.len());

    for log in &logs {
        match build_event(reader, log, &query, (from, latest), &mut timestamps).await {
            Ok(event) => events.push(event),
            Err(e) => {
                Counters::bump(&counters.events_dropped);
                warn!(
                    error = %e,
                    tx = ?log.transaction_hash,
                    block = ?log.block_number,
                    "dropping swap log"
                );
            }
        }
    }

    sort_newest_first(&mut events);
    batch.events = events;
    Ok(batch)
}

async fn build_event<R>(
    reader: &R,
    log: &Log,
    query: &SwapQuery<'_>,
    (from, to): (u64, u64),
    timestamps: &mut HashMap<u64, u64>,
) -> Result<SwapEvent, ChainError>
where
    R: ChainReader + ?Sized,
{
    let block_number = log
        .block_number
        .ok_or_else(|| ChainError::MalformedLog("missing block number".into()))?
        .as_u64();

    if block_number < from || block_number > to {
        return Err(ChainError::MalformedLog(format!(
            "block {block_number} outside [{from}, {to}]"
        )));
    }

    let tx_hash = log
        .transaction_hash
        .ok_or_else(|| ChainError::MalformedLog("missing transaction hash".into()))?;

    let swap = decode_swap(log)?;

    let timestamp = match timestamps.get(&block_number) {
        Some(ts) => *ts,
        None => {
            let ts = reader.block_timestamp(block_number).await?;
            timestamps.insert(block_number, ts);
            ts
        }
    };

    let valuation = value_swap(&swap, query.state, query.price);

    Ok(SwapEvent {
        tx_hash,
        block_number,
        log_index: log.log_index.map(|i| i.low_u64()).unwrap_or_default(),
        timestamp,
        sender: swap.sender,
        recipient: swap.to,
        amount_base_in: valuation.amount_base_in,
        amount_quote_in: valuation.amount_quote_in,
        amount_base_out: valuation.amount_base_out,
        amount_quote_out: valuation.amount_quote_out,
        usd_in: valuation.usd_in,
        usd_out: valuation.usd_out,
        price_per_unit: valuation.price_per_unit,
        direction: valuation.direction,
    })
}
