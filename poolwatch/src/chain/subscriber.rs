//! Live `Swap` subscription.
//!
//! Data flow:
//! WebSocket log stream → ready batches → `SwapNotice` (block of the last log)
//! → mpsc channel → `PoolPriceService::run`.
//!
//! There is no polling fallback: swaps emitted while the stream is down are
//! not replayed here, only picked up by the next anchored refresh.

use std::sync::Arc;
use std::time::Duration;

use ethers::providers::{Middleware, Provider, Ws};
use ethers::types::{Address, Log};
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use crate::chain::bindings::swap_filter;
use crate::chain::errors::ChainError;

/// Maximum number of logs folded into one notice.
const MAX_LOGS_PER_BATCH: usize = 64;

/// "New swaps landed": refetch anchored at `block_number`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapNotice {
    pub block_number: u64,
}

/// The receiving side of the notice channel was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoticeReceiverClosed;

/// Turns batches of raw logs into notices.
///
/// Each non-empty batch yields exactly one notice carrying the block number of
/// its *last* log. Logs without a block number (pending) are ignored. Returns
/// `Ok` when the stream ends.
pub async fn forward_swap_batches<S>(
    batches: S,
    tx: &mpsc::Sender<SwapNotice>,
) -> Result<(), NoticeReceiverClosed>
where
    S: Stream<Item = Vec<Log>>,
{
    let mut batches = std::pin::pin!(batches);

    while let Some(batch) = batches.next().await {
        let Some(block_number) = batch
            .iter()
            .rev()
            .find_map(|log| log.block_number.map(|n| n.as_u64()))
        else {
            continue;
        };

        debug!(logs = batch.len(), block_number, "swap batch observed");

        tx.send(SwapNotice { block_number })
            .await
            .map_err(|_| NoticeReceiverClosed)?;
    }

    Ok(())
}

/// WebSocket subscriber for one pair's `Swap` events.
pub struct SwapSubscriber {
    provider: Arc<Provider<Ws>>,
    pair: Address,
    resubscribe_delay: Duration,
}

impl SwapSubscriber {
    pub async fn connect(
        ws_url: &str,
        pair: Address,
        resubscribe_delay: Duration,
    ) -> Result<Self, ChainError> {
        let ws = Ws::connect_with_reconnects(ws_url, 5)
            .await
            .map_err(|e| ChainError::Transport(e.to_string()))?;

        Ok(Self {
            provider: Arc::new(Provider::new(ws)),
            pair,
            resubscribe_delay,
        })
    }

    /// Forwards notices until the receiver goes away.
    ///
    /// A stream that ends or fails to open is re-subscribed after
    /// `resubscribe_delay`.
    #[instrument(skip(self, tx), fields(pair = %self.pair))]
    pub async fn run(self, tx: mpsc::Sender<SwapNotice>) {
        let filter = swap_filter(self.pair);

        loop {
            match self.provider.subscribe_logs(&filter).await {
                Ok(stream) => {
                    info!("subscribed to swap logs");

                    let batches = stream.ready_chunks(MAX_LOGS_PER_BATCH);
                    if forward_swap_batches(batches, &tx).await.is_err() {
                        info!("notice receiver closed; swap subscription stopped");
                        return;
                    }

                    warn!("swap log stream ended; re-subscribing");
                }
                Err(e) => {
                    error!(error = %e, "failed to subscribe to swap logs");
                }
            }

            if tx.is_closed() {
                return;
            }

            tokio::time::sleep(self.resubscribe_delay).await;
        }
    }
}
