use std::sync::Arc;
use std::time::Duration;

use common::logger::init_logger;
use poolwatch::{
    chain::{validate_pair_address, EthersChainReader, SwapNotice, SwapSubscriber},
    config::AppConfig,
    market::{format, PoolPriceService},
    market_view::PoolViewStore,
    metrics::Counters,
    time::now_secs,
};
use tokio::sync::mpsc;

/// How often the current snapshot is written to the log.
const REPORT_INTERVAL: Duration = Duration::from_secs(15);

/// Opens the WebSocket subscription and forwards swap notices to the service.
///
/// A pair that cannot be subscribed to is logged; the service keeps serving
/// explicit refreshes without live updates.
async fn start_subscriber(cfg: &AppConfig, tx: mpsc::Sender<SwapNotice>) {
    let pair = match validate_pair_address(&cfg.pair_address) {
        Ok(pair) => pair,
        Err(e) => {
            tracing::warn!(error = %e, "live updates disabled");
            return;
        }
    };

    match SwapSubscriber::connect(&cfg.ws_url, pair, cfg.resubscribe_delay()).await {
        Ok(subscriber) => {
            tokio::spawn(subscriber.run(tx));
        }
        Err(e) => {
            tracing::error!(error = %e, ws_url = %cfg.ws_url, "failed to open swap subscription");
        }
    }
}

/// Periodically logs the published view. Reads memory only.
fn start_report_loop(view: PoolViewStore, counters: Counters) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(REPORT_INTERVAL);

        loop {
            ticker.tick().await;

            let v = view.get().await;

            tracing::info!(
                price = v.current_pool_price,
                has_pool_data = v.has_pool_data,
                swaps = v.swap_events.len(),
                volume_24h = %format::format_amount(v.pool_metrics.volume_24h),
                tvl = %format::format_amount(v.pool_metrics.tvl),
                liquidity = %format::format_amount(v.pool_metrics.liquidity),
                is_loading = v.is_loading,
                error = ?v.error,
                refreshes = Counters::get(&counters.refreshes_published),
                failures = Counters::get(&counters.refresh_failures),
                dropped = Counters::get(&counters.events_dropped),
                "pool report"
            );

            let rows = format::activity_rows(&v.swap_events, now_secs(), format::ACTIVITY_LIMIT);
            match serde_json::to_string(&rows) {
                Ok(json) => tracing::info!(rows = %json, "recent activity"),
                Err(e) => tracing::warn!(error = %e, "failed to encode activity rows"),
            }
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env()?;
    init_logger("poolwatch", cfg.json_logs);

    tracing::info!("Starting poolwatch...");

    let reader = Arc::new(EthersChainReader::connect_http(&cfg.rpc_url)?);
    let counters = Counters::default();

    let service = Arc::new(PoolPriceService::new(
        reader,
        &cfg.pair_address,
        cfg.service_settings(),
        counters.clone(),
    ));

    let outcome = service.refresh_data().await;
    tracing::info!(?outcome, "initial refresh finished");

    let (notice_tx, notice_rx) = mpsc::channel::<SwapNotice>(64);
    start_subscriber(&cfg, notice_tx).await;
    tokio::spawn(Arc::clone(&service).run(notice_rx));

    start_report_loop(service.view(), counters);

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    Ok(())
}
