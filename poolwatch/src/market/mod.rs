pub mod format;
pub mod gate;
pub mod metrics;
pub mod price;
pub mod service;
pub mod swaps;
pub mod types;

pub use gate::{FetchGate, GateDenied};
pub use service::{PoolPriceService, RefreshOutcome, ServiceSettings, SkipReason};
pub use types::{Direction, PairState, PoolMetrics, RawPairState, SwapEvent};
