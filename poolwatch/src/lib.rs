pub mod chain;
pub mod config;
pub mod market;
pub mod market_view;
pub mod metrics;

pub mod error;
pub mod time;
