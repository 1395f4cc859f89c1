pub mod client;

// Re-export for convenient access (e.g. `use crate::market_data::MarketDataClient`).
pub use client::{close_prices, day_labels, MarketDataClient};
