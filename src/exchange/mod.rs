pub mod historical;
pub mod yahoo;

pub use historical::HistoricalSource;
pub use yahoo::YahooClient;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{CandleSeries, Timeframe};

#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Oldest-first candles covering the last `lookback_days`.
    async fn fetch_candles(
        &mut self,
        ticker: &str,
        tf: Timeframe,
        lookback_days: i64,
    ) -> Result<CandleSeries>;

    /// Most recent traded price.
    async fn latest_price(&mut self, ticker: &str) -> Result<f64>;
}
