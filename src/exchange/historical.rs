use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

use crate::exchange::PriceSource;
use crate::models::{Candle, CandleSeries, Timeframe};

/// A PriceSource that replays pre-loaded candles per ticker.
/// A cursor (`now`) controls which candles are visible — only candles
/// with timestamp <= now are returned, simulating a forward walk.
pub struct HistoricalSource {
    data: HashMap<String, Vec<Candle>>,
    now: DateTime<Utc>,
}

impl Default for HistoricalSource {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoricalSource {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            now: Utc::now(),
        }
    }

    /// Load candles for a ticker. Candles must be sorted oldest-first.
    pub fn load(&mut self, ticker: &str, candles: Vec<Candle>) {
        self.data.insert(ticker.to_string(), candles);
    }

    /// Advance the simulation clock.
    pub fn set_time(&mut self, t: DateTime<Utc>) {
        self.now = t;
    }

    pub fn current_time(&self) -> DateTime<Utc> {
        self.now
    }

    /// Latest timestamp across all loaded tickers.
    pub fn latest_time(&self) -> Option<DateTime<Utc>> {
        self.data
            .values()
            .filter_map(|v| v.last().map(|c| c.timestamp))
            .max()
    }

    /// Candles in `(now - lookback, now]`.
    fn visible_candles(&self, ticker: &str, lookback: Duration) -> CandleSeries {
        let all = match self.data.get(ticker) {
            Some(c) => c,
            None => return CandleSeries::default(),
        };

        let end = match all.partition_point(|c| c.timestamp <= self.now) {
            0 => return CandleSeries::default(),
            n => n,
        };
        let from = self.now - lookback;
        let start = all[..end].partition_point(|c| c.timestamp <= from);

        CandleSeries::new(all[start..end].to_vec())
    }
}

#[async_trait]
impl PriceSource for HistoricalSource {
    async fn fetch_candles(
        &mut self,
        ticker: &str,
        _tf: Timeframe,
        lookback_days: i64,
    ) -> Result<CandleSeries> {
        if !self.data.contains_key(ticker) {
            anyhow::bail!("No replay data loaded for {}", ticker);
        }
        Ok(self.visible_candles(ticker, Duration::days(lookback_days)))
    }

    async fn latest_price(&mut self, ticker: &str) -> Result<f64> {
        self.visible_candles(ticker, Duration::days(5))
            .last()
            .map(|c| c.close)
            .with_context(|| format!("No price for {} at {}", ticker, self.now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::make_candles;

    fn source() -> HistoricalSource {
        let data: Vec<(f64, f64, f64, f64)> = (0..48)
            .map(|i| {
                let v = 100.0 + i as f64;
                (v, v + 1.0, v - 1.0, v + 0.5)
            })
            .collect();
        let mut src = HistoricalSource::new();
        src.load("BBRI.JK", make_candles(&data).into_iter().collect());
        src
    }

    #[tokio::test]
    async fn cursor_hides_future_candles() {
        let mut src = source();
        let first = src.data["BBRI.JK"][0].timestamp;
        src.set_time(first + Duration::hours(9));
        let series = src
            .fetch_candles("BBRI.JK", Timeframe::H1, 14)
            .await
            .unwrap();
        assert_eq!(series.len(), 10);
        let price = src.latest_price("BBRI.JK").await.unwrap();
        assert!((price - 109.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn lookback_trims_old_candles() {
        let mut src = source();
        src.set_time(src.latest_time().unwrap());
        let series = src
            .fetch_candles("BBRI.JK", Timeframe::H1, 1)
            .await
            .unwrap();
        assert_eq!(series.len(), 24);
    }

    #[tokio::test]
    async fn unknown_ticker_errors() {
        let mut src = source();
        assert!(src.fetch_candles("NOPE.JK", Timeframe::H1, 14).await.is_err());
        assert!(src.latest_price("NOPE.JK").await.is_err());
    }

    #[tokio::test]
    async fn before_first_candle_has_no_price() {
        let mut src = source();
        let first = src.data["BBRI.JK"][0].timestamp;
        src.set_time(first - Duration::hours(1));
        assert!(src.latest_price("BBRI.JK").await.is_err());
    }
}
