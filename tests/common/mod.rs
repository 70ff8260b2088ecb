#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration as StdDuration;

use smc_signal_bot::config::{Config, ScreenerRanking};
use smc_signal_bot::exchange::PriceSource;
use smc_signal_bot::models::{Candle, CandleSeries, Timeframe};
use smc_signal_bot::notify::{Alert, Notifier};
use smc_signal_bot::screener::Screener;

pub fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-01-15T02:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// Create candles from (open, high, low, close) tuples with auto-incrementing 1h timestamps.
pub fn make_candles(data: &[(f64, f64, f64, f64)]) -> Vec<Candle> {
    let base = base_time();

    data.iter()
        .enumerate()
        .map(|(i, &(o, h, l, c))| Candle {
            timestamp: base + Duration::hours(i as i64),
            open: o,
            high: h,
            low: l,
            close: c,
            volume: 100.0,
        })
        .collect()
}

/// 40 flat bars at `base`, then one gapped bar closing at 100.
/// `base` below 100 makes a BUY, above 100 a SELL.
pub fn breakout(base: f64) -> Vec<Candle> {
    let mut data: Vec<(f64, f64, f64, f64)> = (0..40)
        .map(|_| (base, base + 1.0, base - 1.0, base))
        .collect();
    if base < 100.0 {
        data.push((99.0, 101.0, 98.0, 100.0));
    } else {
        data.push((101.0, 102.0, 99.0, 100.0));
    }
    make_candles(&data)
}

/// 41 flat bars, never a signal.
pub fn quiet(price: f64) -> Vec<Candle> {
    let data: Vec<(f64, f64, f64, f64)> = (0..41)
        .map(|_| (price, price + 1.0, price - 1.0, price))
        .collect();
    make_candles(&data)
}

pub fn test_config(store_path: &str) -> Config {
    Config {
        market_tz: chrono_tz::Asia::Jakarta,
        schedule: vec![NaiveTime::from_hms_opt(7, 58, 0).unwrap()],
        default_ticker: "BBRI.JK".to_string(),
        exchange_prefix: "IDX".to_string(),
        exchange_suffix: ".JK".to_string(),
        screener_market: "indonesia".to_string(),
        screener_ranking: ScreenerRanking::Gainers,
        screener_limit: 50,
        screener_retries: 1,
        screener_backoff: StdDuration::from_millis(0),
        analysis_timeframe: Timeframe::H1,
        analysis_lookback_days: 14,
        telegram_token: String::new(),
        telegram_chat_id: String::new(),
        notify_open: false,
        store_path: store_path.to_string(),
        http_timeout: StdDuration::from_secs(1),
        rerun_guard: StdDuration::from_millis(0),
        log_level: "debug".to_string(),
        log_utc_offset_hours: 7,
    }
}

/// Screener with a canned answer.
pub struct StaticScreener(pub Vec<String>);

#[async_trait]
impl Screener for StaticScreener {
    async fn candidates(&self, limit: usize) -> Vec<String> {
        self.0.iter().take(limit).cloned().collect()
    }
}

/// Notifier that keeps every alert it is handed.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Alert>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, alert: &Alert) -> Result<()> {
        if self.fail {
            anyhow::bail!("chat unreachable");
        }
        self.sent.lock().unwrap().push(alert.clone());
        Ok(())
    }
}

/// Fixed last prices; tickers in `broken` fail.
#[derive(Default)]
pub struct FixedPrices {
    pub prices: HashMap<String, f64>,
    pub broken: HashSet<String>,
    pub calls: usize,
}

impl FixedPrices {
    pub fn with(mut self, ticker: &str, price: f64) -> Self {
        self.prices.insert(ticker.to_string(), price);
        self
    }

    pub fn broken(mut self, ticker: &str) -> Self {
        self.broken.insert(ticker.to_string());
        self
    }
}

#[async_trait]
impl PriceSource for FixedPrices {
    async fn fetch_candles(
        &mut self,
        ticker: &str,
        _tf: Timeframe,
        _lookback_days: i64,
    ) -> Result<CandleSeries> {
        anyhow::bail!("no history for {}", ticker)
    }

    async fn latest_price(&mut self, ticker: &str) -> Result<f64> {
        self.calls += 1;
        if self.broken.contains(ticker) {
            anyhow::bail!("quote timeout for {}", ticker);
        }
        self.prices
            .get(ticker)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("unknown ticker {}", ticker))
    }
}
