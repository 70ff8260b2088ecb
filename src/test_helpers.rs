use chrono::{DateTime, Duration, NaiveTime, Utc};
use std::time::Duration as StdDuration;

use crate::config::{Config, ScreenerRanking};
use crate::core::structure::StructureVerdict;
use crate::models::{Call, Candle, CandleSeries, Timeframe, Trend};

fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-01-15T02:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// Create candles from (open, high, low, close) tuples with auto-incrementing 1h timestamps.
pub fn make_candles(data: &[(f64, f64, f64, f64)]) -> CandleSeries {
    let base = base_time();

    let candles: Vec<Candle> = data
        .iter()
        .enumerate()
        .map(|(i, &(o, h, l, c))| Candle {
            timestamp: base + Duration::hours(i as i64),
            open: o,
            high: h,
            low: l,
            close: c,
            volume: 100.0,
        })
        .collect();

    CandleSeries::new(candles)
}

/// `n` identical bars closing at `price` with a one point range either side.
pub fn flat_series(n: usize, price: f64) -> CandleSeries {
    let data: Vec<(f64, f64, f64, f64)> = (0..n)
        .map(|_| (price, price + 1.0, price - 1.0, price))
        .collect();
    make_candles(&data)
}

/// Append one (open, high, low, close) bar an hour after the last one.
pub fn with_last(mut series: CandleSeries, bar: (f64, f64, f64, f64)) -> CandleSeries {
    let timestamp = series
        .last()
        .map(|c| c.timestamp + Duration::hours(1))
        .unwrap_or_else(base_time);
    let (open, high, low, close) = bar;
    series.push(Candle {
        timestamp,
        open,
        high,
        low,
        close,
        volume: 100.0,
    });
    series
}

/// A confirmed verdict with ±5% levels around `price`.
pub fn confirmed_verdict(ticker: &str, call: Call, price: f64) -> StructureVerdict {
    let (tp, sl) = match call {
        Call::Sell => (price * 0.95, price * 1.05),
        _ => (price * 1.05, price * 0.95),
    };
    StructureVerdict {
        ticker: ticker.to_string(),
        trend: Some(if call == Call::Sell {
            Trend::Bearish
        } else {
            Trend::Bullish
        }),
        bos_up: call == Call::Buy,
        bos_down: call == Call::Sell,
        fvg: true,
        order_block: Some(price * 0.99),
        call,
        price: Some(price),
        take_profit: Some(tp),
        stop_loss: Some(sl),
    }
}

/// A Config suitable for testing — no credentials, store in the temp dir.
pub fn default_test_config() -> Config {
    Config {
        market_tz: chrono_tz::Asia::Jakarta,
        schedule: ["07:58", "12:00", "17:00", "20:00"]
            .iter()
            .filter_map(|s| NaiveTime::parse_from_str(s, "%H:%M").ok())
            .collect(),
        default_ticker: "BBRI.JK".to_string(),
        exchange_prefix: "IDX".to_string(),
        exchange_suffix: ".JK".to_string(),
        screener_market: "indonesia".to_string(),
        screener_ranking: ScreenerRanking::Gainers,
        screener_limit: 50,
        screener_retries: 3,
        screener_backoff: StdDuration::from_millis(0),
        analysis_timeframe: Timeframe::H1,
        analysis_lookback_days: 14,
        telegram_token: String::new(),
        telegram_chat_id: String::new(),
        notify_open: false,
        store_path: std::env::temp_dir()
            .join(format!("smc_bot_test_{}.json", std::process::id()))
            .to_string_lossy()
            .to_string(),
        http_timeout: StdDuration::from_secs(1),
        rerun_guard: StdDuration::from_millis(0),
        log_level: "debug".to_string(),
        log_utc_offset_hours: 7,
    }
}
