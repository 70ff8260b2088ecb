use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::Config;
use crate::exchange::PriceSource;
use crate::models::{Candle, CandleSeries, Timeframe};

const BASE_URL: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0";
// Requests are sequential. `latest_price` may issue two, so one ticker can
// block for up to 2 * (MIN_REQUEST_INTERVAL + http_timeout).
const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

/// Columns are parallel to `timestamp`; any cell may be null.
#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Yahoo Finance chart endpoint.
pub struct YahooClient {
    client: Client,
    last_request: Option<Instant>,
    cache: HashMap<String, (Instant, CandleSeries)>,
    cache_ttl: Duration,
}

impl YahooClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(cfg.http_timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            last_request: None,
            cache: HashMap::new(),
            cache_ttl: Duration::from_secs(60),
        })
    }

    async fn rate_limit(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < MIN_REQUEST_INTERVAL {
                tokio::time::sleep(MIN_REQUEST_INTERVAL - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }

    pub async fn fetch_chart(
        &mut self,
        ticker: &str,
        tf: Timeframe,
        lookback_days: i64,
    ) -> Result<CandleSeries> {
        let cache_key = format!("{}_{}_{}", ticker, tf, lookback_days);
        if let Some((cached_at, series)) = self.cache.get(&cache_key) {
            if cached_at.elapsed() < self.cache_ttl {
                return Ok(series.clone());
            }
        }

        self.rate_limit().await;

        let end = Utc::now().timestamp();
        let start = end - lookback_days * 86_400;

        let resp = self
            .client
            .get(format!("{}/v8/finance/chart/{}", BASE_URL, ticker))
            .query(&[
                ("period1", start.to_string()),
                ("period2", end.to_string()),
                ("interval", tf.yahoo_interval().to_string()),
                ("includePrePost", "false".to_string()),
            ])
            .send()
            .await
            .with_context(|| format!("Failed to fetch chart for {}", ticker))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Yahoo chart error {} for {}: {}", status, ticker, body);
        }

        let data: ChartResponse = resp
            .json()
            .await
            .with_context(|| format!("Failed to parse chart for {}", ticker))?;
        let series = parse_chart(data)?;
        debug!("{}: fetched {} {} candles", ticker, series.len(), tf);

        self.cache
            .insert(cache_key, (Instant::now(), series.clone()));

        Ok(series)
    }
}

/// Zip the parallel quote columns into candles, dropping rows with any gap.
fn parse_chart(data: ChartResponse) -> Result<CandleSeries> {
    if let Some(err) = data.chart.error {
        anyhow::bail!("Yahoo chart error {}: {}", err.code, err.description);
    }

    let result = match data.chart.result.and_then(|r| r.into_iter().next()) {
        Some(r) => r,
        None => return Ok(CandleSeries::default()),
    };
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    fn cell(col: &[Option<f64>], i: usize) -> Option<f64> {
        col.get(i).copied().flatten()
    }

    let mut candles: Vec<Candle> = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let candle = Candle {
                timestamp: DateTime::from_timestamp(ts, 0)?,
                open: cell(&quote.open, i)?,
                high: cell(&quote.high, i)?,
                low: cell(&quote.low, i)?,
                close: cell(&quote.close, i)?,
                volume: cell(&quote.volume, i).unwrap_or(0.0),
            };
            candle.is_finite().then_some(candle)
        })
        .collect();

    candles.sort_by_key(|c| c.timestamp);
    Ok(CandleSeries::new(candles))
}

#[async_trait]
impl PriceSource for YahooClient {
    async fn fetch_candles(
        &mut self,
        ticker: &str,
        tf: Timeframe,
        lookback_days: i64,
    ) -> Result<CandleSeries> {
        self.fetch_chart(ticker, tf, lookback_days).await
    }

    /// Last 1m close of the day, or the last 1h close of the week when the
    /// minute feed is empty.
    async fn latest_price(&mut self, ticker: &str) -> Result<f64> {
        let minute = self.fetch_chart(ticker, Timeframe::M1, 1).await?;
        let series = if minute.is_empty() {
            self.fetch_chart(ticker, Timeframe::H1, 5).await?
        } else {
            minute
        };
        series
            .last()
            .map(|c| c.close)
            .with_context(|| format!("No price data for {}", ticker))
    }
}
