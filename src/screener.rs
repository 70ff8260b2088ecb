use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{Config, ScreenerRanking};

const USER_AGENT: &str = "Mozilla/5.0";

#[async_trait]
pub trait Screener: Send + Sync {
    /// Ranked, deduplicated tickers in local exchange form. Empty when the
    /// upstream could not be reached.
    async fn candidates(&self, limit: usize) -> Vec<String>;
}

#[derive(Debug, Deserialize)]
struct ScanResponse {
    #[serde(default)]
    data: Vec<ScanRow>,
}

#[derive(Debug, Deserialize)]
struct ScanRow {
    #[serde(default)]
    s: Option<String>,
    #[serde(default)]
    symbol: Option<String>,
}

/// TradingView scanner for one market.
pub struct TradingViewScreener {
    client: Client,
    market: String,
    ranking: ScreenerRanking,
    retries: u32,
    backoff: Duration,
    exchange_prefix: String,
    exchange_suffix: String,
}

impl TradingViewScreener {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(cfg.http_timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            market: cfg.screener_market.clone(),
            ranking: cfg.screener_ranking,
            retries: cfg.screener_retries.max(1),
            backoff: cfg.screener_backoff,
            exchange_prefix: cfg.exchange_prefix.clone(),
            exchange_suffix: cfg.exchange_suffix.clone(),
        })
    }

    fn payload(&self, limit: usize) -> serde_json::Value {
        let field = self.ranking.sort_field();
        let mut filter = vec![json!({"left": field, "operation": "nempty"})];
        if self.ranking == ScreenerRanking::Gainers {
            filter.push(json!({"left": "change", "operation": "greater", "right": 0}));
        }
        json!({
            "filter": filter,
            "options": {"lang": "en"},
            "symbols": {"query": {"types": []}, "tickers": []},
            "columns": ["name", "close", "change", "volume"],
            "sort": {"sortBy": field, "sortOrder": "desc"},
            "range": [0, limit],
        })
    }

    async fn scan_once(&self, limit: usize) -> Result<ScanResponse> {
        let url = format!("https://scanner.tradingview.com/{}/scan", self.market);
        let resp = self
            .client
            .post(&url)
            .json(&self.payload(limit))
            .send()
            .await
            .context("Failed to reach TradingView scanner")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("TradingView scanner error {}: {}", status, body);
        }

        resp.json().await.context("Failed to parse scanner response")
    }
}

#[async_trait]
impl Screener for TradingViewScreener {
    async fn candidates(&self, limit: usize) -> Vec<String> {
        let mut attempt = 0;
        let data = loop {
            info!("Fetching {:?} ranking from TradingView ({})", self.ranking, self.market);
            match self.scan_once(limit).await {
                Ok(data) => break data,
                Err(e) => {
                    attempt += 1;
                    warn!(
                        "Screener request failed (attempt {}/{}): {:#}",
                        attempt, self.retries, e
                    );
                    if attempt >= self.retries {
                        return Vec::new();
                    }
                    tokio::time::sleep(self.backoff * attempt).await;
                }
            }
        };

        let raw = data
            .data
            .into_iter()
            .filter_map(|row| row.s.or(row.symbol));
        let tickers = normalize_all(raw, &self.exchange_prefix, &self.exchange_suffix, limit);
        info!("Screener returned {} tickers: {:?}", tickers.len(), tickers);
        tickers
    }
}

/// Map a scanner symbol onto the local `TICKER<suffix>` convention.
/// `IDX:BBRI` and `BBRI` both become `BBRI.JK`; symbols qualified with another
/// exchange are dropped.
pub fn normalize_symbol(raw: &str, prefix: &str, suffix: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Some((exchange, code)) = raw.split_once(':') {
        return (exchange == prefix && !code.is_empty()).then(|| format!("{}{}", code, suffix));
    }
    if raw.ends_with(suffix) {
        return Some(raw.to_string());
    }
    Some(format!("{}{}", raw, suffix))
}

/// Normalize, dedup (first occurrence wins) and cap at `limit`.
pub fn normalize_all<I, S>(raw: I, prefix: &str, suffix: &str, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for s in raw {
        if out.len() >= limit {
            break;
        }
        if let Some(t) = normalize_symbol(s.as_ref(), prefix, suffix) {
            if !out.contains(&t) {
                out.push(t);
            }
        }
    }
    out
}

/// The screener result, or the single fallback ticker when it came back empty.
pub fn resolve_universe(candidates: Vec<String>, default_ticker: &str) -> Vec<String> {
    if candidates.is_empty() {
        warn!("No screener candidates, falling back to {}", default_ticker);
        vec![default_ticker.to_string()]
    } else {
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::default_test_config;

    #[test]
    fn normalizes_exchange_forms() {
        assert_eq!(normalize_symbol("IDX:BBRI", "IDX", ".JK").as_deref(), Some("BBRI.JK"));
        assert_eq!(normalize_symbol("BBRI.JK", "IDX", ".JK").as_deref(), Some("BBRI.JK"));
        assert_eq!(normalize_symbol("TLKM", "IDX", ".JK").as_deref(), Some("TLKM.JK"));
        assert_eq!(normalize_symbol("NASDAQ:AAPL", "IDX", ".JK"), None);
        assert_eq!(normalize_symbol("IDX:", "IDX", ".JK"), None);
        assert_eq!(normalize_symbol("  ", "IDX", ".JK"), None);
    }

    #[test]
    fn dedups_and_caps() {
        let raw = ["IDX:BBRI", "BBRI.JK", "NYSE:X", "IDX:TLKM", "ASII", "IDX:GOTO"];
        let out = normalize_all(raw, "IDX", ".JK", 3);
        assert_eq!(out, vec!["BBRI.JK", "TLKM.JK", "ASII.JK"]);
    }

    #[test]
    fn empty_universe_falls_back_to_default() {
        assert_eq!(resolve_universe(Vec::new(), "BBRI.JK"), vec!["BBRI.JK"]);
        let some = vec!["TLKM.JK".to_string()];
        assert_eq!(resolve_universe(some.clone(), "BBRI.JK"), some);
    }

    #[test]
    fn payload_sorts_by_ranking_field() {
        let mut cfg = default_test_config();
        let gainers = TradingViewScreener::new(&cfg).unwrap().payload(10);
        assert_eq!(gainers["sort"]["sortBy"], "change");
        assert_eq!(gainers["filter"].as_array().unwrap().len(), 2);
        assert_eq!(gainers["range"][1], 10);

        cfg.screener_ranking = ScreenerRanking::Volume;
        let volume = TradingViewScreener::new(&cfg).unwrap().payload(5);
        assert_eq!(volume["sort"]["sortBy"], "volume");
        assert_eq!(volume["filter"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn scan_rows_accept_either_symbol_key() {
        let raw = r#"{"totalCount":2,"data":[{"s":"IDX:BBRI","d":[]},{"symbol":"TLKM"},{"d":[]}]}"#;
        let resp: ScanResponse = serde_json::from_str(raw).unwrap();
        let syms: Vec<String> = resp.data.into_iter().filter_map(|r| r.s.or(r.symbol)).collect();
        assert_eq!(syms, vec!["IDX:BBRI", "TLKM"]);
    }
}
