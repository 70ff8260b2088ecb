use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use crate::models::Timeframe;

const DEFAULT_SCHEDULE: &str = "07:58,12:00,17:00,20:00";

/// Which ranked list the screener asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenerRanking {
    Gainers,
    Volume,
}

impl ScreenerRanking {
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "gainers" | "change" => Some(ScreenerRanking::Gainers),
            "volume" => Some(ScreenerRanking::Volume),
            _ => None,
        }
    }

    pub fn sort_field(&self) -> &'static str {
        match self {
            ScreenerRanking::Gainers => "change",
            ScreenerRanking::Volume => "volume",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Market
    pub market_tz: Tz,
    pub schedule: Vec<NaiveTime>,
    pub default_ticker: String,
    pub exchange_prefix: String,
    pub exchange_suffix: String,

    // Screener
    pub screener_market: String,
    pub screener_ranking: ScreenerRanking,
    pub screener_limit: usize,
    pub screener_retries: u32,
    pub screener_backoff: Duration,

    // Analysis
    pub analysis_timeframe: Timeframe,
    pub analysis_lookback_days: i64,

    // Telegram
    pub telegram_token: String,
    pub telegram_chat_id: String,
    pub notify_open: bool,

    // Ledger
    pub store_path: String,

    // HTTP / scheduling
    pub http_timeout: Duration,
    pub rerun_guard: Duration,

    // Logging
    pub log_level: String,
    pub log_utc_offset_hours: i8,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let env = |key: &str, default: &str| -> String {
            std::env::var(key).unwrap_or_else(|_| default.to_string())
        };

        let market_tz = env("MARKET_TZ", "Asia/Jakarta")
            .parse::<Tz>()
            .unwrap_or(chrono_tz::Asia::Jakarta);

        let mut schedule = parse_schedule(&env("SCHEDULE_TIMES", DEFAULT_SCHEDULE));
        if schedule.is_empty() {
            warn!("SCHEDULE_TIMES has no valid HH:MM entries, using {}", DEFAULT_SCHEDULE);
            schedule = parse_schedule(DEFAULT_SCHEDULE);
        }

        Config {
            market_tz,
            schedule,
            default_ticker: env("DEFAULT_TICKER", "BBRI.JK"),
            exchange_prefix: env("EXCHANGE_PREFIX", "IDX"),
            exchange_suffix: env("EXCHANGE_SUFFIX", ".JK"),
            screener_market: env("SCREENER_MARKET", "indonesia"),
            screener_ranking: ScreenerRanking::from_str_loose(&env("SCREENER_RANKING", "gainers"))
                .unwrap_or(ScreenerRanking::Gainers),
            screener_limit: env("SCREENER_LIMIT", "50").parse().unwrap_or(50),
            screener_retries: env("SCREENER_RETRIES", "3").parse().unwrap_or(3),
            screener_backoff: Duration::from_secs(
                env("SCREENER_BACKOFF_SECS", "1").parse().unwrap_or(1),
            ),
            analysis_timeframe: Timeframe::from_str_loose(&env("ANALYSIS_INTERVAL", "1h"))
                .unwrap_or(Timeframe::H1),
            analysis_lookback_days: env("ANALYSIS_LOOKBACK_DAYS", "14").parse().unwrap_or(14),
            telegram_token: env("TELEGRAM_TOKEN", ""),
            telegram_chat_id: env("TELEGRAM_CHAT_ID", ""),
            notify_open: env("NOTIFY_OPEN", "false").to_lowercase() == "true",
            store_path: env("SIGNALS_LOG", "signals_log.json"),
            http_timeout: Duration::from_secs(env("HTTP_TIMEOUT_SECS", "10").parse().unwrap_or(10)),
            rerun_guard: Duration::from_secs(env("RERUN_GUARD_SECS", "1").parse().unwrap_or(1)),
            log_level: env("LOG_LEVEL", "info"),
            log_utc_offset_hours: env("LOG_UTC_OFFSET_HOURS", "7").parse().unwrap_or(7),
        }
    }

    pub fn telegram_configured(&self) -> bool {
        !self.telegram_token.is_empty() && !self.telegram_chat_id.is_empty()
    }
}

/// Parse a comma separated list of `HH:MM` times, skipping bad entries.
pub fn parse_schedule(raw: &str) -> Vec<NaiveTime> {
    let mut times: Vec<NaiveTime> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match NaiveTime::parse_from_str(s, "%H:%M") {
            Ok(t) => Some(t),
            Err(e) => {
                warn!("Ignoring schedule entry {:?}: {}", s, e);
                None
            }
        })
        .collect();
    times.sort();
    times.dedup();
    times
}
