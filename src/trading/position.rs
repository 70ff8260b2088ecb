use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{PositionStatus, Side};

/// A tracked signal. Field names match the on-disk log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: String,
    #[serde(rename = "timestamp", deserialize_with = "log_time::required")]
    pub created_at: DateTime<Utc>,
    pub ticker: String,
    pub entry_price: f64,
    #[serde(rename = "tp")]
    pub take_profit: f64,
    #[serde(rename = "sl")]
    pub stop_loss: f64,
    #[serde(rename = "signal")]
    pub side: Side,
    pub status: PositionStatus,
    #[serde(default, rename = "last_price_checked")]
    pub last_price: Option<f64>,
    #[serde(default, deserialize_with = "log_time::optional")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Log timestamps are RFC 3339, or naive ISO 8601 read as UTC (older logs).
mod log_time {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de, Deserialize, Deserializer};

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
            return Some(t.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
            .map(|t| t.and_utc())
    }

    pub fn required<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp {:?}", raw)))
    }

    pub fn optional<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(d)? {
            None => Ok(None),
            Some(raw) => parse(&raw)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid timestamp {:?}", raw))),
        }
    }
}

impl Position {
    pub fn make_id(ticker: &str, at: DateTime<Utc>) -> String {
        format!("{}_{}", ticker, at.timestamp())
    }

    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    /// Status this position would move to at `price`. Take-profit is tested
    /// before stop-loss, so a single observation past both reports a win.
    pub fn evaluate(&self, price: f64) -> PositionStatus {
        match self.side {
            Side::Buy => {
                if price >= self.take_profit {
                    PositionStatus::TpHit
                } else if price <= self.stop_loss {
                    PositionStatus::SlHit
                } else {
                    PositionStatus::Open
                }
            }
            Side::Sell => {
                if price <= self.take_profit {
                    PositionStatus::TpHit
                } else if price >= self.stop_loss {
                    PositionStatus::SlHit
                } else {
                    PositionStatus::Open
                }
            }
        }
    }
}
