use serde::{Deserialize, Serialize};
use std::fmt;

/// Bar granularity requested from the price source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "1d")]
    D1,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M15 => "15m",
            Timeframe::H1 => "1h",
            Timeframe::D1 => "1d",
        }
    }

    /// Yahoo chart API `interval` parameter
    pub fn yahoo_interval(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M15 => "15m",
            Timeframe::H1 => "60m",
            Timeframe::D1 => "1d",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Timeframe> {
        match s.trim().to_lowercase().as_str() {
            "1m" => Some(Timeframe::M1),
            "15m" => Some(Timeframe::M15),
            "1h" | "60m" => Some(Timeframe::H1),
            "1d" => Some(Timeframe::D1),
            _ => None,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loose_parse() {
        assert_eq!(Timeframe::from_str_loose("1H"), Some(Timeframe::H1));
        assert_eq!(Timeframe::from_str_loose("60m"), Some(Timeframe::H1));
        assert_eq!(Timeframe::from_str_loose(" 1d "), Some(Timeframe::D1));
        assert_eq!(Timeframe::from_str_loose("4h"), None);
    }

    #[test]
    fn hourly_maps_to_yahoo_minutes() {
        assert_eq!(Timeframe::H1.yahoo_interval(), "60m");
    }
}
