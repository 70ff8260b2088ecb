use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// True when every price field the analyzer reads is a real number.
    pub fn is_finite(&self) -> bool {
        self.high.is_finite() && self.low.is_finite() && self.close.is_finite()
    }

    /// Current low sits above `prev`'s high: an upside gap.
    pub fn gaps_above(&self, prev: &Candle) -> bool {
        self.low > prev.high
    }

    /// Current high sits below `prev`'s low: a downside gap.
    pub fn gaps_below(&self, prev: &Candle) -> bool {
        self.high < prev.low
    }
}

/// Oldest-first run of candles at a single interval.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(candles: Vec<Candle>) -> Self {
        Self { candles }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn slice(&self, start: usize, end: usize) -> CandleSeries {
        let s = start.min(self.candles.len());
        let e = end.min(self.candles.len());
        CandleSeries::new(self.candles[s..e].to_vec())
    }

    /// Drop candles with a non-numeric high, low or close.
    pub fn finite(&self) -> CandleSeries {
        CandleSeries::new(self.candles.iter().filter(|c| c.is_finite()).cloned().collect())
    }

    pub fn highs_max(&self) -> f64 {
        self.candles
            .iter()
            .map(|c| c.high)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn lows_min(&self) -> f64 {
        self.candles
            .iter()
            .map(|c| c.low)
            .fold(f64::INFINITY, f64::min)
    }

    /// Trailing simple moving average of closes ending at the last candle.
    /// `None` until `period` candles exist.
    pub fn sma_close(&self, period: usize) -> Option<f64> {
        if period == 0 || self.candles.len() < period {
            return None;
        }
        let window = &self.candles[self.candles.len() - period..];
        Some(window.iter().map(|c| c.close).sum::<f64>() / period as f64)
    }

    /// Number of candles for which a `period` SMA is defined.
    pub fn sma_defined_len(&self, period: usize) -> usize {
        if period == 0 {
            return self.candles.len();
        }
        self.candles.len().saturating_sub(period - 1)
    }

    pub fn push(&mut self, candle: Candle) {
        self.candles.push(candle);
    }
}

impl std::ops::Index<usize> for CandleSeries {
    type Output = Candle;
    fn index(&self, index: usize) -> &Self::Output {
        &self.candles[index]
    }
}

impl IntoIterator for CandleSeries {
    type Item = Candle;
    type IntoIter = std::vec::IntoIter<Candle>;
    fn into_iter(self) -> Self::IntoIter {
        self.candles.into_iter()
    }
}

impl<'a> IntoIterator for &'a CandleSeries {
    type Item = &'a Candle;
    type IntoIter = std::slice::Iter<'a, Candle>;
    fn into_iter(self) -> Self::IntoIter {
        self.candles.iter()
    }
}
