use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::pd_arrays::{detect_fvg, order_block};
use crate::models::{Call, CandleSeries, Trend};

pub const SMA_PERIOD: usize = 20;
pub const BOS_LOOKBACK: usize = 10;
pub const TARGET_PCT: f64 = 0.05;

/// Outcome of one analysis pass over one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureVerdict {
    pub ticker: String,
    pub trend: Option<Trend>,
    pub bos_up: bool,
    pub bos_down: bool,
    pub fvg: bool,
    pub order_block: Option<f64>,
    pub call: Call,
    pub price: Option<f64>,
    pub take_profit: Option<f64>,
    pub stop_loss: Option<f64>,
}

impl StructureVerdict {
    /// Not enough usable history to say anything.
    pub fn insufficient(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            trend: None,
            bos_up: false,
            bos_down: false,
            fvg: false,
            order_block: None,
            call: Call::Wait,
            price: None,
            take_profit: None,
            stop_loss: None,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        !self.call.is_wait()
    }
}

/// Trend + break-of-structure + fair-value-gap classifier.
pub struct StructureAnalyzer {
    sma_period: usize,
    bos_lookback: usize,
    target_pct: f64,
}

impl Default for StructureAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl StructureAnalyzer {
    pub fn new() -> Self {
        Self {
            sma_period: SMA_PERIOD,
            bos_lookback: BOS_LOOKBACK,
            target_pct: TARGET_PCT,
        }
    }

    /// Candles needed before `sma_period` bars with a defined average exist
    /// and the break-of-structure window fits behind the last bar.
    pub fn min_history(&self) -> usize {
        let warmed = self.sma_period + self.sma_period.saturating_sub(1);
        warmed.max(self.bos_lookback + 1)
    }

    pub fn analyze(&self, ticker: &str, candles: &CandleSeries) -> StructureVerdict {
        let candles = candles.finite();

        if candles.is_empty()
            || candles.len() < self.min_history()
            || candles.sma_defined_len(self.sma_period) < self.sma_period
        {
            debug!(
                "{}: {} usable candles, need {}",
                ticker,
                candles.len(),
                self.min_history()
            );
            return StructureVerdict::insufficient(ticker);
        }

        let len = candles.len();
        let last = &candles[len - 1];
        let last_close = last.close;
        let sma = match candles.sma_close(self.sma_period) {
            Some(v) => v,
            None => return StructureVerdict::insufficient(ticker),
        };

        // Equality is not strength: a close sitting on the average reads bearish.
        let trend = if last_close > sma {
            Trend::Bullish
        } else {
            Trend::Bearish
        };

        let window = candles.slice(len - 1 - self.bos_lookback, len - 1);
        let bos_up = last_close > window.highs_max();
        let bos_down = last_close < window.lows_min();

        let fvg = detect_fvg(&candles).is_some();
        let ob = order_block(&candles, bos_up, bos_down);

        let confirmed = match trend {
            Trend::Bullish => bos_up,
            Trend::Bearish => bos_down,
        } && fvg
            && ob.is_some();

        let mut verdict = StructureVerdict {
            ticker: ticker.to_string(),
            trend: Some(trend),
            bos_up,
            bos_down,
            fvg,
            order_block: ob.map(|o| o.price),
            call: Call::Wait,
            price: Some(last_close),
            take_profit: None,
            stop_loss: None,
        };

        if !confirmed {
            debug!(
                "{}: {} close={:.2} sma={:.2} bos_up={} bos_down={} fvg={} -> WAIT",
                ticker, trend, last_close, sma, bos_up, bos_down, fvg
            );
            return verdict;
        }

        let side = trend.to_side();
        let (tp, sl) = self.levels(side.into(), last_close);
        verdict.call = side.into();
        verdict.take_profit = Some(tp);
        verdict.stop_loss = Some(sl);

        info!(
            "SMC setup confirmed for {}: {} @ {:.2} (TP {:.2} / SL {:.2})",
            ticker, verdict.call, last_close, tp, sl
        );

        verdict
    }

    /// Take-profit and stop-loss a fixed percentage either side of entry.
    pub fn levels(&self, call: Call, entry: f64) -> (f64, f64) {
        let up = round2(entry * (1.0 + self.target_pct));
        let down = round2(entry * (1.0 - self.target_pct));
        match call {
            Call::Sell => (down, up),
            _ => (up, down),
        }
    }
}

pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
