use serde::{Deserialize, Serialize};

use crate::models::{Candle, CandleSeries, Trend};

/// Gap between the current bar and the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FairValueGap {
    pub direction: Trend,
    pub top: f64,
    pub bottom: f64,
}

/// Reference level left by the bar preceding a structure break.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderBlock {
    pub direction: Trend,
    pub price: f64,
}

/// Look for a gap between the last two candles.
pub fn detect_fvg(candles: &CandleSeries) -> Option<FairValueGap> {
    let len = candles.len();
    if len < 2 {
        return None;
    }
    let prev = &candles[len - 2];
    let curr = &candles[len - 1];

    if curr.gaps_above(prev) {
        Some(FairValueGap {
            direction: Trend::Bullish,
            top: curr.low,
            bottom: prev.high,
        })
    } else if curr.gaps_below(prev) {
        Some(FairValueGap {
            direction: Trend::Bearish,
            top: prev.low,
            bottom: curr.high,
        })
    } else {
        None
    }
}

/// The candle before the current one marks the order block. Its low anchors an
/// upside break, its high a downside break.
pub fn order_block(candles: &CandleSeries, bos_up: bool, bos_down: bool) -> Option<OrderBlock> {
    let len = candles.len();
    if len < 2 {
        return None;
    }
    let prev: &Candle = &candles[len - 2];

    if bos_up {
        Some(OrderBlock {
            direction: Trend::Bullish,
            price: prev.low,
        })
    } else if bos_down {
        Some(OrderBlock {
            direction: Trend::Bearish,
            price: prev.high,
        })
    } else {
        None
    }
}
