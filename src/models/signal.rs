use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Trend {
    Bullish,
    Bearish,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Bullish => write!(f, "BULLISH"),
            Trend::Bearish => write!(f, "BEARISH"),
        }
    }
}

impl Trend {
    /// The call a confirmed setup in this trend produces.
    pub fn to_side(self) -> Side {
        match self {
            Trend::Bullish => Side::Buy,
            Trend::Bearish => Side::Sell,
        }
    }
}

/// Final call of one analysis pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Call {
    Buy,
    Sell,
    Wait,
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Call::Buy => write!(f, "BUY"),
            Call::Sell => write!(f, "SELL"),
            Call::Wait => write!(f, "WAIT"),
        }
    }
}

impl Call {
    pub fn side(self) -> Option<Side> {
        match self {
            Call::Buy => Some(Side::Buy),
            Call::Sell => Some(Side::Sell),
            Call::Wait => None,
        }
    }

    pub fn is_wait(self) -> bool {
        self == Call::Wait
    }
}

/// Direction of a tracked position. Unlike [`Call`] it has no `WAIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

impl From<Side> for Call {
    fn from(side: Side) -> Self {
        match side {
            Side::Buy => Call::Buy,
            Side::Sell => Call::Sell,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionStatus {
    Open,
    TpHit,
    SlHit,
}

impl fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionStatus::Open => write!(f, "OPEN"),
            PositionStatus::TpHit => write!(f, "TP_HIT"),
            PositionStatus::SlHit => write!(f, "SL_HIT"),
        }
    }
}

impl PositionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, PositionStatus::Open)
    }

    pub fn resolution(self) -> Option<ResolutionKind> {
        match self {
            PositionStatus::Open => None,
            PositionStatus::TpHit => Some(ResolutionKind::TakeProfit),
            PositionStatus::SlHit => Some(ResolutionKind::StopLoss),
        }
    }
}

/// How a position left `OPEN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionKind {
    TakeProfit,
    StopLoss,
}

impl fmt::Display for ResolutionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionKind::TakeProfit => write!(f, "TAKE PROFIT HIT"),
            ResolutionKind::StopLoss => write!(f, "STOP LOSS HIT"),
        }
    }
}
