pub mod candle;
pub mod signal;
pub mod timeframe;

pub use candle::{Candle, CandleSeries};
pub use signal::*;
pub use timeframe::Timeframe;
