use tracing::{error, info, warn};

use crate::config::Config;
use crate::core::structure::{StructureAnalyzer, StructureVerdict};
use crate::exchange::PriceSource;
use crate::models::CandleSeries;
use crate::notify::{deliver, Alert, Notifier};
use crate::screener::{resolve_universe, Screener};
use crate::trading::ledger::PositionLedger;
use crate::trading::store::PositionStore;

#[derive(Debug, Default, Clone)]
pub struct ScanSummary {
    pub analyzed: usize,
    pub signals: Vec<StructureVerdict>,
    pub recorded: usize,
    pub notified: usize,
}

/// Screen, analyze each candidate, then persist and announce confirmed calls.
pub async fn run_scan<S: PositionStore>(
    cfg: &Config,
    screener: &dyn Screener,
    source: &mut dyn PriceSource,
    ledger: &mut PositionLedger<S>,
    notifier: &dyn Notifier,
) -> ScanSummary {
    let analyzer = StructureAnalyzer::new();
    let tickers = resolve_universe(
        screener.candidates(cfg.screener_limit).await,
        &cfg.default_ticker,
    );

    let mut summary = ScanSummary::default();

    for ticker in &tickers {
        info!("Analyzing {}...", ticker);
        let candles = match source
            .fetch_candles(ticker, cfg.analysis_timeframe, cfg.analysis_lookback_days)
            .await
        {
            Ok(c) => c,
            Err(e) => {
                warn!("Price history unavailable for {}: {:#}", ticker, e);
                CandleSeries::default()
            }
        };

        let verdict = analyzer.analyze(ticker, &candles);
        summary.analyzed += 1;
        if !verdict.is_confirmed() {
            continue;
        }

        match ledger.record(&verdict) {
            Ok(_) => summary.recorded += 1,
            Err(e) => error!("Failed to record signal for {}: {}", ticker, e),
        }

        if deliver(notifier, &Alert::signal(&verdict)).await {
            summary.notified += 1;
        }
        summary.signals.push(verdict);
    }

    info!(
        "Scan finished: {} analyzed, {} signals, {} recorded",
        summary.analyzed,
        summary.signals.len(),
        summary.recorded
    );
    summary
}
