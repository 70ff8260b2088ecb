use std::collections::HashMap;
use tracing::{info, warn};

use crate::error::LedgerError;
use crate::exchange::PriceSource;
use crate::notify::{deliver, Alert, Notifier, ResolutionEvent};
use crate::trading::ledger::PositionLedger;
use crate::trading::position::Position;
use crate::trading::store::PositionStore;

#[derive(Debug, Default, Clone)]
pub struct ReconcileReport {
    pub resolved: Vec<ResolutionEvent>,
    pub still_open: Vec<Position>,
    /// Tickers whose price could not be fetched this pass.
    pub skipped: Vec<String>,
}

/// Price every open position, let the ledger settle them, then announce the
/// ones that closed. Still-open positions are announced only when
/// `notify_open` is set.
pub async fn reconcile_open<S: PositionStore>(
    ledger: &mut PositionLedger<S>,
    source: &mut dyn PriceSource,
    notifier: &dyn Notifier,
    notify_open: bool,
) -> Result<ReconcileReport, LedgerError> {
    let open = ledger.open_positions()?;
    let mut report = ReconcileReport::default();
    if open.is_empty() {
        // Still reconcile so leftover terminal rows get pruned.
        info!("No open positions to check");
    }

    let mut prices: HashMap<String, f64> = HashMap::new();
    for pos in &open {
        if prices.contains_key(&pos.ticker) {
            continue;
        }
        match source.latest_price(&pos.ticker).await {
            Ok(p) if p.is_finite() => {
                prices.insert(pos.ticker.clone(), p);
            }
            Ok(p) => {
                warn!("Ignoring non-finite price {} for {}", p, pos.ticker);
                report.skipped.push(pos.ticker.clone());
            }
            Err(e) => {
                warn!("Price check failed for {}: {:#}", pos.ticker, e);
                report.skipped.push(pos.ticker.clone());
            }
        }
    }

    let resolved = ledger.reconcile(&prices)?;
    report.resolved = resolved
        .iter()
        .filter_map(ResolutionEvent::from_position)
        .collect();

    for event in &report.resolved {
        info!("{} {} {} at {:.2}", event.ticker, event.side, event.kind, event.price);
        deliver(notifier, &Alert::resolution(event)).await;
    }

    report.still_open = ledger.open_positions()?;
    if notify_open {
        for pos in &report.still_open {
            if let Some(&price) = prices.get(&pos.ticker) {
                deliver(notifier, &Alert::still_open(pos, price)).await;
            }
        }
    }

    info!(
        "Reconcile finished: {} resolved, {} still open, {} skipped",
        report.resolved.len(),
        report.still_open.len(),
        report.skipped.len()
    );
    Ok(report)
}
