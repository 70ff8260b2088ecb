use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::core::structure::StructureVerdict;
use crate::error::LedgerError;
use crate::models::PositionStatus;
use crate::trading::position::Position;
use crate::trading::store::PositionStore;

/// Sole owner of the active position set. Every mutation is written through
/// to the store before returning.
pub struct PositionLedger<S: PositionStore> {
    store: S,
    /// When set, used instead of Utc::now() for timestamps (tests, replays)
    pub sim_time: Option<DateTime<Utc>>,
}

impl<S: PositionStore> PositionLedger<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            sim_time: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn now(&self) -> DateTime<Utc> {
        self.sim_time.unwrap_or_else(Utc::now)
    }

    pub fn open_positions(&self) -> Result<Vec<Position>, LedgerError> {
        Ok(self
            .store
            .load()?
            .into_iter()
            .filter(Position::is_open)
            .collect())
    }

    /// Open a position for a confirmed verdict, or refresh the one already
    /// open for that ticker.
    pub fn record(&mut self, verdict: &StructureVerdict) -> Result<Position, LedgerError> {
        let side = verdict.call.side().ok_or_else(|| LedgerError::Unconfirmed {
            ticker: verdict.ticker.clone(),
        })?;
        let missing = |field| LedgerError::MissingLevel {
            ticker: verdict.ticker.clone(),
            field,
        };
        let entry = verdict.price.ok_or_else(|| missing("price"))?;
        let tp = verdict.take_profit.ok_or_else(|| missing("take_profit"))?;
        let sl = verdict.stop_loss.ok_or_else(|| missing("stop_loss"))?;

        let now = self.now();
        let mut positions = self.store.load()?;

        let existing = positions
            .iter_mut()
            .find(|p| p.ticker == verdict.ticker && p.is_open());

        let position = match existing {
            Some(pos) => {
                pos.entry_price = entry;
                pos.take_profit = tp;
                pos.stop_loss = sl;
                pos.side = side;
                pos.created_at = now;
                debug!("Refreshed open position {} ({} @ {:.2})", pos.id, side, entry);
                pos.clone()
            }
            None => {
                let pos = Position {
                    id: Position::make_id(&verdict.ticker, now),
                    created_at: now,
                    ticker: verdict.ticker.clone(),
                    entry_price: entry,
                    take_profit: tp,
                    stop_loss: sl,
                    side,
                    status: PositionStatus::Open,
                    last_price: None,
                    updated_at: None,
                };
                info!("Opened position {} ({} @ {:.2})", pos.id, side, entry);
                positions.push(pos.clone());
                pos
            }
        };

        self.store.replace(&positions)?;
        Ok(position)
    }

    /// Evaluate open positions against `prices` and prune the ones that
    /// resolved. Tickers without a price are left alone.
    pub fn reconcile(
        &mut self,
        prices: &HashMap<String, f64>,
    ) -> Result<Vec<Position>, LedgerError> {
        let now = self.now();
        let positions = self.store.load()?;
        let before = positions.len();

        let mut resolved = Vec::new();
        let mut active = Vec::with_capacity(before);

        for mut pos in positions {
            if pos.status.is_terminal() {
                debug!("Pruning already-resolved row {} ({})", pos.id, pos.status);
                continue;
            }
            let Some(&price) = prices.get(&pos.ticker) else {
                active.push(pos);
                continue;
            };

            match pos.evaluate(price) {
                PositionStatus::Open => active.push(pos),
                status => {
                    pos.status = status;
                    pos.last_price = Some(price);
                    pos.updated_at = Some(now);
                    info!("Position {} {} at {:.2}", pos.id, status, price);
                    resolved.push(pos);
                }
            }
        }

        if active.len() != before {
            self.store.replace(&active)?;
        }

        Ok(resolved)
    }
}
