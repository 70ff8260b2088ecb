use anyhow::Result;
use chrono::Utc;
use tracing::{error, info};

use smc_signal_bot::config::Config;
use smc_signal_bot::core::schedule::RunSchedule;
use smc_signal_bot::exchange::PriceSource;
use smc_signal_bot::notify::Notifier;
use smc_signal_bot::screener::Screener;
use smc_signal_bot::trading::reconcile::reconcile_open;
use smc_signal_bot::trading::scan::run_scan;
use smc_signal_bot::trading::{JsonFileStore, PositionLedger};

pub struct SignalBot {
    config: Config,
    screener: Box<dyn Screener>,
    source: Box<dyn PriceSource>,
    notifier: Box<dyn Notifier>,
    ledger: PositionLedger<JsonFileStore>,
    schedule: RunSchedule,
}

impl SignalBot {
    pub fn new(
        config: Config,
        screener: Box<dyn Screener>,
        source: Box<dyn PriceSource>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        info!("{}", "=".repeat(60));
        info!("SMC signal bot starting up");
        info!("Market TZ: {}", config.market_tz);
        info!("Position log: {}", config.store_path);
        info!(
            "Screener: {} {:?} (limit {}), fallback {}",
            config.screener_market,
            config.screener_ranking,
            config.screener_limit,
            config.default_ticker
        );
        info!(
            "Analysis: {} bars over {} days",
            config.analysis_timeframe, config.analysis_lookback_days
        );
        if !config.telegram_configured() {
            info!("Telegram not configured, alerts will only be logged");
        }
        info!("{}", "=".repeat(60));

        let ledger = PositionLedger::new(JsonFileStore::new(&config.store_path));
        let schedule = RunSchedule::new(&config);

        Self {
            config,
            screener,
            source,
            notifier,
            ledger,
            schedule,
        }
    }

    /// Sleep until each scheduled time and run a full pass. Ctrl+C while
    /// waiting stops the loop.
    pub async fn run(&mut self) -> Result<()> {
        info!("Scheduler active. Runs at: {} ({})", self.schedule.describe(), self.config.market_tz);

        loop {
            let Some((next, wait)) = self.schedule.wait_until_next(Utc::now()) else {
                anyhow::bail!("Schedule is empty, nothing to run");
            };
            info!(
                "Next run: {} (in {:.0} seconds)",
                next.format("%Y-%m-%d %H:%M:%S %Z"),
                wait.as_secs_f64()
            );

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Scheduler stopped by user.");
                    return Ok(());
                }
                _ = tokio::time::sleep(wait) => {}
            }

            info!(
                "Running pass at {}",
                Utc::now().with_timezone(&self.config.market_tz).format("%Y-%m-%d %H:%M:%S")
            );
            self.run_pass().await;

            // Guard against a double fire when the clock lands on the trigger again.
            tokio::time::sleep(self.config.rerun_guard).await;
        }
    }

    /// Screen + analyze, then reconcile.
    pub async fn run_pass(&mut self) {
        self.scan().await;
        self.update().await;
        info!("Pass complete.");
    }

    pub async fn scan(&mut self) {
        info!("--- Fetching new signals ---");
        run_scan(
            &self.config,
            self.screener.as_ref(),
            self.source.as_mut(),
            &mut self.ledger,
            self.notifier.as_ref(),
        )
        .await;
    }

    pub async fn update(&mut self) {
        info!("--- Checking open signals (TP/SL) ---");
        if let Err(e) = reconcile_open(
            &mut self.ledger,
            self.source.as_mut(),
            self.notifier.as_ref(),
            self.config.notify_open,
        )
        .await
        {
            error!("Reconcile failed: {}", e);
        }
    }
}
