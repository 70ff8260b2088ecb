mod bot;

use anyhow::Result;
use time::format_description::well_known::Rfc3339;
use time::UtcOffset;
use tracing_subscriber::{fmt, EnvFilter};

use smc_signal_bot::config::Config;
use smc_signal_bot::exchange::YahooClient;
use smc_signal_bot::notify::TelegramNotifier;
use smc_signal_bot::screener::TradingViewScreener;

use crate::bot::SignalBot;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();

    // Initialize tracing, stamped in exchange-local time
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));
    let offset = UtcOffset::from_hms(cfg.log_utc_offset_hours, 0, 0).unwrap_or(UtcOffset::UTC);

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(fmt::time::OffsetTime::new(offset, Rfc3339))
        .init();

    let screener = Box::new(TradingViewScreener::new(&cfg)?);
    let source = Box::new(YahooClient::new(&cfg)?);
    let notifier = Box::new(TelegramNotifier::new(&cfg)?);

    let mode = std::env::args().nth(1).unwrap_or_default();
    let mut bot = SignalBot::new(cfg, screener, source, notifier);

    match mode.as_str() {
        "scan" => bot.scan().await,
        "update" => bot.update().await,
        "once" => bot.run_pass().await,
        "" | "run" => bot.run().await?,
        other => anyhow::bail!("Unknown mode {:?} (expected scan, update, once or run)", other),
    }

    Ok(())
}
