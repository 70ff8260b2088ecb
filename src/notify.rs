use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::config::Config;
use crate::core::structure::StructureVerdict;
use crate::models::{Call, ResolutionKind, Side, Trend};
use crate::trading::position::Position;

const TELEGRAM_API: &str = "https://api.telegram.org";

/// A position that left `OPEN` on this reconcile pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionEvent {
    pub ticker: String,
    pub side: Side,
    pub kind: ResolutionKind,
    pub price: f64,
    pub take_profit: f64,
    pub stop_loss: f64,
}

impl ResolutionEvent {
    pub fn from_position(pos: &Position) -> Option<Self> {
        Some(Self {
            ticker: pos.ticker.clone(),
            side: pos.side,
            kind: pos.status.resolution()?,
            price: pos.last_price.unwrap_or(pos.entry_price),
            take_profit: pos.take_profit,
            stop_loss: pos.stop_loss,
        })
    }
}

/// One human-readable message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub ticker: String,
    pub trend: Option<Trend>,
    pub call: Call,
    pub price: Option<f64>,
    pub take_profit: Option<f64>,
    pub stop_loss: Option<f64>,
    pub note: Option<String>,
}

impl Alert {
    pub fn signal(verdict: &StructureVerdict) -> Self {
        Self {
            ticker: verdict.ticker.clone(),
            trend: verdict.trend,
            call: verdict.call,
            price: verdict.price,
            take_profit: verdict.take_profit,
            stop_loss: verdict.stop_loss,
            note: None,
        }
    }

    pub fn resolution(event: &ResolutionEvent) -> Self {
        Self {
            ticker: event.ticker.clone(),
            trend: None,
            call: event.side.into(),
            price: Some(event.price),
            take_profit: Some(event.take_profit),
            stop_loss: Some(event.stop_loss),
            note: Some(event.kind.to_string()),
        }
    }

    pub fn still_open(pos: &Position, price: f64) -> Self {
        Self {
            ticker: pos.ticker.clone(),
            trend: None,
            call: pos.side.into(),
            price: Some(price),
            take_profit: Some(pos.take_profit),
            stop_loss: Some(pos.stop_loss),
            note: Some("STILL OPEN".to_string()),
        }
    }

    /// Telegram HTML body.
    pub fn to_html(&self) -> String {
        let opt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |p| format!("{:.2}", p));
        let mut text = format!("<b>{}</b>\n", html_escape(&self.ticker));
        if let Some(trend) = self.trend {
            text.push_str(&format!("Trend: {}\n", trend));
        }
        text.push_str(&format!(
            "Signal: {}\nPrice: {}\n🎯 TP: {}\n🛑 SL: {}",
            self.call,
            opt(self.price),
            opt(self.take_profit),
            opt(self.stop_loss)
        ));
        if let Some(note) = &self.note {
            text.push_str(&format!("\n<i>{}</i>", html_escape(note)));
        }
        text
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one alert. Callers log failures and carry on.
    async fn send(&self, alert: &Alert) -> Result<()>;
}

pub struct TelegramNotifier {
    client: Client,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(cfg.http_timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            token: cfg.telegram_token.clone(),
            chat_id: cfg.telegram_chat_id.clone(),
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, alert: &Alert) -> Result<()> {
        if self.token.is_empty() || self.chat_id.is_empty() {
            warn!(
                "Skipping send: TELEGRAM_TOKEN/TELEGRAM_CHAT_ID not configured ({})",
                alert.ticker
            );
            return Ok(());
        }

        let payload = json!({
            "chat_id": self.chat_id,
            "text": alert.to_html(),
            "parse_mode": "HTML",
        });

        let resp = self
            .client
            .post(format!("{}/bot{}/sendMessage", TELEGRAM_API, self.token))
            .json(&payload)
            .send()
            .await
            .context("Failed to reach Telegram")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Telegram error {}: {}", status, body);
        }

        info!("Alert sent: {} {}", alert.ticker, alert.call);
        Ok(())
    }
}

/// Send and swallow the error into a warning.
pub async fn deliver(notifier: &dyn Notifier, alert: &Alert) -> bool {
    match notifier.send(alert).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to deliver alert for {}: {:#}", alert.ticker, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PositionStatus;
    use crate::test_helpers::confirmed_verdict;
    use chrono::Utc;

    #[test]
    fn signal_message_layout() {
        let v = confirmed_verdict("BBRI.JK", Call::Buy, 100.0);
        let html = Alert::signal(&v).to_html();
        assert_eq!(
            html,
            "<b>BBRI.JK</b>\nTrend: BULLISH\nSignal: BUY\nPrice: 100.00\n🎯 TP: 105.00\n🛑 SL: 95.00"
        );
    }

    #[test]
    fn resolution_message_carries_note() {
        let now = Utc::now();
        let pos = Position {
            id: Position::make_id("TLKM.JK", now),
            created_at: now,
            ticker: "TLKM.JK".to_string(),
            entry_price: 100.0,
            take_profit: 95.0,
            stop_loss: 105.0,
            side: Side::Sell,
            status: PositionStatus::SlHit,
            last_price: Some(106.0),
            updated_at: Some(now),
        };
        let event = ResolutionEvent::from_position(&pos).unwrap();
        assert_eq!(event.kind, ResolutionKind::StopLoss);
        assert_eq!(event.price, 106.0);

        let alert = Alert::resolution(&event);
        assert_eq!(alert.call, Call::Sell);
        assert!(alert.to_html().ends_with("<i>STOP LOSS HIT</i>"));
        assert!(!alert.to_html().contains("Trend:"));
    }

    #[test]
    fn open_position_has_no_resolution_event() {
        let now = Utc::now();
        let pos = Position {
            id: Position::make_id("TLKM.JK", now),
            created_at: now,
            ticker: "TLKM.JK".to_string(),
            entry_price: 100.0,
            take_profit: 105.0,
            stop_loss: 95.0,
            side: Side::Buy,
            status: PositionStatus::Open,
            last_price: None,
            updated_at: None,
        };
        assert!(ResolutionEvent::from_position(&pos).is_none());
        let alert = Alert::still_open(&pos, 101.0);
        assert_eq!(alert.note.as_deref(), Some("STILL OPEN"));
    }

    #[tokio::test]
    async fn unconfigured_telegram_skips_quietly() {
        let cfg = crate::test_helpers::default_test_config();
        let notifier = TelegramNotifier::new(&cfg).unwrap();
        let v = confirmed_verdict("BBRI.JK", Call::Buy, 100.0);
        assert!(deliver(&notifier, &Alert::signal(&v)).await);
    }

    #[test]
    fn escapes_markup_in_ticker() {
        let mut v = confirmed_verdict("A<B>&C", Call::Sell, 10.0);
        v.trend = None;
        let html = Alert::signal(&v).to_html();
        assert!(html.starts_with("<b>A&lt;B&gt;&amp;C</b>\nSignal: SELL"));
    }
}
