use core_types::{AlertRecord, PriceChangeEvent};
use database::AlertStore;
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::Arc;
use tokio::sync::broadcast;

pub mod error;
pub mod telegram;

pub use error::AlerterError;
pub use telegram::{run_alerter_service, TelegramAlerter};

/// How many alerts a slow subscriber may fall behind before it starts skipping.
const ALERT_CHANNEL_CAPACITY: usize = 256;

/// Turns price change events into alert records and fans them out.
///
/// Each record is logged, written to the `AlertStore` and published to any
/// subscribers. Delivery is best-effort: a failing store is logged and the
/// record is still returned and broadcast.
pub struct AlertService {
    store: Arc<dyn AlertStore>,
    alert_tx: broadcast::Sender<AlertRecord>,
}

impl AlertService {
    pub fn new(store: Arc<dyn AlertStore>) -> Self {
        let (alert_tx, _) = broadcast::channel(ALERT_CHANNEL_CAPACITY);
        Self { store, alert_tx }
    }

    /// A new receiver for every alert emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<AlertRecord> {
        self.alert_tx.subscribe()
    }

    /// Stamps the event, logs it, persists it and publishes it.
    pub async fn emit(&self, event: PriceChangeEvent, bot_config_id: i32) -> AlertRecord {
        let record = AlertRecord::from_event(event, bot_config_id);

        tracing::info!(
            pair = %record.pair,
            change_pct = %record.change_pct,
            previous = %record.previous_price,
            current = %record.current_price,
            bot_config_id,
            "[ALERT] {}",
            format_alert(&record)
        );

        if let Err(e) = self.store.save_alert(&record).await {
            tracing::error!(error = %e, pair = %record.pair, "Failed to save alert.");
        }

        // No subscribers is not an error; the alert is already logged and stored.
        let _ = self.alert_tx.send(record.clone());

        record
    }
}

/// The one-line, human-readable description of an alert.
pub fn format_alert(record: &AlertRecord) -> String {
    format!(
        "{} price changed by {:.4}%. Previous: ${:.3} | Current: ${:.3} | Time: {}",
        record.pair,
        rounded(record.change_pct, 4),
        rounded(record.previous_price, 3),
        rounded(record.current_price, 3),
        record.alert_time.format("%H:%M:%S")
    )
}

fn rounded(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}
