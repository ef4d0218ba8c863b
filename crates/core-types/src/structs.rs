use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price move large enough to cross the configured threshold.
///
/// Short-lived: produced by the tracker and consumed straight away by the alert path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceChangeEvent {
    pub pair: String,
    pub previous: Decimal,
    pub current: Decimal,
    /// Absolute percentage move, rounded to four places.
    pub change_pct: Decimal,
}

/// A persisted record of one alert, tied to the bot configuration that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub pair: String,
    pub previous_price: Decimal,
    pub current_price: Decimal,
    pub change_pct: Decimal,
    pub alert_time: DateTime<Utc>,
    pub bot_config_id: i32,
}

impl AlertRecord {
    /// Stamps an event with the current wall-clock time.
    pub fn from_event(event: PriceChangeEvent, bot_config_id: i32) -> Self {
        Self {
            pair: event.pair,
            previous_price: event.previous,
            current_price: event.current,
            change_pct: event.change_pct,
            alert_time: Utc::now(),
            bot_config_id,
        }
    }
}
