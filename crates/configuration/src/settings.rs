use crate::error::ConfigError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// The root configuration structure for the entire application.
///
/// Every section falls back to its `Default`, so an empty `config.toml`
/// (or none at all) yields a runnable single-pair monitor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bot: BotConfig,
    pub api: ApiConfig,
    pub telegram: TelegramConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Checks every section for values the monitor cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bot.validate()?;
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError("api.base_url must not be empty".to_string()));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::ValidationError("api.timeout_secs must be greater than 0".to_string()));
        }
        Ok(())
    }
}

/// What to watch and how sensitive to be. Immutable once the monitor starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Trading pairs to poll (e.g., "BTC-USD"). Order is kept; duplicates are harmless.
    pub pairs: Vec<String>,
    /// Milliseconds between two polling ticks.
    pub interval_ms: u64,
    /// Minimum absolute move, in percent, that raises an alert. 0.01 means 0.01%.
    pub threshold_pct: Decimal,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            pairs: vec!["BTC-USD".to_string()],
            interval_ms: 5_000,
            threshold_pct: dec!(0.01),
        }
    }
}

impl BotConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// The configured pairs with duplicates removed, first occurrence wins.
    pub fn unique_pairs(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.pairs
            .iter()
            .filter(|pair| seen.insert(pair.as_str()))
            .cloned()
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pairs.is_empty() {
            return Err(ConfigError::ValidationError("bot.pairs must name at least one pair".to_string()));
        }
        if self.pairs.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::ValidationError("bot.pairs must not contain blank entries".to_string()));
        }
        if self.interval_ms == 0 {
            return Err(ConfigError::ValidationError("bot.interval_ms must be greater than 0".to_string()));
        }
        if self.threshold_pct.is_sign_negative() && !self.threshold_pct.is_zero() {
            return Err(ConfigError::ValidationError(format!(
                "bot.threshold_pct must not be negative, got {}",
                self.threshold_pct
            )));
        }
        Ok(())
    }
}

/// Settings for the public ticker endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Ticker endpoint; the pair is appended verbatim.
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.uphold.com/v0/ticker/".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Optional Telegram forwarding. Left empty, alerts are only logged and stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive such as "info" or "engine=debug". `RUST_LOG` wins when set.
    pub level: String,
    /// Emit JSON lines on the console instead of human-readable text.
    pub json: bool,
    /// When set, a daily rolling log file is also written into this directory.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            directory: None,
        }
    }
}
