use crate::settings::Config;
use clap::Args;
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Command-line overrides for the bot section of the configuration.
#[derive(Debug, Clone, Default, Args)]
pub struct BotArgs {
    /// Path to a TOML configuration file. Defaults to `config.toml` if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// A pair to watch (e.g., "BTC-USD"). Repeat to watch several; replaces the configured list.
    #[arg(long = "pair")]
    pub pairs: Vec<String>,

    /// Milliseconds between polling ticks.
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Minimum percentage move that raises an alert.
    #[arg(long)]
    pub threshold_pct: Option<Decimal>,
}

impl BotArgs {
    /// Writes any flags that were given over the loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if !self.pairs.is_empty() {
            config.bot.pairs = self.pairs.clone();
        }
        if let Some(interval_ms) = self.interval_ms {
            config.bot.interval_ms = interval_ms;
        }
        if let Some(threshold_pct) = self.threshold_pct {
            config.bot.threshold_pct = threshold_pct;
        }
    }
}
