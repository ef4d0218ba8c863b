use crate::error::ConfigError;
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use std::path::Path;

// Declare the modules that make up this crate.
#[cfg(feature = "clap")]
pub mod cli;
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
#[cfg(feature = "clap")]
pub use cli::BotArgs;
pub use logging::init_tracing;
pub use settings::{ApiConfig, BotConfig, Config, LoggingConfig, TelegramConfig};

/// The file looked up in the working directory when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Prefix for environment overrides, e.g. `PRICEWATCH_BOT__THRESHOLD_PCT=0.5`.
pub const ENV_PREFIX: &str = "PRICEWATCH";

/// Loads and validates the application configuration.
///
/// Sources are layered: built-in defaults, then the TOML file, then
/// `PRICEWATCH_*` environment variables. An explicit `path` must exist; the
/// default `config.toml` is optional.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = match path {
        Some(path) => File::from(path).required(true),
        None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };
    build(config::Config::builder().add_source(file))
}

fn build(builder: ConfigBuilder<DefaultState>) -> Result<Config, ConfigError> {
    let settings = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("bot.pairs")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = settings.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}
