use alerter::{run_alerter_service, AlertService, TelegramAlerter};
use anyhow::Context;
use api_client::UpholdClient;
use clap::Parser;
use configuration::{init_tracing, load_config, BotArgs};
use database::{AlertStore, DbRepository};
use engine::PriceMonitor;
use std::sync::Arc;

mod console;

/// Watches trading pair prices and raises an alert when one moves past a threshold.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    bot: BotArgs,
}

/// The main entry point for the price monitor.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file, if there is one.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = load_config(cli.bot.config.as_deref()).context("Failed to load configuration")?;
    cli.bot.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    let _log_guard = init_tracing(&config.logging)?;
    tracing::info!(bot = ?config.bot, "Configuration loaded.");

    // Initialize the database connection and run migrations
    let db_pool = database::connect().await.context("Failed to connect to the database")?;
    database::run_migrations(&db_pool)
        .await
        .context("Failed to run database migrations")?;
    let db_repo = Arc::new(DbRepository::new(db_pool.clone()));

    // Alerts reference the configuration row, so it must be stored before polling starts.
    let bot_config_id = db_repo
        .save_bot_config(&config.bot)
        .await
        .context("Failed to persist bot configuration")?;

    let quote_source = Arc::new(UpholdClient::new(&config.api).context("Failed to build the quote client")?);
    let alerts = Arc::new(AlertService::new(db_repo.clone()));

    let telegram_task = TelegramAlerter::new(&config.telegram)
        .map(|alerter| tokio::spawn(run_alerter_service(alerter, alerts.subscribe())));

    let monitor = Arc::new(PriceMonitor::new(
        &config.bot,
        bot_config_id,
        quote_source,
        alerts.clone(),
    ));
    let handle = monitor.start()?;

    let console_stop = handle.stop_signal();
    std::thread::spawn(move || console::listen_for_commands(std::io::stdin().lock(), console_stop));

    let signal_stop = handle.stop_signal();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_stop.stop();
        }
    });

    handle.join().await?;

    // Dropping the last sender closes the alert channel and ends the Telegram task.
    drop(monitor);
    drop(alerts);
    if let Some(task) = telegram_task {
        if let Err(e) = task.await {
            tracing::error!(error = %e, "Telegram alerter task failed.");
        }
    }

    database::close(&db_pool).await;
    tracing::info!("Bye.");
    Ok(())
}
