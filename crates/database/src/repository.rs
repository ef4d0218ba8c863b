use crate::DbError;
use async_trait::async_trait;
use configuration::BotConfig;
use core_types::AlertRecord;
use rust_decimal::Decimal;
use sqlx::postgres::PgPool;

/// Persistence operations the monitor needs.
///
/// Implemented by `DbRepository` for PostgreSQL; the engine and alerter are
/// written against this trait so they can run with an in-memory store.
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Records the configuration a monitoring session runs under and returns its id.
    async fn save_bot_config(&self, config: &BotConfig) -> Result<i32, DbError>;

    /// Appends one alert to the history.
    async fn save_alert(&self, alert: &AlertRecord) -> Result<(), DbError>;
}

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn ensure_open(&self) -> Result<(), DbError> {
        if self.pool.is_closed() {
            return Err(DbError::Unavailable("connection pool is closed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AlertStore for DbRepository {
    async fn save_bot_config(&self, config: &BotConfig) -> Result<i32, DbError> {
        self.ensure_open()?;

        let id: i32 = sqlx::query_scalar(
            "INSERT INTO bot_config (pairs, interval, threshold) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&config.pairs)
        .bind(Decimal::from(config.interval_ms))
        .bind(config.threshold_pct)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(bot_config_id = id, "Bot configuration saved.");
        Ok(id)
    }

    async fn save_alert(&self, alert: &AlertRecord) -> Result<(), DbError> {
        self.ensure_open()?;

        sqlx::query(
            r#"
            INSERT INTO alerts (pair, previous_price, current_price, change_percentage, alert_time, bot_config_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&alert.pair)
        .bind(alert.previous_price)
        .bind(alert.current_price)
        .bind(alert.change_pct)
        .bind(alert.alert_time)
        .bind(alert.bot_config_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
