use crate::error::DbError;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::env;
use std::time::Duration;

const USER_DEFAULT: &str = "user";
const PASSWORD_DEFAULT: &str = "password";
const HOST_DEFAULT: &str = "db";
const PORT_DEFAULT: &str = "5432";
const DB_NAME_DEFAULT: &str = "upholddb";

/// Resolves the PostgreSQL connection string from the process environment.
///
/// `DATABASE_URL` wins, then `PG_URI`; otherwise the URL is assembled from
/// `DB_USER`, `DB_PASSWORD`, `DB_HOST`, `DB_PORT` and `DB_NAME`.
pub fn connection_string() -> String {
    connection_string_from(|key| env::var(key).ok())
}

fn connection_string_from(lookup: impl Fn(&str) -> Option<String>) -> String {
    if let Some(url) = lookup("DATABASE_URL").or_else(|| lookup("PG_URI")) {
        return url;
    }

    let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
    format!(
        "postgresql://{}:{}@{}:{}/{}",
        get("DB_USER", USER_DEFAULT),
        get("DB_PASSWORD", PASSWORD_DEFAULT),
        get("DB_HOST", HOST_DEFAULT),
        get("DB_PORT", PORT_DEFAULT),
        get("DB_NAME", DB_NAME_DEFAULT),
    )
}

/// Establishes a connection pool to the PostgreSQL database.
///
/// Loads `.env` if one exists, resolves the connection string and returns a
/// pool that can be shared across the application.
pub async fn connect() -> Result<PgPool, DbError> {
    // A missing .env is fine; the environment or the defaults still apply.
    let _ = dotenvy::dotenv();

    let database_url = connection_string();
    tracing::info!(host = %host_of(&database_url), "Connecting to PostgreSQL.");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&database_url)
        .await?;

    Ok(pool)
}

/// Applies the embedded migrations so the `bot_config` and `alerts` tables exist.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    // Use a relative path from the crate root
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Closes every pooled connection. Called once on shutdown.
pub async fn close(pool: &PgPool) {
    pool.close().await;
    tracing::info!("Database connections closed.");
}

/// The part of a connection URL after any credentials, for logging.
fn host_of(url: &str) -> &str {
    url.rsplit_once('@').map(|(_, host)| host).unwrap_or(url)
}
