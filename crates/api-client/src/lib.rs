use crate::error::ApiError;
use async_trait::async_trait;
use configuration::ApiConfig;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Duration;

pub mod error;
pub mod responses;

// --- Public API ---
pub use responses::{ApiErrorResponse, TickerResponse};

/// The abstract interface for anything that can quote a pair's current price.
/// The polling engine only sees this trait, so the HTTP client can be
/// swapped for a scripted source in tests.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Fetches the current ask price for `pair`. Any failure means "no price this tick".
    async fn fetch_price(&self, pair: &str) -> Result<Decimal, ApiError>;
}

/// A `QuoteSource` backed by the Uphold public ticker API.
#[derive(Clone)]
pub struct UpholdClient {
    client: reqwest::Client,
    base_url: String,
}

impl UpholdClient {
    pub fn new(api_config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(api_config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: api_config.base_url.clone(),
        })
    }

    /// Fetches the raw ticker for a pair.
    pub async fn get_ticker(&self, pair: &str) -> Result<TickerResponse, ApiError> {
        let url = format!("{}{}", self.base_url, pair);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let text = response.text().await?;

        parse_ticker(pair, status, &text)
    }
}

#[async_trait]
impl QuoteSource for UpholdClient {
    async fn fetch_price(&self, pair: &str) -> Result<Decimal, ApiError> {
        let ticker = self.get_ticker(pair).await?;
        parse_price(&ticker.ask)
    }
}

/// Interprets a ticker response body.
///
/// The API can answer with an error object (it carries a `code` field) on
/// either a success or a failure status, so the body is checked first.
fn parse_ticker(pair: &str, status: StatusCode, body: &str) -> Result<TickerResponse, ApiError> {
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) if !status.is_success() => {
            return Err(ApiError::Status { status: status.as_u16(), body: body.to_string() });
        }
        Err(e) => return Err(ApiError::Deserialization(e.to_string())),
    };

    if value.get("code").is_some() {
        let api_error: ApiErrorResponse =
            serde_json::from_value(value).map_err(|e| ApiError::Deserialization(e.to_string()))?;
        let detail = match api_error.message {
            Some(message) => format!("{} ({})", api_error.code, message),
            None => api_error.code.to_string(),
        };
        tracing::error!(pair, %detail, "Ticker API returned an error body.");
        return Err(ApiError::Provider { pair: pair.to_string(), detail });
    }

    if !status.is_success() {
        return Err(ApiError::Status { status: status.as_u16(), body: body.to_string() });
    }

    serde_json::from_value(value).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Parses a quoted price, accepting plain and scientific notation.
fn parse_price(raw: &str) -> Result<Decimal, ApiError> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| ApiError::InvalidData(format!("Unparseable price: '{}'", raw)))
}
