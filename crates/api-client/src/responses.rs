use serde::Deserialize;

/// The body of a successful `GET /v0/ticker/{pair}` request.
///
/// Prices come back as strings (e.g. `"50000.12"`) to avoid float rounding in transit.
#[derive(Debug, Clone, Deserialize)]
pub struct TickerResponse {
    pub ask: String,
    pub bid: String,
    pub currency: String,
}

/// An error body from the ticker API. `code` is usually a string like `"not_found"`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub code: serde_json::Value,
    #[serde(default)]
    pub message: Option<String>,
}
