use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestBuild(#[from] reqwest::Error),

    #[error("Ticker API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Ticker API reported an error for '{pair}': {detail}")]
    Provider { pair: String, detail: String },

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Invalid data format from API: {0}")]
    InvalidData(String),
}
