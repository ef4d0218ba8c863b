use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Rejected price: {0}")]
    InvalidPrice(#[from] core_types::CoreError),

    #[error("Previous price for '{pair}' is zero; percentage change is undefined.")]
    ZeroPreviousPrice { pair: String },

    #[error("Price move for '{pair}' from {previous} to {current} is too large to express as a percentage.")]
    ChangeOutOfRange {
        pair: String,
        previous: rust_decimal::Decimal,
        current: rust_decimal::Decimal,
    },
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("The price monitor is already running.")]
    AlreadyRunning,

    #[error("Failed to fetch a price for '{pair}': {source}")]
    Fetch {
        pair: String,
        #[source]
        source: api_client::error::ApiError,
    },

    #[error("Price tracking error: {0}")]
    Tracker(#[from] TrackerError),

    #[error("The polling task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
