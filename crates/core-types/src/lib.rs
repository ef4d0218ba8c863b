pub mod error;
pub mod price;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use error::CoreError;
pub use price::{normalize, normalize_f64, percent_change, PRICE_SCALE};
pub use structs::{AlertRecord, PriceChangeEvent};
