//! The price monitor core: per-pair price tracking and the polling loop that feeds it.

pub mod error;
pub mod scheduler;
pub mod tracker;

pub use error::{EngineError, TrackerError};
pub use scheduler::{MonitorHandle, PriceMonitor, StopSignal, TickSummary};
pub use tracker::PriceTracker;
