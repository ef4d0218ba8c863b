//! # Pricewatch Database Crate
//!
//! This crate is the monitor's permanent record: the configuration each
//! session ran under and every alert it raised, stored in PostgreSQL.
//!
//! ## Public API
//!
//! - `connect`: The async function to establish the database connection pool.
//! - `run_migrations`: Applies the embedded schema migrations.
//! - `close`: Shuts the pool down on exit.
//! - `AlertStore`: The persistence interface the rest of the application depends on.
//! - `DbRepository`: The PostgreSQL implementation of `AlertStore`.
//! - `DbError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{close, connect, connection_string, run_migrations};
pub use error::DbError;
pub use repository::{AlertStore, DbRepository};
