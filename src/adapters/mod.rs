//! Adapters layer: Concrete implementations of ports.
//!
//! - `sqlite`: SQLite for assessment history
//! - `sanitize`: redaction of readings and identifiers in logs

pub mod sanitize;
pub mod sqlite;

// Re-export storage error for lib.rs
pub use sqlite::StorageError;
