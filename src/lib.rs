//! # heartwise
//!
//! Deterministic cardiovascular risk scoring from self-reported health metrics.
//!
//! This crate provides:
//! - A pure scoring engine: metrics in, risk score, percentage, level,
//!   component statuses and risk factors out
//! - Prioritized recommendations and a weekly activity plan
//! - Append-only assessment history on SQLite
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Scoring engine, scoring tables and assessment types
//! - `ports`: Trait definitions for persistence
//! - `adapters`: Concrete implementations (SQLite, log sanitization)
//! - `application`: Use cases orchestrating domain and ports
//! - `config`: Environment-driven runtime settings
//!
//! ```
//! use serde_json::json;
//!
//! let assessment = heartwise::compute_assessment(&json!({
//!     "age": 25, "gender": "female",
//!     "systolic": 110, "diastolic": 70,
//!     "cholesterol": 150, "glucose": 85,
//!     "smoking": false, "diabetes": false,
//!     "exercise": "active", "familyHistory": false
//! }))
//! .expect("well-formed input");
//!
//! assert_eq!(assessment.risk_level, heartwise::RiskLevel::Excellent);
//! ```

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use domain::{
    compute_assessment, recommend, HealthMetricsInput, Recommendation, RiskAssessment, RiskLevel,
    ScoringEngine, ScoringTable, ValidationError,
};

/// Result type for heartwise operations
pub type Result<T> = std::result::Result<T, HeartwiseError>;

/// Main error type for heartwise
#[derive(Debug, thiserror::Error)]
pub enum HeartwiseError {
    #[error("Invalid health metrics: {0}")]
    Validation(#[from] domain::ValidationError),

    #[error("Invalid user identity: {0}")]
    InvalidUser(String),

    #[error("Storage operation failed: {0}")]
    Storage(#[from] adapters::StorageError),

    #[error("Scoring table error: {0}")]
    Table(#[from] domain::TableError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
