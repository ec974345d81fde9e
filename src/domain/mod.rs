//! Domain layer: Core business types and logic.
//!
//! This module contains the scoring engine and its types. Nothing here
//! performs I/O except loading a scoring table from disk on request.

mod assessment;
mod metrics;
mod plan;
pub mod recommendation;
pub mod scoring;
pub mod table;

pub use assessment::{AssessmentRecord, ComponentStatus, RiskAssessment, RiskLevel};
pub use metrics::{ExerciseLevel, Gender, HealthMetricsInput, ValidationError};
pub use plan::WeeklyPlan;
pub use recommendation::{recommend, Priority, Recommendation};
pub use scoring::{compute_assessment, ScoringEngine};
pub use table::{ScoringTable, TableError};
