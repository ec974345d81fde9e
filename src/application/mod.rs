//! Application layer: Use cases and services.
//!
//! This module orchestrates the scoring engine with the storage port to
//! implement the submit/read-back use cases.

mod assessment;
mod history;

pub use assessment::{AssessmentReport, AssessmentService};
pub use history::{HistoryService, HistorySummary, Trend};
