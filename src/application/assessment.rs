//! Assessment service: Orchestrates scoring and persistence.
//!
//! This service coordinates:
//! - Boundary validation of the submitted metrics
//! - Scoring with the configured table
//! - Recommendation and weekly plan selection
//! - Exactly-once persistence of the resulting record

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    recommend, AssessmentRecord, HealthMetricsInput, Recommendation, RiskAssessment,
    ScoringEngine, WeeklyPlan,
};
use crate::ports::{AssessmentPage, AssessmentStore};
use crate::HeartwiseError;

/// Everything the presentation layer renders for one assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentReport {
    /// Stored record id, when the assessment was persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    pub assessment: RiskAssessment,

    /// Critical overrides first, then the general bundle
    pub recommendations: Vec<Recommendation>,

    pub weekly_plan: WeeklyPlan,
}

impl AssessmentReport {
    /// Build the report for an assessment that was not stored.
    #[must_use]
    pub fn new(assessment: RiskAssessment) -> Self {
        let recommendations = recommend(&assessment);
        let weekly_plan = WeeklyPlan::for_level(assessment.risk_level);
        Self {
            record_id: None,
            created_at: None,
            assessment,
            recommendations,
            weekly_plan,
        }
    }

    /// Build the report for a stored record.
    #[must_use]
    pub fn from_record(record: &AssessmentRecord) -> Self {
        Self {
            record_id: Some(record.id.clone()),
            created_at: Some(record.created_at),
            ..Self::new(record.assessment.clone())
        }
    }
}

/// Service for scoring and storing assessments.
pub struct AssessmentService<S>
where
    S: AssessmentStore,
{
    engine: ScoringEngine,
    storage: Arc<S>,
}

impl<S> AssessmentService<S>
where
    S: AssessmentStore,
    S::Error: Into<crate::adapters::StorageError>,
{
    /// Create a new assessment service.
    pub fn new(engine: ScoringEngine, storage: Arc<S>) -> Self {
        Self { engine, storage }
    }

    #[must_use]
    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    fn parse(&self, raw: &serde_json::Value) -> Result<HealthMetricsInput, HeartwiseError> {
        let input = HealthMetricsInput::from_json_value(raw).map_err(|e| {
            tracing::warn!("Rejected assessment input: {}", e);
            e
        })?;

        let warnings = input.range_warnings();
        if !warnings.is_empty() {
            // Accepted on purpose: implausible readings still score.
            tracing::warn!(
                "Scoring input with {} reading(s) outside typical ranges",
                warnings.len()
            );
        }
        Ok(input)
    }

    /// Score a record without storing it.
    ///
    /// # Errors
    /// Returns `HeartwiseError::Validation` if the input is malformed.
    pub fn assess(&self, raw: &serde_json::Value) -> Result<AssessmentReport, HeartwiseError> {
        let input = self.parse(raw)?;
        let assessment = self.engine.score(&input);
        Ok(AssessmentReport::new(assessment))
    }

    /// Score a record and append it to the user's history.
    ///
    /// The record is written exactly once. A storage failure is returned to
    /// the caller; the assessment is not reported as saved.
    ///
    /// # Errors
    /// Returns error if the user id is blank, the input is malformed, or the
    /// write fails.
    pub fn submit(
        &self,
        user_id: &str,
        raw: &serde_json::Value,
    ) -> Result<AssessmentReport, HeartwiseError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(HeartwiseError::InvalidUser(
                "user id must not be empty".to_string(),
            ));
        }

        let input = self.parse(raw)?;
        let assessment = self.engine.score(&input);
        let record = AssessmentRecord::new(user_id, assessment);

        self.storage
            .save_assessment(&record)
            .map_err(|e| HeartwiseError::Storage(e.into()))?;

        tracing::info!(
            "Assessment {} stored: score={}, percentage={}%, level={}",
            record.id,
            record.assessment.risk_score,
            record.assessment.risk_percentage,
            record.assessment.risk_level
        );

        Ok(AssessmentReport::from_record(&record))
    }

    /// A user's most recent assessments, newest first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn history(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<AssessmentRecord>, HeartwiseError> {
        self.storage
            .load_recent_assessments(user_id, limit)
            .map_err(|e| HeartwiseError::Storage(e.into()))
    }

    /// One page of a user's history, newest first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn history_page(
        &self,
        user_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<AssessmentPage, HeartwiseError> {
        self.storage
            .load_assessments_paginated(user_id, offset, limit)
            .map_err(|e| HeartwiseError::Storage(e.into()))
    }

    /// Rebuild the full report of a stored assessment.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn report(&self, record_id: &str) -> Result<Option<AssessmentReport>, HeartwiseError> {
        let record = self
            .storage
            .load_assessment(record_id)
            .map_err(|e| HeartwiseError::Storage(e.into()))?;
        Ok(record.as_ref().map(AssessmentReport::from_record))
    }
}
