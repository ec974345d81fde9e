//! History service: Summaries over a user's stored assessments.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::RiskLevel;
use crate::ports::AssessmentStore;
use crate::HeartwiseError;

/// Percentage-point change treated as noise when comparing two assessments.
const TREND_TOLERANCE_POINTS: i16 = 5;

/// Direction of the latest change in risk percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Stable,
    Worsening,
    /// Fewer than two assessments
    InsufficientData,
}

/// Aggregate view of the newest `window` assessments of one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    /// Total stored assessments for the user
    pub total_count: usize,
    /// Assessments the averages are computed over
    pub window: usize,
    pub latest_percentage: Option<u8>,
    pub latest_level: Option<RiskLevel>,
    pub average_percentage: Option<f64>,
    /// Latest minus previous percentage
    pub change_since_previous: Option<i16>,
    pub trend: Trend,
}

/// Service for reading back assessment history.
pub struct HistoryService<S>
where
    S: AssessmentStore,
{
    storage: Arc<S>,
}

impl<S> HistoryService<S>
where
    S: AssessmentStore,
    S::Error: Into<crate::adapters::StorageError>,
{
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Summarize the newest `window` assessments of a user.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn summarize(&self, user_id: &str, window: usize) -> Result<HistorySummary, HeartwiseError> {
        let total_count = self
            .storage
            .count_assessments(user_id)
            .map_err(|e| HeartwiseError::Storage(e.into()))?;
        let records = self
            .storage
            .load_recent_assessments(user_id, window.max(2))
            .map_err(|e| HeartwiseError::Storage(e.into()))?;

        let percentages: Vec<u8> = records
            .iter()
            .map(|r| r.assessment.risk_percentage)
            .collect();
        let windowed = &percentages[..percentages.len().min(window)];

        let average_percentage = (!windowed.is_empty()).then(|| {
            windowed.iter().map(|&p| f64::from(p)).sum::<f64>() / windowed.len() as f64
        });

        let change_since_previous = match percentages.as_slice() {
            [latest, previous, ..] => Some(i16::from(*latest) - i16::from(*previous)),
            _ => None,
        };

        let trend = match change_since_previous {
            None => Trend::InsufficientData,
            Some(delta) if delta <= -TREND_TOLERANCE_POINTS => Trend::Improving,
            Some(delta) if delta >= TREND_TOLERANCE_POINTS => Trend::Worsening,
            Some(_) => Trend::Stable,
        };

        tracing::debug!(
            "Summarized {} of {} assessments, trend {:?}",
            windowed.len(),
            total_count,
            trend
        );

        Ok(HistorySummary {
            total_count,
            window: windowed.len(),
            latest_percentage: percentages.first().copied(),
            latest_level: records.first().map(|r| r.assessment.risk_level),
            average_percentage,
            change_since_previous,
            trend,
        })
    }
}
