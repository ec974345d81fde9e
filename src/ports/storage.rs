//! Storage port: Trait for persisting assessments.
//!
//! This trait abstracts the storage backend (SQLite) from the application logic.
//! Records are append-only: the port offers no update or delete.

use crate::domain::AssessmentRecord;

/// A page of one user's assessments, newest first.
#[derive(Debug, Clone)]
pub struct AssessmentPage {
    /// Assessments in this page
    pub items: Vec<AssessmentRecord>,
    /// Total count of the user's assessments
    pub total_count: usize,
    /// Current page offset
    pub offset: usize,
    /// Page size limit
    pub limit: usize,
    /// Whether there are more pages
    pub has_more: bool,
}

impl AssessmentPage {
    #[must_use]
    pub fn new(items: Vec<AssessmentRecord>, total_count: usize, offset: usize, limit: usize) -> Self {
        let has_more = offset + items.len() < total_count;
        Self {
            items,
            total_count,
            offset,
            limit,
            has_more,
        }
    }

    #[must_use]
    pub fn next_offset(&self) -> Option<usize> {
        self.has_more.then(|| self.offset + self.limit)
    }

    #[must_use]
    pub fn prev_offset(&self) -> Option<usize> {
        (self.offset > 0).then(|| self.offset.saturating_sub(self.limit))
    }
}

/// Trait for assessment persistence.
///
/// Implementations must store each record exactly once: saving a record whose
/// id already exists is an error, never an overwrite.
pub trait AssessmentStore: Send + Sync {
    /// Error type for storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Append an assessment record.
    ///
    /// # Errors
    /// Returns error if the id already exists or the write fails.
    fn save_assessment(&self, record: &AssessmentRecord) -> Result<(), Self::Error>;

    /// Load one record by id.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn load_assessment(&self, id: &str) -> Result<Option<AssessmentRecord>, Self::Error>;

    /// Load a user's most recent assessments (up to `limit`), newest first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn load_recent_assessments(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<AssessmentRecord>, Self::Error>;

    /// Load a user's assessments with offset pagination, newest first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn load_assessments_paginated(
        &self,
        user_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<AssessmentPage, Self::Error>;

    /// Count a user's assessments.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn count_assessments(&self, user_id: &str) -> Result<usize, Self::Error>;
}
