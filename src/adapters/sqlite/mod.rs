//! SQLite adapter: Implementation of AssessmentStore.
//!
//! Provides local persistence for assessment history.
//!
//! # Ordering
//!
//! `created_at` is stored as RFC 3339 with fixed microsecond precision and a
//! `Z` suffix, so lexical order equals chronological order. Records created
//! in the same microsecond fall back to insertion order.
//!
//! # Mutex Behavior
//!
//! The connection is protected by a `Mutex`. A poisoned mutex is reported as
//! `StorageError::LockPoisoned` instead of panicking.
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::SecondsFormat;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

use crate::domain::{AssessmentRecord, HealthMetricsInput, RiskAssessment};
use crate::ports::{AssessmentPage, AssessmentStore};

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Assessment {0} already stored")]
    Duplicate(String),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

const SELECT_COLUMNS: &str = r"
    SELECT id, user_id, risk_score, risk_percentage, risk_level,
           bp_status, cholesterol_status, glucose_status,
           risk_factors, input, bmi, table_version, created_at
    FROM assessments
";

/// SQLite storage adapter.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

/// Raw column values of one `assessments` row.
struct AssessmentRow {
    id: String,
    user_id: String,
    risk_score: i64,
    risk_percentage: i64,
    risk_level: String,
    bp_status: String,
    cholesterol_status: String,
    glucose_status: String,
    risk_factors: String,
    input: String,
    bmi: Option<f64>,
    table_version: String,
    created_at: String,
}

impl AssessmentRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            risk_score: row.get(2)?,
            risk_percentage: row.get(3)?,
            risk_level: row.get(4)?,
            bp_status: row.get(5)?,
            cholesterol_status: row.get(6)?,
            glucose_status: row.get(7)?,
            risk_factors: row.get(8)?,
            input: row.get(9)?,
            bmi: row.get(10)?,
            table_version: row.get(11)?,
            created_at: row.get(12)?,
        })
    }

    fn into_record(self) -> Result<AssessmentRecord, StorageError> {
        let corrupt = |what: &str, e: String| {
            StorageError::Serialization(format!("assessment {}: {what}: {e}", self.id))
        };

        let risk_factors: Vec<String> = serde_json::from_str(&self.risk_factors)
            .map_err(|e| corrupt("risk_factors", e.to_string()))?;
        let input: HealthMetricsInput =
            serde_json::from_str(&self.input).map_err(|e| corrupt("input", e.to_string()))?;
        let created_at = chrono::DateTime::parse_from_rfc3339(&self.created_at)
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .map_err(|e| corrupt("created_at", e.to_string()))?;

        let assessment = RiskAssessment {
            risk_score: u32::try_from(self.risk_score)
                .map_err(|e| corrupt("risk_score", e.to_string()))?,
            risk_percentage: u8::try_from(self.risk_percentage)
                .map_err(|e| corrupt("risk_percentage", e.to_string()))?,
            risk_level: self.risk_level.parse().map_err(|e| corrupt("risk_level", e))?,
            bp_status: self.bp_status.parse().map_err(|e| corrupt("bp_status", e))?,
            cholesterol_status: self
                .cholesterol_status
                .parse()
                .map_err(|e| corrupt("cholesterol_status", e))?,
            glucose_status: self
                .glucose_status
                .parse()
                .map_err(|e| corrupt("glucose_status", e))?,
            risk_factors,
            bmi: self.bmi,
            table_version: self.table_version.clone(),
            input,
        };

        Ok(AssessmentRecord {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            created_at,
            assessment,
        })
    }
}

impl SqliteStorage {
    /// Create a new SQLite storage with the given database path.
    ///
    /// # Errors
    /// Returns error if database cannot be opened or initialized.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Create an in-memory SQLite database (for testing).
    ///
    /// # Errors
    /// Returns error if database cannot be created.
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> Result<(), StorageError> {
        let conn = self.lock()?;

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS assessments (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                risk_score INTEGER NOT NULL,
                risk_percentage INTEGER NOT NULL,
                risk_level TEXT NOT NULL,
                bp_status TEXT NOT NULL,
                cholesterol_status TEXT NOT NULL,
                glucose_status TEXT NOT NULL,
                risk_factors TEXT NOT NULL,
                input TEXT NOT NULL,
                bmi REAL,
                table_version TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_assessments_user_created
                ON assessments(user_id, created_at DESC);
            ",
        )?;

        Ok(())
    }

    fn collect_records(
        stmt: &mut rusqlite::Statement<'_>,
        params: impl rusqlite::Params,
    ) -> Result<Vec<AssessmentRecord>, StorageError> {
        let rows = stmt
            .query_map(params, AssessmentRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(AssessmentRow::into_record).collect()
    }
}

fn to_sql_int(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl AssessmentStore for SqliteStorage {
    type Error = StorageError;

    fn save_assessment(&self, record: &AssessmentRecord) -> Result<(), Self::Error> {
        let a = &record.assessment;
        let risk_factors = serde_json::to_string(&a.risk_factors)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let input = serde_json::to_string(&a.input)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let conn = self.lock()?;
        let result = conn.execute(
            r"
            INSERT INTO assessments (
                id, user_id, risk_score, risk_percentage, risk_level,
                bp_status, cholesterol_status, glucose_status,
                risk_factors, input, bmi, table_version, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ",
            params![
                record.id,
                record.user_id,
                i64::from(a.risk_score),
                i64::from(a.risk_percentage),
                a.risk_level.as_str(),
                a.bp_status.as_str(),
                a.cholesterol_status.as_str(),
                a.glucose_status.as_str(),
                risk_factors,
                input,
                a.bmi,
                a.table_version,
                record
                    .created_at
                    .to_rfc3339_opts(SecondsFormat::Micros, true),
            ],
        );

        match result {
            Ok(_) => {
                tracing::debug!("Saved assessment {} to storage", record.id);
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(StorageError::Duplicate(record.id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn load_assessment(&self, id: &str) -> Result<Option<AssessmentRecord>, Self::Error> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id],
                AssessmentRow::from_row,
            )
            .optional()?;

        row.map(AssessmentRow::into_record).transpose()
    }

    fn load_recent_assessments(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<AssessmentRecord>, Self::Error> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC LIMIT ?2"
        ))?;

        Self::collect_records(&mut stmt, params![user_id, to_sql_int(limit)])
    }

    fn load_assessments_paginated(
        &self,
        user_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<AssessmentPage, Self::Error> {
        let conn = self.lock()?;

        let total_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM assessments WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC LIMIT ?2 OFFSET ?3"
        ))?;
        let items = Self::collect_records(
            &mut stmt,
            params![user_id, to_sql_int(limit), to_sql_int(offset)],
        )?;

        Ok(AssessmentPage::new(
            items,
            usize::try_from(total_count).unwrap_or(0),
            offset,
            limit,
        ))
    }

    fn count_assessments(&self, user_id: &str) -> Result<usize, Self::Error> {
        let conn = self.lock()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM assessments WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;

        Ok(usize::try_from(count).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExerciseLevel, Gender, ScoringEngine};
    use chrono::Duration;

    fn sample_assessment(systolic: i64) -> RiskAssessment {
        ScoringEngine::default().score(&HealthMetricsInput {
            age: 58,
            gender: Gender::Female,
            systolic,
            diastolic: 82,
            cholesterol: 225,
            glucose: 101,
            smoking: false,
            diabetes: false,
            exercise: ExerciseLevel::Light,
            family_history: true,
            height_ft: Some(5.4),
            weight_kg: Some(70.0),
        })
    }

    fn record_at(user: &str, systolic: i64, minutes_ago: i64) -> AssessmentRecord {
        let mut record = AssessmentRecord::new(user, sample_assessment(systolic));
        record.created_at -= Duration::minutes(minutes_ago);
        record
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        let record = AssessmentRecord::new("user-a", sample_assessment(128));

        storage.save_assessment(&record).expect("Should save");
        let loaded = storage
            .load_assessment(&record.id)
            .expect("Should load")
            .expect("Should exist");

        assert_eq!(loaded.assessment, record.assessment);
        assert_eq!(loaded.user_id, "user-a");
        // Stored with microsecond precision
        assert_eq!(
            loaded.created_at.timestamp_micros(),
            record.created_at.timestamp_micros()
        );

        assert!(storage.load_assessment("missing").expect("Should load").is_none());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        let record = AssessmentRecord::new("user-a", sample_assessment(128));

        storage.save_assessment(&record).expect("Should save");
        let err = storage.save_assessment(&record).expect_err("Should reject");
        assert!(matches!(err, StorageError::Duplicate(_)));
        assert_eq!(storage.count_assessments("user-a").expect("Should count"), 1);
    }

    #[test]
    fn test_history_newest_first_per_user() {
        let storage = SqliteStorage::in_memory().expect("Should create db");

        let oldest = record_at("user-a", 118, 30);
        let middle = record_at("user-a", 135, 20);
        let newest = record_at("user-a", 150, 10);
        let other = record_at("user-b", 120, 5);

        for r in [&middle, &oldest, &other, &newest] {
            storage.save_assessment(r).expect("Should save");
        }

        let history = storage
            .load_recent_assessments("user-a", 10)
            .expect("Should load");
        let ids: Vec<&str> = history.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec![newest.id.as_str(), middle.id.as_str(), oldest.id.as_str()]);

        let limited = storage
            .load_recent_assessments("user-a", 2)
            .expect("Should load");
        assert_eq!(limited.len(), 2);
        assert_eq!(storage.count_assessments("user-b").expect("Should count"), 1);
        assert_eq!(storage.count_assessments("nobody").expect("Should count"), 0);
    }

    #[test]
    fn test_pagination() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        for i in 0..5 {
            storage
                .save_assessment(&record_at("user-a", 120 + i, 50 - i))
                .expect("Should save");
        }

        let first = storage
            .load_assessments_paginated("user-a", 0, 2)
            .expect("Should page");
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.total_count, 5);
        assert!(first.has_more);
        assert_eq!(first.next_offset(), Some(2));
        assert_eq!(first.prev_offset(), None);
        // Newest is the last one saved (systolic 124)
        assert_eq!(first.items[0].assessment.input.systolic, 124);

        let last = storage
            .load_assessments_paginated("user-a", 4, 2)
            .expect("Should page");
        assert_eq!(last.items.len(), 1);
        assert!(!last.has_more);
        assert_eq!(last.next_offset(), None);
        assert_eq!(last.prev_offset(), Some(2));
    }
}
