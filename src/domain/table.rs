//! Scoring table: every threshold and weight the engine uses.
//!
//! The engine's control flow never embeds a clinical constant. Tables are
//! versioned; each assessment records the version that produced it, and a
//! table loaded from disk must validate before it can score anything.
//!
//! # Table v1
//!
//! | rule                        | weight | label                      |
//! |-----------------------------|--------|----------------------------|
//! | male, age >= 40             | 1      | -                          |
//! | male, age >= 50             | 1      | Male over 50               |
//! | male, age >= 60             | 2      | -                          |
//! | female, age >= 50           | 1      | -                          |
//! | female, age >= 60           | 2      | Female over 60             |
//! | any, age > 70               | 1      | -                          |
//! | blood pressure High/Medium  | 4 / 2  | High/Elevated blood pressure |
//! | cholesterol High/Medium     | 3 / 2  | High/Borderline high cholesterol |
//! | glucose High/Medium         | 3 / 1  | High/Elevated blood glucose |
//! | smoking                     | 4      | Smoking                    |
//! | diabetes                    | 4      | Diabetes                   |
//! | sedentary or light exercise | 2      | Low physical activity      |
//! | family history              | 2      | Family history of heart disease |
//!
//! Maximum accumulable score: 5 (male age bands) + 4 + 3 + 3 + 4 + 4 + 2 + 2 = 27.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::metrics::Gender;

/// Theoretical maximum score of table v1.
pub const MAX_SCORE_V1: u32 = 27;

/// Largest `max_score` for which any positive score still rounds to a
/// positive percentage.
const MAX_SCORE_CEILING: u32 = 200;

/// Error type for scoring table loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("Scoring table has an empty version")]
    EmptyVersion,

    #[error("Thresholds for {metric} must ascend: medium {medium} < high {high}")]
    ThresholdOrder {
        metric: &'static str,
        medium: i64,
        high: i64,
    },

    #[error("Declared max_score {declared} does not match derived maximum {derived}")]
    MaxScoreMismatch { declared: u32, derived: u32 },

    #[error("Scoring table weights overflow the score range")]
    WeightOverflow,

    #[error("max_score {0} out of range [1, 200]")]
    MaxScoreOutOfRange(u32),

    #[error("Failed to read scoring table: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid scoring table format: {0}")]
    Format(#[from] serde_json::Error),
}

/// Medium/High cutoffs for a single-reading metric. A reading at or above a
/// cutoff reaches that tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub medium: i64,
    pub high: i64,
}

/// Systolic/diastolic pair; either reading at or above its cutoff is enough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloodPressureCutoff {
    pub systolic: i64,
    pub diastolic: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloodPressureThresholds {
    pub medium: BloodPressureCutoff,
    pub high: BloodPressureCutoff,
}

/// Score contribution of the Medium and High tier of a component status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierWeights {
    pub medium: u32,
    pub high: u32,
}

impl TierWeights {
    fn max(self) -> u32 {
        self.medium.max(self.high)
    }
}

/// Which genders an age band applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeCohort {
    /// Men, and anyone whose gender is unspecified
    Male,
    Female,
    Any,
}

impl AgeCohort {
    #[must_use]
    pub fn applies_to(self, gender: Gender) -> bool {
        match self {
            Self::Male => matches!(gender, Gender::Male | Gender::Unspecified),
            Self::Female => gender == Gender::Female,
            Self::Any => true,
        }
    }
}

/// One cumulative age threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeBand {
    pub cohort: AgeCohort,
    /// Band applies when `age >= min_age`
    pub min_age: i64,
    pub weight: u32,
    /// Factor label; `None` adds to the score silently
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weights {
    pub blood_pressure: TierWeights,
    pub cholesterol: TierWeights,
    pub glucose: TierWeights,
    pub smoking: u32,
    pub diabetes: u32,
    pub low_activity: u32,
    pub family_history: u32,
}

/// Complete, versioned scoring configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringTable {
    pub version: String,
    pub blood_pressure: BloodPressureThresholds,
    pub cholesterol: Thresholds,
    pub glucose: Thresholds,
    /// Evaluated in order
    pub age_bands: Vec<AgeBand>,
    pub weights: Weights,
    /// Denominator of the risk percentage
    pub max_score: u32,
}

impl ScoringTable {
    /// The built-in authoritative table.
    #[must_use]
    pub fn v1() -> Self {
        let band = |cohort, min_age, weight, label: Option<&str>| AgeBand {
            cohort,
            min_age,
            weight,
            label: label.map(str::to_string),
        };

        Self {
            version: "v1".to_string(),
            blood_pressure: BloodPressureThresholds {
                medium: BloodPressureCutoff {
                    systolic: 120,
                    diastolic: 80,
                },
                high: BloodPressureCutoff {
                    systolic: 140,
                    diastolic: 90,
                },
            },
            cholesterol: Thresholds {
                medium: 200,
                high: 240,
            },
            glucose: Thresholds {
                medium: 100,
                high: 126,
            },
            age_bands: vec![
                band(AgeCohort::Male, 40, 1, None),
                band(AgeCohort::Male, 50, 1, Some("Male over 50")),
                band(AgeCohort::Male, 60, 2, None),
                band(AgeCohort::Female, 50, 1, None),
                band(AgeCohort::Female, 60, 2, Some("Female over 60")),
                band(AgeCohort::Any, 71, 1, None),
            ],
            weights: Weights {
                blood_pressure: TierWeights { medium: 2, high: 4 },
                cholesterol: TierWeights { medium: 2, high: 3 },
                glucose: TierWeights { medium: 1, high: 3 },
                smoking: 4,
                diabetes: 4,
                low_activity: 2,
                family_history: 2,
            },
            max_score: MAX_SCORE_V1,
        }
    }

    /// Highest score any input can accumulate under this table, or `None`
    /// if the weights overflow `u32`.
    ///
    /// Every age band is a lower bound, so the oldest possible input crosses
    /// all of its cohort's bands; the age term is the best cohort's total.
    #[must_use]
    pub fn derived_max_score(&self) -> Option<u32> {
        let mut age_max = 0u32;
        for gender in [Gender::Male, Gender::Female, Gender::Unspecified] {
            let cohort_total = self
                .age_bands
                .iter()
                .filter(|b| b.cohort.applies_to(gender))
                .try_fold(0u32, |acc, b| acc.checked_add(b.weight))?;
            age_max = age_max.max(cohort_total);
        }

        let w = &self.weights;
        [
            w.blood_pressure.max(),
            w.cholesterol.max(),
            w.glucose.max(),
            w.smoking,
            w.diabetes,
            w.low_activity,
            w.family_history,
        ]
        .into_iter()
        .try_fold(age_max, u32::checked_add)
    }

    /// Check internal consistency.
    ///
    /// # Errors
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<(), TableError> {
        if self.version.trim().is_empty() {
            return Err(TableError::EmptyVersion);
        }

        let pairs = [
            (
                "systolic",
                self.blood_pressure.medium.systolic,
                self.blood_pressure.high.systolic,
            ),
            (
                "diastolic",
                self.blood_pressure.medium.diastolic,
                self.blood_pressure.high.diastolic,
            ),
            ("cholesterol", self.cholesterol.medium, self.cholesterol.high),
            ("glucose", self.glucose.medium, self.glucose.high),
        ];
        for (metric, medium, high) in pairs {
            if medium >= high {
                return Err(TableError::ThresholdOrder {
                    metric,
                    medium,
                    high,
                });
            }
        }

        if self.max_score == 0 || self.max_score > MAX_SCORE_CEILING {
            return Err(TableError::MaxScoreOutOfRange(self.max_score));
        }

        let derived = self.derived_max_score().ok_or(TableError::WeightOverflow)?;
        if derived != self.max_score {
            return Err(TableError::MaxScoreMismatch {
                declared: self.max_score,
                derived,
            });
        }

        Ok(())
    }

    /// SHA-256 of the canonical JSON encoding, hex encoded.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        // Struct fields serialize in declaration order, so the encoding is stable.
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        Sha256::digest(&bytes)
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }

    /// Load and validate a table from a JSON file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self, TableError> {
        let bytes = std::fs::read(path)?;
        let table: Self = serde_json::from_slice(&bytes)?;
        table.validate()?;

        tracing::info!(
            "Loaded scoring table {} (fingerprint {})",
            table.version,
            &table.fingerprint()[..16]
        );
        Ok(table)
    }

    /// Write the table as pretty JSON.
    ///
    /// # Errors
    /// Returns error if the file cannot be written.
    pub fn export(&self, path: &Path) -> Result<(), TableError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

impl Default for ScoringTable {
    fn default() -> Self {
        Self::v1()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v1_is_valid() {
        let table = ScoringTable::v1();
        table.validate().expect("v1 should validate");
        assert_eq!(table.derived_max_score(), Some(MAX_SCORE_V1));
    }

    #[test]
    fn test_shipped_table_matches_builtin() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("models/scoring_table_v1.json");
        let loaded = ScoringTable::load(&path).expect("Shipped table should load");
        assert_eq!(loaded, ScoringTable::v1());
        assert_eq!(loaded.fingerprint(), ScoringTable::v1().fingerprint());
    }

    #[test]
    fn test_max_score_mismatch_rejected() {
        let mut table = ScoringTable::v1();
        table.weights.smoking = 5;
        assert!(matches!(
            table.validate(),
            Err(TableError::MaxScoreMismatch {
                declared: 27,
                derived: 28
            })
        ));

        table.max_score = 28;
        table.validate().expect("Consistent table should validate");
    }

    #[test]
    fn test_overflowing_weights_rejected() {
        let mut table = ScoringTable::v1();
        table.weights.smoking = u32::MAX;
        table.weights.diabetes = 9;
        assert_eq!(table.derived_max_score(), None);
        assert!(matches!(table.validate(), Err(TableError::WeightOverflow)));

        let mut table = ScoringTable::v1();
        table.age_bands[0].weight = u32::MAX;
        assert!(matches!(table.validate(), Err(TableError::WeightOverflow)));
    }

    #[test]
    fn test_overflowing_table_file_rejected() {
        let dir = std::env::temp_dir().join(format!("heartwise-overflow-{}", std::process::id()));
        let path = dir.join("table.json");

        let mut table = ScoringTable::v1();
        table.weights.smoking = u32::MAX;
        table.weights.diabetes = 9;
        std::fs::create_dir_all(&dir).expect("Should create dir");
        std::fs::write(&path, serde_json::to_vec(&table).expect("Should encode"))
            .expect("Should write");

        assert!(matches!(
            ScoringTable::load(&path),
            Err(TableError::WeightOverflow)
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_threshold_order_rejected() {
        let mut table = ScoringTable::v1();
        table.glucose = Thresholds {
            medium: 126,
            high: 100,
        };
        assert!(matches!(
            table.validate(),
            Err(TableError::ThresholdOrder {
                metric: "glucose",
                ..
            })
        ));
    }

    #[test]
    fn test_empty_version_rejected() {
        let mut table = ScoringTable::v1();
        table.version = "  ".to_string();
        assert!(matches!(table.validate(), Err(TableError::EmptyVersion)));
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = ScoringTable::v1();
        let mut b = ScoringTable::v1();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);

        b.cholesterol.high = 250;
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_export_then_load() {
        let dir = std::env::temp_dir().join(format!("heartwise-table-{}", std::process::id()));
        let path = dir.join("table.json");

        ScoringTable::v1().export(&path).expect("Should export");
        let loaded = ScoringTable::load(&path).expect("Should load");
        assert_eq!(loaded.version, "v1");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_unspecified_gender_uses_male_bands() {
        assert!(AgeCohort::Male.applies_to(Gender::Unspecified));
        assert!(!AgeCohort::Female.applies_to(Gender::Unspecified));
        assert!(AgeCohort::Any.applies_to(Gender::Female));
    }
}
