//! Risk scoring engine.
//!
//! Pure, synchronous and stateless: a metrics record goes in, exactly one
//! assessment comes out. Scoring runs in four steps:
//!
//! 1. Classify blood pressure, cholesterol and glucose into Low/Medium/High.
//! 2. Accumulate weighted contributions in a fixed order (age bands, component
//!    statuses, smoking and diabetes, lifestyle). Evaluation order decides
//!    the order of `risk_factors`, never the total.
//! 3. Normalize the score against the table's `max_score`.
//! 4. Band the percentage into a risk level.
//!
//! Out-of-range readings are scored like any other value. Negative ages cross
//! no age band; a systolic of 0 is simply Low.

use std::sync::OnceLock;

use super::assessment::{ComponentStatus, RiskAssessment, RiskLevel};
use super::metrics::{HealthMetricsInput, ValidationError};
use super::table::{BloodPressureThresholds, ScoringTable, TableError, Thresholds, TierWeights};

const SMOKING_LABEL: &str = "Smoking";
const DIABETES_LABEL: &str = "Diabetes";
const LOW_ACTIVITY_LABEL: &str = "Low physical activity";
const FAMILY_HISTORY_LABEL: &str = "Family history of heart disease";

static DEFAULT_ENGINE: OnceLock<ScoringEngine> = OnceLock::new();

/// Scoring engine bound to one validated table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringEngine {
    table: ScoringTable,
}

/// Running score plus the labels of the rules that fired.
#[derive(Debug, Default)]
struct Tally {
    score: u32,
    factors: Vec<String>,
}

impl Tally {
    fn add(&mut self, weight: u32, label: Option<String>) {
        self.score = self.score.saturating_add(weight);
        if let Some(label) = label {
            self.factors.push(label);
        }
    }

    /// Add the weight of the matched tier only. Low contributes nothing.
    fn add_tier(&mut self, status: ComponentStatus, weights: TierWeights, high: String, medium: String) {
        match status {
            ComponentStatus::High => self.add(weights.high, Some(high)),
            ComponentStatus::Medium => self.add(weights.medium, Some(medium)),
            ComponentStatus::Low => {}
        }
    }
}

impl ScoringEngine {
    /// Create an engine for the given table.
    ///
    /// # Errors
    /// Returns error if the table fails validation.
    pub fn new(table: ScoringTable) -> Result<Self, TableError> {
        table.validate()?;
        Ok(Self { table })
    }

    /// Shared engine for the built-in v1 table.
    pub fn builtin() -> &'static Self {
        DEFAULT_ENGINE.get_or_init(Self::default)
    }

    #[must_use]
    pub fn table(&self) -> &ScoringTable {
        &self.table
    }

    /// Blood pressure status. Either reading reaching a cutoff is enough.
    #[must_use]
    pub fn bp_status(&self, systolic: i64, diastolic: i64) -> ComponentStatus {
        classify_bp(systolic, diastolic, &self.table.blood_pressure)
    }

    #[must_use]
    pub fn cholesterol_status(&self, cholesterol: i64) -> ComponentStatus {
        classify(cholesterol, self.table.cholesterol)
    }

    #[must_use]
    pub fn glucose_status(&self, glucose: i64) -> ComponentStatus {
        classify(glucose, self.table.glucose)
    }

    /// Parse and score a raw JSON record.
    ///
    /// # Errors
    /// Returns `ValidationError::MalformedInput` if a required field is
    /// missing or mistyped. Nothing is scored in that case.
    pub fn compute_assessment(
        &self,
        raw: &serde_json::Value,
    ) -> Result<RiskAssessment, ValidationError> {
        let input = HealthMetricsInput::from_json_value(raw)?;
        Ok(self.score(&input))
    }

    /// Score a typed metrics record. Infallible.
    #[must_use]
    pub fn score(&self, input: &HealthMetricsInput) -> RiskAssessment {
        let table = &self.table;
        let weights = &table.weights;

        let bp_status = self.bp_status(input.systolic, input.diastolic);
        let cholesterol_status = self.cholesterol_status(input.cholesterol);
        let glucose_status = self.glucose_status(input.glucose);

        let mut tally = Tally::default();

        // 1. Age bands, cumulative
        for band in &table.age_bands {
            if band.cohort.applies_to(input.gender) && input.age >= band.min_age {
                tally.add(band.weight, band.label.clone());
            }
        }

        // 2. Component statuses, one tier each
        let bp_reading = format!("{}/{} mmHg", input.systolic, input.diastolic);
        tally.add_tier(
            bp_status,
            weights.blood_pressure,
            format!("High blood pressure ({bp_reading})"),
            format!("Elevated blood pressure ({bp_reading})"),
        );
        tally.add_tier(
            cholesterol_status,
            weights.cholesterol,
            format!("High cholesterol ({} mg/dL)", input.cholesterol),
            format!("Borderline high cholesterol ({} mg/dL)", input.cholesterol),
        );
        tally.add_tier(
            glucose_status,
            weights.glucose,
            format!("High blood glucose ({} mg/dL)", input.glucose),
            format!("Elevated blood glucose ({} mg/dL)", input.glucose),
        );

        // 3. Binary high-weight factors
        if input.smoking {
            tally.add(weights.smoking, Some(SMOKING_LABEL.to_string()));
        }
        if input.diabetes {
            tally.add(weights.diabetes, Some(DIABETES_LABEL.to_string()));
        }

        // 4. Lifestyle
        if input.exercise.is_low_activity() {
            tally.add(weights.low_activity, Some(LOW_ACTIVITY_LABEL.to_string()));
        }
        if input.family_history {
            tally.add(
                weights.family_history,
                Some(FAMILY_HISTORY_LABEL.to_string()),
            );
        }

        let risk_percentage = risk_percentage(tally.score, table.max_score);

        RiskAssessment {
            risk_score: tally.score,
            risk_percentage,
            risk_level: RiskLevel::from_percentage(risk_percentage),
            bp_status,
            cholesterol_status,
            glucose_status,
            risk_factors: tally.factors,
            bmi: input.bmi(),
            table_version: table.version.clone(),
            input: input.clone(),
        }
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self {
            table: ScoringTable::v1(),
        }
    }
}

/// Score a raw JSON record with the built-in table.
///
/// # Errors
/// Returns `ValidationError::MalformedInput` for a missing or mistyped field.
pub fn compute_assessment(raw: &serde_json::Value) -> Result<RiskAssessment, ValidationError> {
    ScoringEngine::builtin().compute_assessment(raw)
}

/// `min(round(score / max_score * 100), 100)`, rounding half up.
#[must_use]
pub fn risk_percentage(score: u32, max_score: u32) -> u8 {
    if max_score == 0 {
        return if score == 0 { 0 } else { 100 };
    }
    let score = u64::from(score);
    let max_score = u64::from(max_score);
    let rounded = (score * 200 + max_score) / (2 * max_score);
    // Bounded by the min, so the cast is lossless.
    rounded.min(100) as u8
}

fn classify(reading: i64, thresholds: Thresholds) -> ComponentStatus {
    let mut status = ComponentStatus::Low;
    if reading >= thresholds.medium {
        status = ComponentStatus::Medium;
    }
    if reading >= thresholds.high {
        status = ComponentStatus::High;
    }
    status
}

fn classify_bp(systolic: i64, diastolic: i64, t: &BloodPressureThresholds) -> ComponentStatus {
    let mut status = ComponentStatus::Low;
    if systolic >= t.medium.systolic || diastolic >= t.medium.diastolic {
        status = ComponentStatus::Medium;
    }
    if systolic >= t.high.systolic || diastolic >= t.high.diastolic {
        status = ComponentStatus::High;
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::{ExerciseLevel, Gender};
    use serde_json::json;

    fn healthy() -> HealthMetricsInput {
        HealthMetricsInput {
            age: 25,
            gender: Gender::Female,
            systolic: 110,
            diastolic: 70,
            cholesterol: 150,
            glucose: 85,
            smoking: false,
            diabetes: false,
            exercise: ExerciseLevel::Active,
            family_history: false,
            height_ft: None,
            weight_kg: None,
        }
    }

    #[test]
    fn test_scenario_all_high() {
        let raw = json!({
            "age": 55,
            "gender": "male",
            "systolic": 145,
            "diastolic": 95,
            "cholesterol": 250,
            "glucose": 130,
            "smoking": true,
            "diabetes": true,
            "exercise": "sedentary",
            "familyHistory": true
        });

        let a = compute_assessment(&raw).expect("Should score");
        assert_eq!(a.bp_status, ComponentStatus::High);
        assert_eq!(a.cholesterol_status, ComponentStatus::High);
        assert_eq!(a.glucose_status, ComponentStatus::High);

        // age 1 + 1, bp 4, chol 3, glucose 3, smoking 4, diabetes 4, activity 2, family 2
        assert_eq!(a.risk_score, 24);
        assert_eq!(a.risk_percentage, 89);
        assert_eq!(a.risk_level, RiskLevel::High);
        assert_eq!(
            a.risk_factors,
            vec![
                "Male over 50",
                "High blood pressure (145/95 mmHg)",
                "High cholesterol (250 mg/dL)",
                "High blood glucose (130 mg/dL)",
                "Smoking",
                "Diabetes",
                "Low physical activity",
                "Family history of heart disease",
            ]
        );
        assert_eq!(a.table_version, "v1");
    }

    #[test]
    fn test_scenario_healthy() {
        let a = ScoringEngine::default().score(&healthy());
        assert_eq!(a.bp_status, ComponentStatus::Low);
        assert_eq!(a.cholesterol_status, ComponentStatus::Low);
        assert_eq!(a.glucose_status, ComponentStatus::Low);
        assert_eq!(a.risk_score, 0);
        assert_eq!(a.risk_percentage, 0);
        assert_eq!(a.risk_level, RiskLevel::Excellent);
        assert!(a.risk_factors.is_empty());
    }

    #[test]
    fn test_bp_boundaries() {
        let engine = ScoringEngine::default();
        assert_eq!(engine.bp_status(119, 79), ComponentStatus::Low);
        assert_eq!(engine.bp_status(120, 70), ComponentStatus::Medium);
        assert_eq!(engine.bp_status(110, 80), ComponentStatus::Medium);
        assert_eq!(engine.bp_status(139, 89), ComponentStatus::Medium);
        assert_eq!(engine.bp_status(140, 70), ComponentStatus::High);
        assert_eq!(engine.bp_status(110, 90), ComponentStatus::High);
    }

    #[test]
    fn test_lab_boundaries() {
        let engine = ScoringEngine::default();
        assert_eq!(engine.cholesterol_status(199), ComponentStatus::Low);
        assert_eq!(engine.cholesterol_status(200), ComponentStatus::Medium);
        assert_eq!(engine.cholesterol_status(240), ComponentStatus::High);
        assert_eq!(engine.glucose_status(99), ComponentStatus::Low);
        assert_eq!(engine.glucose_status(100), ComponentStatus::Medium);
        assert_eq!(engine.glucose_status(126), ComponentStatus::High);
    }

    #[test]
    fn test_medium_tiers_use_medium_weights() {
        let input = HealthMetricsInput {
            systolic: 125,
            cholesterol: 210,
            glucose: 110,
            ..healthy()
        };
        let a = ScoringEngine::default().score(&input);
        assert_eq!(a.risk_score, 2 + 2 + 1);
        assert_eq!(
            a.risk_factors,
            vec![
                "Elevated blood pressure (125/70 mmHg)",
                "Borderline high cholesterol (210 mg/dL)",
                "Elevated blood glucose (110 mg/dL)",
            ]
        );
    }

    #[test]
    fn test_age_bands() {
        let engine = ScoringEngine::default();
        let score_for = |gender, age| {
            engine
                .score(&HealthMetricsInput {
                    gender,
                    age,
                    ..healthy()
                })
                .risk_score
        };

        assert_eq!(score_for(Gender::Male, 39), 0);
        assert_eq!(score_for(Gender::Male, 40), 1);
        assert_eq!(score_for(Gender::Male, 50), 2);
        assert_eq!(score_for(Gender::Male, 60), 4);
        assert_eq!(score_for(Gender::Male, 70), 4);
        assert_eq!(score_for(Gender::Male, 71), 5);

        assert_eq!(score_for(Gender::Female, 49), 0);
        assert_eq!(score_for(Gender::Female, 50), 1);
        assert_eq!(score_for(Gender::Female, 60), 3);
        assert_eq!(score_for(Gender::Female, 71), 4);

        assert_eq!(score_for(Gender::Unspecified, 65), 4);
        assert_eq!(score_for(Gender::Male, -3), 0);
    }

    #[test]
    fn test_age_labels_emitted_once() {
        let engine = ScoringEngine::default();

        let male = engine.score(&HealthMetricsInput {
            gender: Gender::Male,
            age: 75,
            ..healthy()
        });
        assert_eq!(male.risk_factors, vec!["Male over 50"]);

        let female = engine.score(&HealthMetricsInput {
            age: 62,
            ..healthy()
        });
        assert_eq!(female.risk_factors, vec!["Female over 60"]);

        let young_male = engine.score(&HealthMetricsInput {
            gender: Gender::Male,
            age: 45,
            ..healthy()
        });
        assert_eq!(young_male.risk_score, 1);
        assert!(young_male.risk_factors.is_empty());
    }

    #[test]
    fn test_light_exercise_is_a_factor() {
        let engine = ScoringEngine::default();
        for (level, expected) in [
            (ExerciseLevel::Sedentary, 2),
            (ExerciseLevel::Light, 2),
            (ExerciseLevel::Moderate, 0),
            (ExerciseLevel::Active, 0),
        ] {
            let a = engine.score(&HealthMetricsInput {
                exercise: level,
                ..healthy()
            });
            assert_eq!(a.risk_score, expected, "{level:?}");
        }
    }

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(risk_percentage(0, 27), 0);
        assert_eq!(risk_percentage(1, 27), 4);
        assert_eq!(risk_percentage(9, 27), 33);
        assert_eq!(risk_percentage(27, 27), 100);
        assert_eq!(risk_percentage(40, 27), 100);
        // 1/8 = 12.5 rounds half up
        assert_eq!(risk_percentage(1, 8), 13);
        assert_eq!(risk_percentage(0, 0), 0);
    }

    #[test]
    fn test_malformed_input_rejected() {
        let raw = json!({ "age": 40, "gender": "male" });
        assert!(matches!(
            compute_assessment(&raw),
            Err(ValidationError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_custom_table() {
        let mut table = ScoringTable::v1();
        table.version = "v1-strict".to_string();
        table.blood_pressure.medium.systolic = 115;
        let engine = ScoringEngine::new(table).expect("Valid table");

        let a = engine.score(&HealthMetricsInput {
            systolic: 117,
            ..healthy()
        });
        assert_eq!(a.bp_status, ComponentStatus::Medium);
        assert_eq!(a.table_version, "v1-strict");

        let mut broken = ScoringTable::v1();
        broken.max_score = 30;
        assert!(ScoringEngine::new(broken).is_err());
    }

    #[test]
    fn test_idempotent() {
        let input = HealthMetricsInput {
            age: 63,
            gender: Gender::Male,
            systolic: 132,
            smoking: true,
            ..healthy()
        };
        let first = serde_json::to_string(&ScoringEngine::default().score(&input)).expect("json");
        let second = serde_json::to_string(&ScoringEngine::default().score(&input)).expect("json");
        assert_eq!(first, second);
    }
}
