//! Health metrics supplied by the caller for cardiovascular risk scoring.
//!
//! The record mirrors the assessment form: demographics, three clinical
//! readings, and a handful of lifestyle flags. Parsing is the only place an
//! input can be rejected; well-typed but implausible readings are accepted and
//! scored as-is.

use serde::{Deserialize, Serialize};

/// Error raised at the engine boundary before any scoring happens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required field is absent or carries the wrong JSON type.
    #[error("Malformed input: {0}")]
    MalformedInput(String),
}

impl From<serde_json::Error> for ValidationError {
    fn from(e: serde_json::Error) -> Self {
        Self::MalformedInput(e.to_string())
    }
}

/// Self-reported gender. Selects which age bands apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Gender {
    Male,
    Female,
    /// Anything other than male/female, including an empty string.
    Unspecified,
}

impl From<String> for Gender {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Self::Male,
            "female" | "f" => Self::Female,
            _ => Self::Unspecified,
        }
    }
}

/// Weekly physical activity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ExerciseLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
}

impl ExerciseLevel {
    /// Levels that count as a lifestyle risk factor.
    #[must_use]
    pub fn is_low_activity(self) -> bool {
        matches!(self, Self::Sedentary | Self::Light)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sedentary => "sedentary",
            Self::Light => "light",
            Self::Moderate => "moderate",
            Self::Active => "active",
        }
    }
}

impl TryFrom<String> for ExerciseLevel {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sedentary" => Ok(Self::Sedentary),
            "light" => Ok(Self::Light),
            "moderate" => Ok(Self::Moderate),
            "active" => Ok(Self::Active),
            other => Err(format!(
                "unknown exercise level `{other}`, expected one of sedentary, light, moderate, active"
            )),
        }
    }
}

/// One self-reported set of health metrics.
///
/// JSON keys follow the form contract (`familyHistory` is camelCase, the
/// optional body measurements are snake_case). Unknown keys are ignored so
/// callers may post extra form fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthMetricsInput {
    /// Age in years
    pub age: i64,

    pub gender: Gender,

    /// Systolic blood pressure in mmHg
    pub systolic: i64,

    /// Diastolic blood pressure in mmHg
    pub diastolic: i64,

    /// Total cholesterol in mg/dL
    pub cholesterol: i64,

    /// Fasting blood glucose in mg/dL
    pub glucose: i64,

    pub smoking: bool,

    pub diabetes: bool,

    pub exercise: ExerciseLevel,

    /// Heart disease in a first-degree relative
    #[serde(rename = "familyHistory")]
    pub family_history: bool,

    /// Height in feet (optional, used only for BMI)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_ft: Option<f64>,

    /// Weight in kilograms (optional, used only for BMI)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
}

const METRES_PER_FOOT: f64 = 0.3048;

impl HealthMetricsInput {
    /// Parse a metrics record from an already-decoded JSON value.
    ///
    /// # Errors
    /// Returns `ValidationError::MalformedInput` when a required field is
    /// missing or has the wrong type.
    pub fn from_json_value(value: &serde_json::Value) -> Result<Self, ValidationError> {
        if !value.is_object() {
            return Err(ValidationError::MalformedInput(
                "expected a JSON object of health metrics".to_string(),
            ));
        }
        Ok(Self::deserialize(value)?)
    }

    /// Parse a metrics record from JSON text.
    ///
    /// # Errors
    /// Returns `ValidationError::MalformedInput` on invalid JSON, a missing
    /// field, or a field of the wrong type.
    pub fn from_json_str(s: &str) -> Result<Self, ValidationError> {
        let value: serde_json::Value = serde_json::from_str(s)?;
        Self::from_json_value(&value)
    }

    /// Body mass index, when both height and weight are present and positive.
    ///
    /// Rounded to one decimal place. Never contributes to the risk score.
    #[must_use]
    pub fn bmi(&self) -> Option<f64> {
        let height_m = self.height_ft.filter(|h| h.is_finite() && *h > 0.0)? * METRES_PER_FOOT;
        let weight = self.weight_kg.filter(|w| w.is_finite() && *w > 0.0)?;
        let bmi = weight / (height_m * height_m);
        Some((bmi * 10.0).round() / 10.0)
    }

    /// Readings outside typical clinical ranges.
    ///
    /// These are reported, not rejected: the engine scores any well-typed
    /// record, and implausible values simply land in the extreme tiers.
    #[must_use]
    pub fn range_warnings(&self) -> Vec<String> {
        let checks: [(&str, i64, std::ops::RangeInclusive<i64>); 5] = [
            ("age", self.age, 1..=120),
            ("systolic", self.systolic, 50..=250),
            ("diastolic", self.diastolic, 30..=150),
            ("cholesterol", self.cholesterol, 50..=500),
            ("glucose", self.glucose, 20..=600),
        ];

        checks
            .into_iter()
            .filter(|(_, value, range)| !range.contains(value))
            .map(|(name, value, range)| {
                format!(
                    "{name} {value} outside typical range [{}, {}]",
                    range.start(),
                    range.end()
                )
            })
            .collect()
    }
}
