//! Risk assessment types.
//!
//! Represents the output of the scoring engine and the stored record that
//! ties it to a user.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::metrics::HealthMetricsInput;

/// Low/Medium/High classification of a single clinical reading.
///
/// Ordered so that `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComponentStatus {
    Low,
    Medium,
    High,
}

impl ComponentStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl std::fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(Self::Low),
            "Medium" => Ok(Self::Medium),
            "High" => Ok(Self::High),
            other => Err(format!("unknown component status `{other}`")),
        }
    }
}

/// Coarse banding of the overall risk percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    /// No scoring rule triggered
    Excellent,
    /// 1-33 %
    Low,
    /// 34-66 %
    Medium,
    /// 67-100 %
    High,
}

impl RiskLevel {
    /// Band a percentage. Upper bounds are inclusive; every value in
    /// `0..=255` maps to exactly one level.
    #[must_use]
    pub fn from_percentage(percentage: u8) -> Self {
        match percentage {
            0 => Self::Excellent,
            1..=33 => Self::Low,
            34..=66 => Self::Medium,
            _ => Self::High,
        }
    }

    /// Get a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent - No risk factors detected",
            Self::Low => "Low risk - Keep up healthy habits",
            Self::Medium => "Medium risk - Lifestyle changes and follow-up recommended",
            Self::High => "High risk - Medical consultation advised",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Excellent" => Ok(Self::Excellent),
            "Low" => Ok(Self::Low),
            "Medium" => Ok(Self::Medium),
            "High" => Ok(Self::High),
            other => Err(format!("unknown risk level `{other}`")),
        }
    }
}

/// Result of scoring one metrics record. Immutable once computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Sum of weighted rule contributions
    #[serde(rename = "riskScore")]
    pub risk_score: u32,

    /// Score normalized against the table maximum, 0-100
    #[serde(rename = "riskPercentage")]
    pub risk_percentage: u8,

    #[serde(rename = "riskLevel")]
    pub risk_level: RiskLevel,

    pub bp_status: ComponentStatus,

    pub cholesterol_status: ComponentStatus,

    pub glucose_status: ComponentStatus,

    /// One label per triggered labeled rule, in evaluation order
    #[serde(rename = "riskFactors")]
    pub risk_factors: Vec<String>,

    /// Informational only, never scored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bmi: Option<f64>,

    /// Version of the scoring table that produced this assessment
    pub table_version: String,

    /// The metrics as submitted
    pub input: HealthMetricsInput,
}

/// Stored assessment, owned by a user. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    /// Unique identifier
    pub id: String,

    /// Owning user identity
    pub user_id: String,

    /// Server-assigned creation time
    pub created_at: chrono::DateTime<chrono::Utc>,

    pub assessment: RiskAssessment,
}

impl AssessmentRecord {
    /// Wrap an assessment with a fresh id and the current time.
    #[must_use]
    pub fn new(user_id: impl Into<String>, assessment: RiskAssessment) -> Self {
        Self {
            id: uuid_v4(),
            user_id: user_id.into(),
            created_at: chrono::Utc::now(),
            assessment,
        }
    }
}

/// Generate a random UUID v4 from a CSPRNG seeded with OS entropy.
fn uuid_v4() -> String {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let mut bytes: [u8; 16] = rng.gen();
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_bands() {
        assert_eq!(RiskLevel::from_percentage(0), RiskLevel::Excellent);
        assert_eq!(RiskLevel::from_percentage(1), RiskLevel::Low);
        assert_eq!(RiskLevel::from_percentage(33), RiskLevel::Low);
        assert_eq!(RiskLevel::from_percentage(34), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_percentage(66), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_percentage(67), RiskLevel::High);
        assert_eq!(RiskLevel::from_percentage(100), RiskLevel::High);
    }

    #[test]
    fn test_status_ordering() {
        assert!(ComponentStatus::Low < ComponentStatus::Medium);
        assert!(ComponentStatus::Medium < ComponentStatus::High);
    }

    #[test]
    fn test_string_roundtrip() {
        for status in [ComponentStatus::Low, ComponentStatus::Medium, ComponentStatus::High] {
            assert_eq!(status.as_str().parse::<ComponentStatus>(), Ok(status));
        }
        assert!("moderate".parse::<RiskLevel>().is_err());
        assert_eq!("Excellent".parse::<RiskLevel>(), Ok(RiskLevel::Excellent));
    }

    #[test]
    fn test_uuid_generation() {
        let id1 = uuid_v4();
        let id2 = uuid_v4();
        assert_ne!(id1, id2);
        assert_eq!(id1.len(), 36);
        assert_eq!(&id1[14..15], "4");
    }
}
