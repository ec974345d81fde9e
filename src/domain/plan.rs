//! Weekly health plan targets by risk level.

use serde::{Deserialize, Serialize};

use super::assessment::RiskLevel;

/// Weekly activity targets shown alongside an assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyPlan {
    pub cardio_minutes: u32,
    pub strength_minutes: u32,
    pub sleep_hours_per_night: f32,
    pub meditation_minutes: u32,
    pub healthy_meals: u32,
    /// Short explanations of the targets, in display order
    pub guidance: Vec<String>,
}

impl WeeklyPlan {
    /// Plan for a risk level. Excellent shares the Low plan.
    #[must_use]
    pub fn for_level(level: RiskLevel) -> Self {
        match level {
            RiskLevel::Excellent | RiskLevel::Low => Self::build(
                [150, 60, 30, 14],
                7.0,
                [
                    "Cardio: aim for 150 minutes of moderate activity per week.",
                    "Strength: two sessions, 60 minutes in total, per week.",
                    "Sleep: 7 hours per night.",
                ],
            ),
            RiskLevel::Medium => Self::build(
                [180, 90, 60, 18],
                7.5,
                [
                    "Cardio: increase to 180 minutes of activity per week.",
                    "Strength: three sessions, 90 minutes in total, per week.",
                    "Sleep: prioritize 7.5 hours per night.",
                ],
            ),
            RiskLevel::High => Self::build(
                [200, 120, 90, 21],
                8.0,
                [
                    "Cardio: 200 or more minutes of gentle activity per week, after consulting a doctor.",
                    "Strength: three to four light sessions, 120 minutes in total.",
                    "Sleep: 8 hours per night for recovery.",
                ],
            ),
        }
    }

    fn build(minutes: [u32; 4], sleep: f32, guidance: [&str; 3]) -> Self {
        let [cardio, strength, meditation, meals] = minutes;
        Self {
            cardio_minutes: cardio,
            strength_minutes: strength,
            sleep_hours_per_night: sleep,
            meditation_minutes: meditation,
            healthy_meals: meals,
            guidance: guidance.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}
