//! Recommendation prioritization.
//!
//! Two independent lookup tables composed in sequence:
//!
//! - **Critical overrides**, keyed by flags and component statuses, evaluated
//!   in fixed priority order. Every rule that fires contributes one item.
//! - **Base bundles**, keyed by percentage band (0, <=20, <=40, <=60, <=80,
//!   >80), each a fixed ordered list of general advice.
//!
//! The final list is overrides followed by the base bundle. Items are never
//! deduplicated across the two tables.

use serde::{Deserialize, Serialize};

use super::assessment::{ComponentStatus, RiskAssessment};

/// Whether an item supersedes the general advice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    General,
}

/// One piece of advice. `category` is an opaque grouping label for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub category: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy)]
struct Advice {
    category: &'static str,
    text: &'static str,
}

impl Advice {
    const fn new(category: &'static str, text: &'static str) -> Self {
        Self { category, text }
    }

    fn to_recommendation(self, priority: Priority) -> Recommendation {
        Recommendation {
            priority,
            category: self.category.to_string(),
            text: self.text.to_string(),
        }
    }
}

/// A critical override: returns the advice to inject, if its condition holds.
struct CriticalRule {
    name: &'static str,
    select: fn(&RiskAssessment) -> Option<Advice>,
}

const QUIT_SMOKING: Advice = Advice::new(
    "smoking",
    "Quit smoking. It is the single most effective change for your heart; ask your doctor about cessation support.",
);
const BP_URGENT: Advice = Advice::new(
    "blood-pressure",
    "Your blood pressure is high. See a doctor promptly to discuss treatment.",
);
const BP_ELEVATED: Advice = Advice::new(
    "blood-pressure",
    "Your blood pressure is elevated. Check it at home regularly and cut back on salt.",
);
const CHOLESTEROL_DIET_REVIEW: Advice = Advice::new(
    "cholesterol",
    "Your cholesterol is high. Arrange a diet review with your doctor or a dietitian.",
);
const DIABETES_PLAN: Advice = Advice::new(
    "glucose",
    "Work with your doctor on a blood sugar and diabetes management plan.",
);

/// Critical overrides in priority order.
const CRITICAL_RULES: &[CriticalRule] = &[
    CriticalRule {
        name: "smoking",
        select: |a| a.input.smoking.then_some(QUIT_SMOKING),
    },
    CriticalRule {
        name: "blood-pressure",
        select: |a| match a.bp_status {
            ComponentStatus::High => Some(BP_URGENT),
            ComponentStatus::Medium if a.risk_percentage > 33 => Some(BP_ELEVATED),
            _ => None,
        },
    },
    CriticalRule {
        name: "cholesterol",
        select: |a| {
            (a.cholesterol_status == ComponentStatus::High && a.risk_percentage > 40)
                .then_some(CHOLESTEROL_DIET_REVIEW)
        },
    },
    CriticalRule {
        name: "diabetes",
        select: |a| {
            (a.glucose_status == ComponentStatus::High || a.input.diabetes)
                .then_some(DIABETES_PLAN)
        },
    },
];

/// A base bundle applies to percentages up to and including `max_percentage`.
struct Bundle {
    max_percentage: u8,
    items: &'static [Advice],
}

const BASE_BUNDLES: &[Bundle] = &[
    Bundle {
        max_percentage: 0,
        items: &[
            Advice::new("lifestyle", "Excellent work. Keep up your current healthy lifestyle."),
            Advice::new("exercise", "Stay active with at least 150 minutes of moderate exercise per week."),
            Advice::new("checkup", "Keep a routine health check-up once a year."),
        ],
    },
    Bundle {
        max_percentage: 20,
        items: &[
            Advice::new("diet", "Maintain a balanced diet rich in vegetables, fruit and whole grains."),
            Advice::new("exercise", "Aim for 150 minutes of moderate activity per week."),
            Advice::new("checkup", "Have your blood pressure and cholesterol checked once a year."),
        ],
    },
    Bundle {
        max_percentage: 40,
        items: &[
            Advice::new("diet", "Reduce saturated fat, added sugar and salt in your meals."),
            Advice::new("exercise", "Exercise for 30 minutes on at least five days a week."),
            Advice::new("monitoring", "Check your blood pressure every six months."),
            Advice::new("stress", "Make time for stress management such as walking or meditation."),
        ],
    },
    Bundle {
        max_percentage: 60,
        items: &[
            Advice::new("checkup", "Book a consultation with your doctor within the next few months."),
            Advice::new("diet", "Follow a heart-healthy eating plan such as DASH or Mediterranean."),
            Advice::new("exercise", "Build up regular aerobic exercise, within limits your doctor agrees."),
            Advice::new("monitoring", "Track blood pressure and cholesterol every three months."),
            Advice::new("lifestyle", "Limit alcohol and aim for 7 to 8 hours of sleep."),
        ],
    },
    Bundle {
        max_percentage: 80,
        items: &[
            Advice::new("checkup", "Schedule an appointment with your doctor soon for a full cardiovascular evaluation."),
            Advice::new("medication", "Take any prescribed medication exactly as directed."),
            Advice::new("diet", "Adopt a strict low-sodium, low-saturated-fat diet."),
            Advice::new("exercise", "Join a supervised or doctor-approved exercise programme."),
            Advice::new("monitoring", "Measure your blood pressure at home every week."),
        ],
    },
    Bundle {
        max_percentage: 100,
        items: &[
            Advice::new("checkup", "Seek medical consultation as soon as possible."),
            Advice::new("checkup", "Ask your doctor about cardiac screening such as an ECG and a lipid panel."),
            Advice::new("medication", "Follow prescribed medication without skipping doses."),
            Advice::new("exercise", "Keep to gentle activity your doctor has approved."),
            Advice::new("diet", "Follow a strict heart-healthy, low-sodium diet."),
            Advice::new("emergency", "Learn the warning signs of a heart attack and call emergency services if chest pain or breathlessness occurs."),
        ],
    },
];

/// Critical overrides that fire for an assessment, in priority order.
#[must_use]
pub fn critical_overrides(assessment: &RiskAssessment) -> Vec<Recommendation> {
    CRITICAL_RULES
        .iter()
        .filter_map(|rule| {
            let advice = (rule.select)(assessment)?;
            tracing::trace!("Critical override `{}` applied", rule.name);
            Some(advice.to_recommendation(Priority::Critical))
        })
        .collect()
}

/// General advice for a risk percentage.
#[must_use]
pub fn base_bundle(risk_percentage: u8) -> Vec<Recommendation> {
    BASE_BUNDLES
        .iter()
        .find(|bundle| risk_percentage <= bundle.max_percentage)
        .or_else(|| BASE_BUNDLES.last())
        .map(|bundle| {
            bundle
                .items
                .iter()
                .map(|advice| advice.to_recommendation(Priority::General))
                .collect()
        })
        .unwrap_or_default()
}

/// Full prioritized recommendation list: overrides, then the base bundle.
#[must_use]
pub fn recommend(assessment: &RiskAssessment) -> Vec<Recommendation> {
    let mut recommendations = critical_overrides(assessment);
    recommendations.extend(base_bundle(assessment.risk_percentage));
    recommendations
}
