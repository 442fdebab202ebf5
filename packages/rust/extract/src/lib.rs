//! Field extraction from normalized medical document text.
//!
//! [`Extractor::extract`] turns one document's text into a [`Profile`]. It
//! never fails: a field that no pattern matches, or whose matched text does
//! not convert, is left unset.
//!
//! Scalar fields are resolved by ordered pattern ladders (most specific label
//! first, bare number plus unit last). List fields accumulate every labelled
//! line, bullet block and checked form row.

mod checkbox;
mod goals;
mod labs;
mod ladder;
mod lists;
mod scalars;
mod segments;

use std::sync::LazyLock;

use chrono::{Local, NaiveDate};
use regex::Regex;
use tracing::debug;

use healthdigest_shared::{Profile, body_mass_index};

use crate::ladder::MatchContext;
use crate::lists::{ListField, push_unique};

pub use goals::classify as classify_goal;

/// Markdown strong emphasis around labels and values (`**Age:**`, `__Sex__`).
static EMPHASIS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*{2,}|_{2,}").expect("valid regex"));

/// Extracts a [`Profile`] from document text.
#[derive(Debug, Clone, Copy)]
pub struct Extractor {
    reference_date: NaiveDate,
}

impl Extractor {
    /// Create an extractor that computes ages from birth years against today.
    pub fn new() -> Self {
        Self::with_reference_date(Local::now().date_naive())
    }

    /// Create an extractor with a fixed reference date for birth-year ages.
    pub fn with_reference_date(reference_date: NaiveDate) -> Self {
        Self { reference_date }
    }

    /// Extract every recognizable field from `text`.
    pub fn extract(&self, text: &str) -> Profile {
        let text = EMPHASIS_RE
            .replace_all(&text.to_lowercase(), "")
            .into_owned();
        let ctx = MatchContext {
            today: self.reference_date,
        };

        let height_cm = scalars::HEIGHT.evaluate(&text, &ctx);
        let weight_kg = scalars::WEIGHT.evaluate(&text, &ctx);
        let bmi = scalars::BMI
            .evaluate(&text, &ctx)
            .or_else(|| body_mass_index(weight_kg?, height_cm?));

        let mut conditions = lists::extract(ListField::Conditions, &text);
        for label in checkbox::checked_labels(&text) {
            push_unique(&mut conditions, label);
        }

        let profile = Profile {
            age: scalars::AGE.evaluate(&text, &ctx),
            gender: scalars::GENDER.evaluate(&text, &ctx),
            height_cm,
            weight_kg,
            bmi,
            conditions,
            medications: lists::extract(ListField::Medications, &text),
            allergies: lists::extract(ListField::Allergies, &text),
            dietary_restrictions: lists::extract(ListField::DietaryRestrictions, &text),
            recent_labs: labs::extract(&text),
            goals: goals::extract(&text),
        };

        debug!(
            fields = profile.populated_fields(),
            conditions = profile.conditions.len(),
            labs = profile.recent_labs.len(),
            "profile extracted"
        );

        profile
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract a profile using today's date as the reference.
pub fn extract_profile(text: &str) -> Profile {
    Extractor::new().extract(text)
}

#[cfg(test)]
mod tests {
    use healthdigest_shared::{BmiCategory, GoalKind};

    use super::*;

    fn extractor() -> Extractor {
        Extractor::with_reference_date(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
    }

    fn fixture(name: &str) -> String {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures/documents")
            .join(name);
        std::fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    #[test]
    fn examination_scenario() {
        let text = "Age: 70\nWeight: 95 kg\nHeight: 170 cm\nDiagnosis: Type 2 Diabetes";
        let profile = extractor().extract(text);

        assert_eq!(profile.age, Some(70));
        assert_eq!(profile.weight_kg, Some(95.0));
        assert_eq!(profile.height_cm, Some(170.0));
        let bmi = profile.bmi.unwrap();
        assert!((bmi - 32.87).abs() < 0.01, "bmi was {bmi}");
        assert_eq!(profile.conditions, vec!["type 2 diabetes"]);
        assert_eq!(profile.bmi_category(), Some(BmiCategory::Obese));
    }

    #[test]
    fn bold_labels_are_matched() {
        let profile = extractor().extract("**Age:** 70\n**Sex:** M\n__Weight:__ 95 kg");
        assert_eq!(profile.age, Some(70));
        assert_eq!(profile.gender.as_deref(), Some("Male"));
        assert_eq!(profile.weight_kg, Some(95.0));
    }

    #[test]
    fn rendered_metrics_extract_again() {
        let text = "- **Age:** 70\n- **Height:** 170.0 cm\n- **Weight:** 95.0 kg\n- **BMI:** 32.9 (Obese)";
        let profile = extractor().extract(text);
        assert_eq!(profile.age, Some(70));
        assert_eq!(profile.height_cm, Some(170.0));
        assert_eq!(profile.weight_kg, Some(95.0));
        assert_eq!(profile.bmi, Some(32.9));
    }

    #[test]
    fn bmi_derived_exactly() {
        let profile = extractor().extract("Height: 180 cm\nWeight: 81 kg");
        assert!((profile.bmi.unwrap() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn explicit_bmi_beats_derived() {
        let profile = extractor().extract("Height: 180 cm\nWeight: 81 kg\nBMI: 26.1");
        assert_eq!(profile.bmi, Some(26.1));
    }

    #[test]
    fn bmi_absent_without_both_inputs() {
        let profile = extractor().extract("Weight: 81 kg");
        assert_eq!(profile.bmi, None);
    }

    #[test]
    fn negated_allergies_yield_empty_list() {
        let profile = extractor().extract("Allergies: none reported");
        assert!(profile.allergies.is_empty());
    }

    #[test]
    fn empty_text_yields_empty_profile() {
        assert!(extractor().extract("").is_empty());
        assert_eq!(extractor().extract(""), Profile::default());
    }

    #[test]
    fn imperial_units_are_converted() {
        let profile = extractor().extract("Height: 5 ft 10 in\nWeight: 200 lbs");
        assert!((profile.height_cm.unwrap() - 177.8).abs() < 1e-6);
        assert!((profile.weight_kg.unwrap() - 90.7184).abs() < 1e-6);
    }

    #[test]
    fn age_from_date_of_birth() {
        let profile = extractor().extract("DOB: 1961-04-12");
        assert_eq!(profile.age, Some(64));
    }

    #[test]
    fn checkbox_rows_union_with_prose_conditions() {
        let text = "Diagnosis: Asthma\n\n| Condition | Yes |\n| --- | --- |\n| High blood pressure | ✓ |";
        let profile = extractor().extract(text);
        assert_eq!(profile.conditions, vec!["asthma", "high blood pressure"]);
    }

    #[test]
    fn examination_fixture() {
        let profile = extractor().extract(&fixture("examination.md"));
        assert_eq!(profile.age, Some(70));
        assert_eq!(profile.gender.as_deref(), Some("Male"));
        assert_eq!(profile.height_cm, Some(170.0));
        assert_eq!(profile.weight_kg, Some(95.0));
        assert!(profile.has_condition("Type 2 Diabetes"));
        assert!(profile.medications.contains(&"metformin 500 mg".to_string()));
        assert!(profile.allergies.is_empty());
        assert_eq!(profile.recent_labs.get("cholesterol").map(String::as_str), Some("240"));
        assert_eq!(profile.recent_labs.get("blood_pressure").map(String::as_str), Some("150/95"));
    }

    #[test]
    fn nutrition_fixture_goals() {
        let profile = extractor().extract(&fixture("nutrition.md"));
        let kinds: Vec<GoalKind> = profile.goals.iter().map(|g| g.kind).collect();
        assert_eq!(kinds, vec![GoalKind::WeightLoss, GoalKind::EnergyBoost]);
        assert_eq!(profile.goals[0].target_value, Some(8.0));
        assert_eq!(profile.dietary_restrictions, vec!["vegetarian", "low sodium"]);
        assert_eq!(profile.allergies, vec!["peanuts", "shellfish"]);
    }

    #[test]
    fn classify_goal_is_exposed() {
        assert_eq!(classify_goal("Build muscle"), GoalKind::MuscleGain);
    }
}
