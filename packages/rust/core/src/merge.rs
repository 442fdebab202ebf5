//! Profile merging: per-document profiles into one canonical profile.
//!
//! Policies by field shape:
//!
//! - scalars (age, gender, height, weight, BMI): the first present value wins
//! - lists (conditions, medications, allergies, dietary restrictions, goals):
//!   union in first-seen order, membership by exact equality
//! - labs: the last profile defining a lab overwrites earlier values
//!
//! Input order is significant and decided by the caller.

use tracing::debug;

use healthdigest_shared::{Profile, body_mass_index};

/// Merge profiles into one. `merge(&[])` is the empty profile.
pub fn merge(profiles: &[Profile]) -> Profile {
    let mut merged = Profile::default();

    for profile in profiles {
        merged.age = merged.age.or(profile.age);
        if merged.gender.is_none() {
            merged.gender.clone_from(&profile.gender);
        }
        merged.height_cm = merged.height_cm.or(profile.height_cm);
        merged.weight_kg = merged.weight_kg.or(profile.weight_kg);
        merged.bmi = merged.bmi.or(profile.bmi);

        union_into(&mut merged.conditions, &profile.conditions);
        union_into(&mut merged.medications, &profile.medications);
        union_into(&mut merged.allergies, &profile.allergies);
        union_into(&mut merged.dietary_restrictions, &profile.dietary_restrictions);
        union_into(&mut merged.goals, &profile.goals);

        merged.recent_labs.extend(
            profile
                .recent_labs
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
    }

    // Height and weight may come from different documents.
    if merged.bmi.is_none() {
        merged.bmi = merged
            .weight_kg
            .zip(merged.height_cm)
            .and_then(|(weight, height)| body_mass_index(weight, height));
    }

    debug!(
        sources = profiles.len(),
        fields = merged.populated_fields(),
        "profiles merged"
    );

    merged
}

fn union_into<T: Clone + PartialEq>(target: &mut Vec<T>, items: &[T]) {
    for item in items {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use healthdigest_shared::{Goal, GoalKind};

    use super::*;

    fn with_labs(labs: &[(&str, &str)]) -> Profile {
        Profile {
            recent_labs: labs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
            ..Profile::default()
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_input_is_empty_profile() {
        assert_eq!(merge(&[]), Profile::default());
    }

    #[test]
    fn single_profile_is_unchanged() {
        let profile = Profile {
            age: Some(52),
            gender: Some("Female".to_string()),
            height_cm: Some(160.0),
            weight_kg: Some(70.0),
            bmi: Some(27.3),
            conditions: strings(&["asthma"]),
            medications: strings(&["salbutamol"]),
            recent_labs: with_labs(&[("glucose", "98")]).recent_labs,
            goals: vec![Goal::new(GoalKind::EnergyBoost)],
            ..Profile::default()
        };
        assert_eq!(merge(std::slice::from_ref(&profile)), profile);
    }

    #[test]
    fn first_scalar_wins() {
        let first = Profile {
            age: Some(40),
            ..Profile::default()
        };
        let second = Profile {
            age: Some(45),
            gender: Some("Male".to_string()),
            ..Profile::default()
        };
        let merged = merge(&[first, second]);
        assert_eq!(merged.age, Some(40));
        assert_eq!(merged.gender.as_deref(), Some("Male"));
    }

    #[test]
    fn lists_are_unioned_in_first_seen_order() {
        let a = Profile {
            conditions: strings(&["asthma", "gout"]),
            ..Profile::default()
        };
        let b = Profile {
            conditions: strings(&["hypertension", "asthma", "Asthma"]),
            ..Profile::default()
        };
        assert_eq!(
            merge(&[a, b]).conditions,
            strings(&["asthma", "gout", "hypertension", "Asthma"])
        );
    }

    #[test]
    fn labs_last_value_wins() {
        let merged = merge(&[
            with_labs(&[("cholesterol", "190"), ("glucose", "100")]),
            with_labs(&[("cholesterol", "230")]),
        ]);
        assert_eq!(merged.recent_labs["cholesterol"], "230");
        assert_eq!(merged.recent_labs["glucose"], "100");
    }

    #[test]
    fn goals_unioned_by_value() {
        let loss = Goal::new(GoalKind::WeightLoss).with_target_value(5.0);
        let a = Profile {
            goals: vec![loss.clone()],
            ..Profile::default()
        };
        let b = Profile {
            goals: vec![loss.clone(), Goal::new(GoalKind::WeightLoss)],
            ..Profile::default()
        };
        assert_eq!(merge(&[a, b]).goals, vec![loss, Goal::new(GoalKind::WeightLoss)]);
    }

    #[test]
    fn bmi_derived_across_documents() {
        let a = Profile {
            height_cm: Some(180.0),
            ..Profile::default()
        };
        let b = Profile {
            weight_kg: Some(81.0),
            ..Profile::default()
        };
        let bmi = merge(&[a, b]).bmi.unwrap();
        assert!((bmi - 25.0).abs() < 1e-9);
    }

    #[test]
    fn selected_bmi_is_not_recomputed() {
        let a = Profile {
            height_cm: Some(180.0),
            weight_kg: Some(81.0),
            bmi: Some(24.0),
            ..Profile::default()
        };
        assert_eq!(merge(&[a]).bmi, Some(24.0));
    }
}
