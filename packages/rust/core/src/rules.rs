//! The recommendation rule table.
//!
//! Rows are evaluated top to bottom. Within a category, entries appear in row
//! order, so the baseline row stays last. A contiguous run of goal rows is
//! expanded once per call, following the caller's goal order.

use healthdigest_shared::Category::{Exercise, Lifestyle, Medical, Monitoring, Nutrition};
use healthdigest_shared::{Category, GoalKind, Profile};

/// One recommendation entry.
#[derive(Debug, Clone, Copy)]
pub struct Advice {
    pub category: Category,
    pub text: &'static str,
}

/// When a rule fires.
#[derive(Debug, Clone, Copy)]
pub enum Trigger {
    /// Predicate over the profile.
    Profile(fn(&Profile) -> bool),
    /// A goal of this kind was requested.
    Goal(GoalKind),
    /// Every call.
    Always,
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub trigger: Trigger,
    pub advice: &'static [Advice],
}

impl Rule {
    pub fn is_goal(&self) -> bool {
        matches!(self.trigger, Trigger::Goal(_))
    }
}

const fn advice(category: Category, text: &'static str) -> Advice {
    Advice { category, text }
}

static RULES: &[Rule] = &[
    Rule {
        name: "bmi-underweight",
        trigger: Trigger::Profile(|p| p.bmi.is_some_and(|bmi| bmi < 18.5)),
        advice: &[
            advice(
                Nutrition,
                "Focus on calorie-dense, nutritious foods to support healthy weight gain",
            ),
            advice(Nutrition, "Include 5-6 smaller meals throughout the day"),
        ],
    },
    Rule {
        name: "bmi-overweight",
        trigger: Trigger::Profile(|p| p.bmi.is_some_and(|bmi| bmi > 25.0)),
        advice: &[
            advice(Nutrition, "Create a moderate calorie deficit through portion control"),
            advice(Nutrition, "Emphasize high-fiber, low-calorie density foods"),
        ],
    },
    Rule {
        name: "diabetes",
        trigger: Trigger::Profile(|p| p.has_condition("diabetes")),
        advice: &[
            advice(
                Nutrition,
                "Monitor carbohydrate intake and choose low-glycemic foods",
            ),
            advice(Monitoring, "Check blood glucose levels as prescribed"),
            advice(
                Exercise,
                "Include 30 minutes of moderate exercise daily to improve insulin sensitivity",
            ),
        ],
    },
    Rule {
        name: "hypertension",
        trigger: Trigger::Profile(|p| {
            p.has_condition("hypertension") || p.has_condition("high blood pressure")
        }),
        advice: &[
            advice(Nutrition, "Limit sodium intake to less than 2,300mg per day"),
            advice(Lifestyle, "Practice stress-reduction techniques like deep breathing"),
            advice(Monitoring, "Monitor blood pressure regularly"),
        ],
    },
    Rule {
        name: "heart",
        trigger: Trigger::Profile(|p| p.has_condition("heart") || p.has_condition("cardiac")),
        advice: &[
            advice(Nutrition, "Follow a heart-healthy diet rich in omega-3 fatty acids"),
            advice(Exercise, "Engage in low-impact cardio as approved by your physician"),
        ],
    },
    Rule {
        name: "goal-weight-loss",
        trigger: Trigger::Goal(GoalKind::WeightLoss),
        advice: &[
            advice(
                Nutrition,
                "Aim for 1-2 pounds of weight loss per week through diet and exercise",
            ),
            advice(Exercise, "Combine cardio and strength training for optimal fat loss"),
        ],
    },
    Rule {
        name: "goal-muscle-gain",
        trigger: Trigger::Goal(GoalKind::MuscleGain),
        advice: &[
            advice(Nutrition, "Consume 1.6-2.2g of protein per kg of body weight daily"),
            advice(Exercise, "Focus on progressive resistance training 3-4 times per week"),
        ],
    },
    Rule {
        name: "goal-energy-boost",
        trigger: Trigger::Goal(GoalKind::EnergyBoost),
        advice: &[
            advice(Lifestyle, "Maintain consistent sleep schedule (7-9 hours nightly)"),
            advice(
                Nutrition,
                "Balance macronutrients and avoid energy crashes with complex carbs",
            ),
        ],
    },
    Rule {
        name: "age-senior",
        trigger: Trigger::Profile(|p| p.age.is_some_and(|age| age >= 65)),
        advice: &[
            advice(Exercise, "Include balance and flexibility exercises to prevent falls"),
            advice(Medical, "Ensure adequate calcium and vitamin D intake"),
        ],
    },
    Rule {
        name: "age-young",
        trigger: Trigger::Profile(|p| p.age.is_some_and(|age| age <= 25)),
        advice: &[advice(Lifestyle, "Establish healthy habits now for long-term wellness")],
    },
    Rule {
        name: "cholesterol-high",
        trigger: Trigger::Profile(|p| p.lab_number("cholesterol").is_some_and(|v| v > 200.0)),
        advice: &[
            advice(Nutrition, "Limit saturated fat and increase soluble fiber intake"),
            advice(Medical, "Discuss cholesterol management with your healthcare provider"),
        ],
    },
    Rule {
        name: "baseline",
        trigger: Trigger::Always,
        advice: &[
            advice(Nutrition, "Stay hydrated with 8-10 glasses of water daily"),
            advice(Lifestyle, "Limit screen time before bed for better sleep quality"),
            advice(Medical, "Take medications as prescribed and track any side effects"),
        ],
    },
];

/// The rule table in evaluation order.
pub fn rules() -> &'static [Rule] {
    RULES
}
