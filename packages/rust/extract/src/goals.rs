//! Goal statements written in the document (`goals: lose 10 kg by 2025-12-31`).

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use healthdigest_shared::{Goal, GoalKind};

use crate::segments::{self, label_regex};

const KG_PER_POUND: f64 = 0.453_592;

static GOAL_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    label_regex(r"\b(?:(?:health|fitness|weight|personal|patient) )?(?:goals?|objectives?)[ \t]*:")
});

static TARGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d+(?:\.\d+)?)\s*(kgs?|kilograms?|lbs?|pounds?)\b").expect("valid regex")
});

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b").expect("valid regex"));

static SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[,;]").expect("valid regex"));

/// Goals stated in lowercased text, one per kind, first statement wins.
pub(crate) fn extract(text: &str) -> Vec<Goal> {
    let mut goals: Vec<Goal> = Vec::new();

    for segment in segments::capture(&GOAL_LABEL_RE, text) {
        for statement in SPLIT_RE.split(segment.text) {
            let statement = statement.trim_matches(|c: char| c.is_whitespace() || "|*_.".contains(c));
            if statement.chars().count() <= 2 {
                continue;
            }
            let goal = parse_statement(statement);
            if !goals.iter().any(|g| g.kind == goal.kind) {
                goals.push(goal);
            }
        }
    }

    goals
}

fn parse_statement(statement: &str) -> Goal {
    let mut goal = Goal::new(classify(statement));

    if let Some(caps) = TARGET_RE.captures(statement) {
        if let Ok(amount) = caps[1].parse::<f64>() {
            let kg = if caps[2].starts_with('k') {
                amount
            } else {
                amount * KG_PER_POUND
            };
            goal = goal.with_target_value(kg);
        }
    }

    if let Some(date) = DATE_RE
        .captures(statement)
        .and_then(|c| NaiveDate::parse_from_str(&c[1], "%Y-%m-%d").ok())
    {
        goal = goal.with_target_date(date);
    }

    goal
}

/// Map a free-text goal onto a goal kind by keyword.
pub fn classify(statement: &str) -> GoalKind {
    let s = statement.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| s.contains(w));

    if has(&["lose", "loss", "slim", "reduce weight", "drop"]) {
        GoalKind::WeightLoss
    } else if has(&["gain weight", "weight gain", "put on weight", "gain"]) && !s.contains("muscle") {
        GoalKind::WeightGain
    } else if has(&["muscle", "strength", "bulk"]) {
        GoalKind::MuscleGain
    } else if has(&["energy", "fatigue", "tired"]) {
        GoalKind::EnergyBoost
    } else if has(&["manage", "control", "blood sugar", "a1c", "blood pressure"]) {
        GoalKind::DiseaseManagement
    } else {
        GoalKind::GeneralHealth
    }
}
