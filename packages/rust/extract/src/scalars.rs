//! Ladders for the scalar profile fields: age, gender, height, weight, BMI.
//!
//! All patterns run against lowercased text.

use std::sync::LazyLock;

use chrono::Datelike;

use crate::ladder::{MatchContext, PatternLadder, ScalarMatcher, number};

/// Ages above this are treated as misreads.
const MAX_PLAUSIBLE_AGE: u32 = 130;

const CM_PER_FOOT: f64 = 30.48;
const CM_PER_INCH: f64 = 2.54;
const KG_PER_POUND: f64 = 0.453_592;

pub(crate) static AGE: LazyLock<PatternLadder<u32>> = LazyLock::new(|| {
    PatternLadder::new(
        "age",
        vec![
            ScalarMatcher::new("labelled", r"\bage\s*:\s*(\d{1,3})\b", plausible_age),
            ScalarMatcher::new(
                "years_old",
                r"\b(\d{1,3})[\s-]*(?:years?|yrs?)[\s-]*old\b",
                plausible_age,
            ),
            ScalarMatcher::new("yo", r"\b(\d{1,3})\s*(?:y/o|yo)\b", plausible_age),
            ScalarMatcher::new("loose_label", r"\bage[\s:]*(\d{1,3})\b", plausible_age),
            ScalarMatcher::new(
                "birth_year",
                r"\b(?:dob|d\.o\.b\.?|date of birth|born)\b[^\n]*?\b(\d{4})\b",
                age_from_birth_year,
            ),
        ],
    )
});

pub(crate) static GENDER: LazyLock<PatternLadder<String>> = LazyLock::new(|| {
    PatternLadder::new(
        "gender",
        vec![
            ScalarMatcher::new(
                "labelled",
                r"\b(?:gender|sex)[:\s]+(male|female|m|f)\b",
                normalize_gender,
            ),
            ScalarMatcher::new("bare_word", r"\b(male|female|man|woman)\b", normalize_gender),
            ScalarMatcher::new(
                "pronoun",
                r"\bpatient\b[^\n]*?\b(he|she|his|her)\b",
                normalize_gender,
            ),
        ],
    )
});

pub(crate) static HEIGHT: LazyLock<PatternLadder<f64>> = LazyLock::new(|| {
    PatternLadder::new(
        "height",
        vec![
            ScalarMatcher::new(
                "labelled_cm",
                r"\bheight[:\s|]+(\d+(?:\.\d+)?)\s*(?:cm|centimet(?:er|re)s?)\b",
                |c, _| number(c, 1),
            ),
            ScalarMatcher::new(
                "labelled_feet_inches",
                r#"\bheight[:\s|]+(\d)\s*(?:'|ft\.?|feet|foot)\s*(?:(\d{1,2}(?:\.\d+)?)\s*(?:"|''|in\b\.?|inch(?:es)?\b)?)?"#,
                feet_inches_to_cm,
            ),
            ScalarMatcher::new(
                "labelled_meters",
                r"\bheight[:\s|]+(\d(?:\.\d+)?)\s*(?:m|meters?|metres?)\b",
                |c, _| number(c, 1).map(|m| m * 100.0),
            ),
            ScalarMatcher::new("bare_cm", r"\b(\d+(?:\.\d+)?)\s*cm\b", |c, _| number(c, 1)),
            ScalarMatcher::new(
                "bare_feet_inches",
                r#"\b(\d)\s*'\s*(\d{1,2}(?:\.\d+)?)\s*(?:"|'')"#,
                feet_inches_to_cm,
            ),
            ScalarMatcher::new(
                "labelled_number",
                r"\bheight\b[^\d\n]*(\d+(?:\.\d+)?)",
                |c, _| number(c, 1),
            ),
        ],
    )
});

pub(crate) static WEIGHT: LazyLock<PatternLadder<f64>> = LazyLock::new(|| {
    PatternLadder::new(
        "weight",
        vec![
            ScalarMatcher::new(
                "labelled_kg",
                r"\bweight[:\s|]+(\d+(?:\.\d+)?)\s*(?:kgs?|kilograms?)\b",
                |c, _| number(c, 1),
            ),
            ScalarMatcher::new(
                "labelled_lb",
                r"\bweight[:\s|]+(\d+(?:\.\d+)?)\s*(?:lbs?|pounds?)\b",
                pounds_to_kg,
            ),
            ScalarMatcher::new(
                "bare_kg",
                r"\b(\d+(?:\.\d+)?)\s*(?:kgs?|kilograms?)\b",
                |c, _| number(c, 1),
            ),
            ScalarMatcher::new("bare_lb", r"\b(\d+(?:\.\d+)?)\s*(?:lbs?|pounds?)\b", pounds_to_kg),
            ScalarMatcher::new(
                "labelled_number",
                r"\bweight\b[^\d\n]*(\d+(?:\.\d+)?)",
                |c, _| number(c, 1),
            ),
        ],
    )
});

pub(crate) static BMI: LazyLock<PatternLadder<f64>> = LazyLock::new(|| {
    PatternLadder::new(
        "bmi",
        vec![ScalarMatcher::new(
            "labelled",
            r"\b(?:bmi|body mass index)[:\s|=]+(\d+(?:\.\d+)?)",
            |c, _| number(c, 1),
        )],
    )
});

fn plausible_age(caps: &regex::Captures<'_>, _: &MatchContext) -> Option<u32> {
    let age: u32 = caps.get(1)?.as_str().parse().ok()?;
    (age <= MAX_PLAUSIBLE_AGE).then_some(age)
}

fn age_from_birth_year(caps: &regex::Captures<'_>, ctx: &MatchContext) -> Option<u32> {
    let year: i32 = caps.get(1)?.as_str().parse().ok()?;
    let age = u32::try_from(ctx.today.year() - year).ok()?;
    (age <= MAX_PLAUSIBLE_AGE).then_some(age)
}

fn normalize_gender(caps: &regex::Captures<'_>, _: &MatchContext) -> Option<String> {
    match caps.get(1)?.as_str() {
        "male" | "m" | "man" | "he" | "his" => Some("Male".to_string()),
        "female" | "f" | "woman" | "she" | "her" => Some("Female".to_string()),
        _ => None,
    }
}

fn feet_inches_to_cm(caps: &regex::Captures<'_>, _: &MatchContext) -> Option<f64> {
    let feet = number(caps, 1)?;
    let inches = match caps.get(2) {
        Some(_) => number(caps, 2)?,
        None => 0.0,
    };
    Some(feet * CM_PER_FOOT + inches * CM_PER_INCH)
}

fn pounds_to_kg(caps: &regex::Captures<'_>, _: &MatchContext) -> Option<f64> {
    number(caps, 1).map(|lb| lb * KG_PER_POUND)
}
