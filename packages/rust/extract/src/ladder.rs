//! Ordered pattern ladders for scalar fields.
//!
//! A ladder holds matchers from most specific to most permissive. The first
//! matcher whose pattern occurs anywhere in the text decides the field, even
//! when its conversion then rejects the value.

use chrono::NaiveDate;
use regex::{Captures, Regex};
use tracing::trace;

/// Inputs a matcher may need besides the captures.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MatchContext {
    /// Date used to turn a birth year into an age.
    pub today: NaiveDate,
}

/// Turns a successful match into a field value.
pub(crate) type Convert<T> = fn(&Captures<'_>, &MatchContext) -> Option<T>;

/// One rung of a ladder.
pub(crate) struct ScalarMatcher<T> {
    name: &'static str,
    regex: Regex,
    convert: Convert<T>,
}

impl<T> ScalarMatcher<T> {
    pub(crate) fn new(name: &'static str, pattern: &str, convert: Convert<T>) -> Self {
        Self {
            name,
            regex: Regex::new(pattern).expect("valid ladder pattern"),
            convert,
        }
    }
}

/// Matchers for one field, in priority order.
pub(crate) struct PatternLadder<T> {
    field: &'static str,
    matchers: Vec<ScalarMatcher<T>>,
}

impl<T: std::fmt::Debug> PatternLadder<T> {
    pub(crate) fn new(field: &'static str, matchers: Vec<ScalarMatcher<T>>) -> Self {
        Self { field, matchers }
    }

    /// Evaluate matchers in order and stop at the first one that matches.
    pub(crate) fn evaluate(&self, text: &str, ctx: &MatchContext) -> Option<T> {
        for matcher in &self.matchers {
            if let Some(caps) = matcher.regex.captures(text) {
                let value = (matcher.convert)(&caps, ctx);
                trace!(field = self.field, matcher = matcher.name, ?value, "ladder matched");
                return value;
            }
        }
        None
    }

    /// Name of the first matcher that fires.
    #[cfg(test)]
    pub(crate) fn winning_matcher(&self, text: &str) -> Option<&'static str> {
        self.matchers
            .iter()
            .find(|m| m.regex.is_match(text))
            .map(|m| m.name)
    }
}

/// Parse capture group `idx` as a float.
pub(crate) fn number(caps: &Captures<'_>, idx: usize) -> Option<f64> {
    caps.get(idx)?.as_str().trim().parse::<f64>().ok()
}
