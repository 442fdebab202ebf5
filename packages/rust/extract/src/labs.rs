//! Recent lab values, keyed by lab name and kept as the raw matched text.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

const NUM: &str = r"(\d+(?:\.\d+)?)";

/// Lab name and the pattern whose group 1 is the value.
static LAB_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    let sep = r"[:\s|=]+";
    [
        ("cholesterol", format!(r"\bcholesterol{sep}{NUM}")),
        ("glucose", format!(r"\bglucose{sep}{NUM}")),
        (
            "blood_pressure",
            format!(r"\b(?:blood pressure|bp){sep}(\d{{2,3}}/\d{{2,3}})"),
        ),
        (
            "hemoglobin",
            format!(r"\b(?:hemoglobin|haemoglobin|hgb|hb)\b{sep}{NUM}"),
        ),
        ("vitamin_d", format!(r"\bvitamin d3?\b{sep}{NUM}")),
        ("heart_rate", format!(r"\b(?:heart rate|pulse){sep}(\d{{2,3}})\b")),
        ("a1c", format!(r"\b(?:hba1c|a1c){sep}{NUM}")),
        ("bmi", format!(r"\b(?:bmi|body mass index){sep}{NUM}")),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(&pattern).expect("valid lab pattern")))
    .collect()
});

/// First value found for each known lab in lowercased text.
pub(crate) fn extract(text: &str) -> BTreeMap<String, String> {
    LAB_PATTERNS
        .iter()
        .filter_map(|(name, re)| {
            let value = re.captures(text)?.get(1)?.as_str();
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}
