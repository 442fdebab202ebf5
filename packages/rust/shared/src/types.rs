//! Core domain types for HealthDigest: profiles, goals, recommendations and reports.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{HealthDigestError, Result};

/// Current schema version for the report format.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Lowest goal priority (the default).
pub const MIN_GOAL_PRIORITY: u8 = 1;

/// Highest goal priority.
pub const MAX_GOAL_PRIORITY: u8 = 5;

// ---------------------------------------------------------------------------
// ReportId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for report identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(pub Uuid);

impl ReportId {
    /// Generate a new time-sortable report identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ReportId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ReportId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Structured medical data for one person.
///
/// Absent scalars are `None`; list fields are empty rather than absent.
/// Extraction builds a fresh value per document and merging builds a fresh
/// canonical value, so nothing mutates a profile after it is produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Age in years.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    /// Normalized sex/gender (`"Male"` / `"Female"` when extracted).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// Height in centimeters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f64>,
    /// Weight in kilograms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    /// Body-mass index, supplied explicitly or derived from height and weight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bmi: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub medications: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allergies: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dietary_restrictions: Vec<String>,
    /// Raw lab values keyed by lab name (no unit conversion).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub recent_labs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub goals: Vec<Goal>,
}

impl Profile {
    /// `true` when no field carries data.
    pub fn is_empty(&self) -> bool {
        self.populated_fields() == 0
    }

    /// Number of fields that carry data (used for logging summaries).
    pub fn populated_fields(&self) -> usize {
        [
            self.age.is_some(),
            self.gender.is_some(),
            self.height_cm.is_some(),
            self.weight_kg.is_some(),
            self.bmi.is_some(),
            !self.conditions.is_empty(),
            !self.medications.is_empty(),
            !self.allergies.is_empty(),
            !self.dietary_restrictions.is_empty(),
            !self.recent_labs.is_empty(),
            !self.goals.is_empty(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }

    /// Weight band for the current BMI, if known.
    pub fn bmi_category(&self) -> Option<BmiCategory> {
        self.bmi.map(BmiCategory::from_bmi)
    }

    /// Case-insensitive substring test against every condition.
    pub fn has_condition(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.conditions
            .iter()
            .any(|c| c.to_lowercase().contains(&needle))
    }

    /// Parse a lab value as a number. Non-numeric values yield `None`.
    pub fn lab_number(&self, name: &str) -> Option<f64> {
        self.recent_labs
            .get(name)
            .and_then(|raw| raw.trim().parse::<f64>().ok())
    }

    /// Deserialize a profile from JSON, tolerating a surrounding Markdown
    /// code fence (```` ```json ... ``` ````) as emitted by LLM combiners.
    pub fn from_json_lenient(raw: &str) -> Result<Self> {
        let cleaned = strip_code_fence(raw);
        serde_json::from_str(cleaned)
            .map_err(|e| HealthDigestError::parse(format!("invalid profile JSON: {e}")))
    }
}

/// Compute BMI from kilograms and centimeters.
///
/// Returns `None` for non-positive or non-finite height.
pub fn body_mass_index(weight_kg: f64, height_cm: f64) -> Option<f64> {
    if !height_cm.is_finite() || height_cm <= 0.0 || !weight_kg.is_finite() {
        return None;
    }
    let meters = height_cm / 100.0;
    Some(weight_kg / (meters * meters))
}

/// Remove a leading ```` ``` ```` / ```` ```json ```` fence and trailing fence.
fn strip_code_fence(raw: &str) -> &str {
    static OPEN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)^[`']{3}(?:json)?[ \t]*\r?\n?").expect("fence regex"));
    static CLOSE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\r?\n?[`']{3}$").expect("fence regex"));

    let mut s = raw.trim();
    if let Some(m) = OPEN_RE.find(s) {
        s = &s[m.end()..];
    }
    if let Some(m) = CLOSE_RE.find(s) {
        s = &s[..m.start()];
    }
    s.trim()
}

// ---------------------------------------------------------------------------
// BmiCategory
// ---------------------------------------------------------------------------

/// Standard adult BMI bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            Self::Underweight
        } else if bmi < 25.0 {
            Self::Normal
        } else if bmi < 30.0 {
            Self::Overweight
        } else {
            Self::Obese
        }
    }
}

impl std::fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Underweight => "Underweight",
            Self::Normal => "Normal",
            Self::Overweight => "Overweight",
            Self::Obese => "Obese",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// Goals
// ---------------------------------------------------------------------------

/// The closed set of health objectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GoalKind {
    WeightLoss,
    WeightGain,
    MuscleGain,
    GeneralHealth,
    DiseaseManagement,
    EnergyBoost,
}

impl GoalKind {
    /// Every goal kind, in declaration order.
    pub const ALL: [GoalKind; 6] = [
        Self::WeightLoss,
        Self::WeightGain,
        Self::MuscleGain,
        Self::GeneralHealth,
        Self::DiseaseManagement,
        Self::EnergyBoost,
    ];

    /// Stable kebab-case identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WeightLoss => "weight-loss",
            Self::WeightGain => "weight-gain",
            Self::MuscleGain => "muscle-gain",
            Self::GeneralHealth => "general-health",
            Self::DiseaseManagement => "disease-management",
            Self::EnergyBoost => "energy-boost",
        }
    }

    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::WeightLoss => "Weight Loss",
            Self::WeightGain => "Weight Gain",
            Self::MuscleGain => "Muscle Gain",
            Self::GeneralHealth => "General Health",
            Self::DiseaseManagement => "Disease Management",
            Self::EnergyBoost => "Energy Boost",
        }
    }
}

impl std::fmt::Display for GoalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GoalKind {
    type Err = HealthDigestError;

    /// Accepts `weight-loss`, `weight_loss` or `Weight Loss`.
    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_lowercase().replace(['_', ' '], "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == key)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(GoalKind::as_str).collect();
                HealthDigestError::parse(format!(
                    "unknown goal kind '{s}': expected one of {}",
                    known.join(", ")
                ))
            })
    }
}

fn default_priority() -> u8 {
    MIN_GOAL_PRIORITY
}

/// A health objective. Priority is display-only and never affects rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub kind: GoalKind,
    /// Optional numeric target (kilograms for weight goals).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,
    /// 1 (lowest, default) to 5.
    #[serde(default = "default_priority")]
    pub priority: u8,
}

impl Goal {
    /// A goal with no target and the lowest priority.
    pub fn new(kind: GoalKind) -> Self {
        Self {
            kind,
            target_value: None,
            target_date: None,
            priority: MIN_GOAL_PRIORITY,
        }
    }

    pub fn with_target_value(mut self, value: f64) -> Self {
        self.target_value = Some(value);
        self
    }

    pub fn with_target_date(mut self, date: NaiveDate) -> Self {
        self.target_date = Some(date);
        self
    }

    /// Set the priority, clamped to `1..=5`.
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority.clamp(MIN_GOAL_PRIORITY, MAX_GOAL_PRIORITY);
        self
    }
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

/// The five recommendation buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Nutrition,
    Exercise,
    Lifestyle,
    Medical,
    Monitoring,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Self::Nutrition,
        Self::Exercise,
        Self::Lifestyle,
        Self::Medical,
        Self::Monitoring,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nutrition => "nutrition",
            Self::Exercise => "exercise",
            Self::Lifestyle => "lifestyle",
            Self::Medical => "medical",
            Self::Monitoring => "monitoring",
        }
    }

    /// Capitalized heading text.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Nutrition => "Nutrition",
            Self::Exercise => "Exercise",
            Self::Lifestyle => "Lifestyle",
            Self::Medical => "Medical",
            Self::Monitoring => "Monitoring",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Categorized recommendation text.
///
/// Within a category, entries keep the order in which they were pushed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recommendations(BTreeMap<Category, Vec<String>>);

impl Recommendations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry to a category.
    pub fn push(&mut self, category: Category, text: impl Into<String>) {
        self.0.entry(category).or_default().push(text.into());
    }

    /// Entries for a category, if present.
    pub fn get(&self, category: Category) -> Option<&[String]> {
        self.0.get(&category).map(Vec::as_slice)
    }

    pub fn contains(&self, category: Category) -> bool {
        self.0.contains_key(&category)
    }

    /// Categories present, in fixed category order.
    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &[String])> + '_ {
        self.0.iter().map(|(c, items)| (*c, items.as_slice()))
    }

    /// Number of categories present.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of entries across categories.
    pub fn total_entries(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    /// Drop categories that ended up with no entries.
    pub fn prune_empty(&mut self) {
        self.0.retain(|_, items| !items.is_empty());
    }
}

// ---------------------------------------------------------------------------
// HealthReport
// ---------------------------------------------------------------------------

/// One analyzed input document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// File name or caller-supplied label.
    pub name: String,
    /// SHA-256 of the document text (hex).
    pub content_hash: String,
    /// Number of characters in the document text.
    pub char_count: usize,
    /// Profile extracted from this document alone.
    pub profile: Profile,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, text: &str, profile: Profile) -> Self {
        Self {
            name: name.into(),
            content_hash: content_hash(text),
            char_count: text.chars().count(),
            profile,
        }
    }
}

/// Hex SHA-256 of a text.
pub fn content_hash(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// The exported result of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// Schema version for forward compatibility.
    pub schema_version: u32,
    pub id: ReportId,
    pub generated_at: DateTime<Utc>,
    /// Tool version that produced the report.
    pub tool_version: String,
    /// Inputs, in upload order.
    pub sources: Vec<SourceDocument>,
    /// Canonical merged profile.
    pub profile: Profile,
    /// Goals the recommendation engine ran with.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub goals: Vec<Goal>,
    pub recommendations: Recommendations,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_id_roundtrip() {
        let id = ReportId::new();
        let parsed: ReportId = id.to_string().parse().expect("parse ReportId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn bmi_from_metric_inputs() {
        let bmi = body_mass_index(81.0, 180.0).expect("bmi");
        assert!((bmi - 25.0).abs() < 1e-9, "bmi={bmi}");
        assert_eq!(body_mass_index(70.0, 0.0), None);
    }

    #[test]
    fn bmi_category_bands() {
        assert_eq!(BmiCategory::from_bmi(17.9), BmiCategory::Underweight);
        assert_eq!(BmiCategory::from_bmi(18.5), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(27.0), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(32.9), BmiCategory::Obese);
        assert_eq!(BmiCategory::Obese.to_string(), "Obese");
    }

    #[test]
    fn goal_kind_parses_common_spellings() {
        assert_eq!("weight-loss".parse::<GoalKind>().unwrap(), GoalKind::WeightLoss);
        assert_eq!("muscle_gain".parse::<GoalKind>().unwrap(), GoalKind::MuscleGain);
        assert_eq!("Energy Boost".parse::<GoalKind>().unwrap(), GoalKind::EnergyBoost);

        let err = "flexibility".parse::<GoalKind>().unwrap_err();
        assert!(err.to_string().contains("unknown goal kind"));
    }

    #[test]
    fn goal_priority_is_clamped() {
        let goal = Goal::new(GoalKind::WeightLoss).with_priority(9);
        assert_eq!(goal.priority, MAX_GOAL_PRIORITY);
        let goal = Goal::new(GoalKind::WeightLoss).with_priority(0);
        assert_eq!(goal.priority, MIN_GOAL_PRIORITY);
    }

    #[test]
    fn goal_defaults_priority_when_missing_in_json() {
        let goal: Goal = serde_json::from_str(r#"{"kind":"energy-boost"}"#).expect("deserialize");
        assert_eq!(goal.kind, GoalKind::EnergyBoost);
        assert_eq!(goal.priority, MIN_GOAL_PRIORITY);
    }

    #[test]
    fn profile_json_omits_absent_fields() {
        let profile = Profile {
            age: Some(52),
            conditions: vec!["asthma".into()],
            ..Profile::default()
        };
        let json = serde_json::to_string(&profile).expect("serialize");
        assert_eq!(json, r#"{"age":52,"conditions":["asthma"]}"#);
        assert!(Profile::default().is_empty());
        assert_eq!(profile.populated_fields(), 2);
    }

    #[test]
    fn profile_from_fenced_json() {
        let raw = "```json\n{\"age\": 61, \"allergies\": [\"penicillin\"]}\n```";
        let profile = Profile::from_json_lenient(raw).expect("parse fenced");
        assert_eq!(profile.age, Some(61));
        assert_eq!(profile.allergies, vec!["penicillin".to_string()]);

        let plain = Profile::from_json_lenient(r#"{"gender":"Female"}"#).expect("parse plain");
        assert_eq!(plain.gender.as_deref(), Some("Female"));

        assert!(Profile::from_json_lenient("not json").is_err());
    }

    #[test]
    fn lab_number_skips_non_numeric() {
        let mut profile = Profile::default();
        profile.recent_labs.insert("cholesterol".into(), " 212 ".into());
        profile.recent_labs.insert("blood_pressure".into(), "130/85".into());
        assert_eq!(profile.lab_number("cholesterol"), Some(212.0));
        assert_eq!(profile.lab_number("blood_pressure"), None);
        assert_eq!(profile.lab_number("glucose"), None);
    }

    #[test]
    fn recommendations_serialize_as_category_map() {
        let mut recs = Recommendations::new();
        recs.push(Category::Medical, "Take medications as prescribed");
        recs.push(Category::Nutrition, "Stay hydrated");
        recs.push(Category::Nutrition, "Eat fiber");

        let json = serde_json::to_string(&recs).expect("serialize");
        assert_eq!(
            json,
            r#"{"nutrition":["Stay hydrated","Eat fiber"],"medical":["Take medications as prescribed"]}"#
        );

        let parsed: Recommendations = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, recs);
        assert_eq!(parsed.total_entries(), 3);
    }

    #[test]
    fn report_serialization() {
        let text = "Age: 40";
        let report = HealthReport {
            schema_version: CURRENT_SCHEMA_VERSION,
            id: ReportId::new(),
            generated_at: Utc::now(),
            tool_version: "0.1.0".into(),
            sources: vec![SourceDocument::new("exam.md", text, Profile::default())],
            profile: Profile::default(),
            goals: vec![Goal::new(GoalKind::MuscleGain)],
            recommendations: Recommendations::new(),
        };

        let json = serde_json::to_string_pretty(&report).expect("serialize");
        let parsed: HealthReport = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(parsed.sources[0].char_count, 7);
        assert_eq!(parsed.sources[0].content_hash.len(), 64);
        assert_eq!(parsed.goals.len(), 1);
    }
}
