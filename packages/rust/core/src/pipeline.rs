//! End-to-end `analyze` pipeline: documents → normalize → extract → merge → recommend → report.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use healthdigest_extract::Extractor;
use healthdigest_markdown::NormalizeOptions;
use healthdigest_shared::{
    AnalyzeConfig, CURRENT_SCHEMA_VERSION, Goal, HealthDigestError, HealthReport, Profile,
    ReportId, Result, SourceDocument,
};

use crate::merge::merge;
use crate::recommend::recommend;

/// One source document's text, in upload order.
#[derive(Debug, Clone)]
pub struct DocumentInput {
    /// File name or caller-supplied label.
    pub name: String,
    /// Text as returned by the document parser.
    pub text: String,
}

impl DocumentInput {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a document's profile has been extracted.
    fn document_extracted(&self, name: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, report: &HealthReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn document_extracted(&self, _name: &str, _current: usize, _total: usize) {}
    fn done(&self, _report: &HealthReport) {}
}

/// Read the given files and run the full pipeline over them.
///
/// Files are analyzed in the order given; an unreadable file fails the run.
#[instrument(skip_all, fields(files = paths.len()))]
pub async fn analyze_files(
    paths: &[PathBuf],
    config: &AnalyzeConfig,
    progress: &dyn ProgressReporter,
) -> Result<HealthReport> {
    if paths.is_empty() {
        return Err(HealthDigestError::validation("no input documents given"));
    }

    progress.phase("Reading documents");
    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| HealthDigestError::io(path, e))?;
        documents.push(DocumentInput::new(document_name(path), text));
    }

    analyze_documents(documents, config, progress).await
}

/// Run the full pipeline over in-memory documents.
///
/// 1. Normalize and extract each document on the blocking pool
/// 2. Merge per-document profiles in upload order
/// 3. Run the recommendation engine
/// 4. Assemble the report
#[instrument(skip_all, fields(documents = documents.len()))]
pub async fn analyze_documents(
    documents: Vec<DocumentInput>,
    config: &AnalyzeConfig,
    progress: &dyn ProgressReporter,
) -> Result<HealthReport> {
    let start = Instant::now();

    if documents.is_empty() {
        return Err(HealthDigestError::validation("no input documents given"));
    }

    // --- Phase 1: Normalize + extract ---
    progress.phase("Extracting fields");
    let extractor = extractor_for(config);
    let opts = normalize_options(config);

    let total = documents.len();
    let handles: Vec<_> = documents
        .into_iter()
        .map(|doc| {
            let opts = opts.clone();
            tokio::task::spawn_blocking(move || process_document(doc, &opts, &extractor))
        })
        .collect();

    // Awaiting in spawn order keeps upload order.
    let mut sources = Vec::with_capacity(total);
    for (i, handle) in handles.into_iter().enumerate() {
        match handle.await {
            Ok(source) => {
                progress.document_extracted(&source.name, i + 1, total);
                sources.push(source);
            }
            Err(e) => {
                warn!(index = i, error = %e, "extraction task failed, skipping document");
            }
        }
    }

    if sources.is_empty() {
        return Err(HealthDigestError::validation("no documents could be analyzed"));
    }

    // --- Phase 2: Merge ---
    progress.phase("Merging profiles");
    let profiles: Vec<Profile> = sources.iter().map(|s| s.profile.clone()).collect();
    let profile = merge(&profiles);

    // --- Phase 3: Recommend ---
    progress.phase("Building recommendations");
    let goals = effective_goals(&config.goals, &profile);
    let recommendations = recommend(&profile, &goals);

    let report = HealthReport {
        schema_version: CURRENT_SCHEMA_VERSION,
        id: ReportId::new(),
        generated_at: Utc::now(),
        tool_version: config.tool_version.clone(),
        sources,
        profile,
        goals,
        recommendations,
    };

    progress.done(&report);

    info!(
        report_id = %report.id,
        documents = report.sources.len(),
        fields = report.profile.populated_fields(),
        recommendations = report.recommendations.total_entries(),
        elapsed_ms = start.elapsed().as_millis(),
        "analyze pipeline complete"
    );

    Ok(report)
}

/// Normalize and extract a single document without merging or recommending.
pub fn extract_document(doc: DocumentInput, config: &AnalyzeConfig) -> SourceDocument {
    process_document(doc, &normalize_options(config), &extractor_for(config))
}

fn extractor_for(config: &AnalyzeConfig) -> Extractor {
    match config.reference_date {
        Some(date) => Extractor::with_reference_date(date),
        None => Extractor::new(),
    }
}

fn normalize_options(config: &AnalyzeConfig) -> NormalizeOptions {
    NormalizeOptions {
        include_marginalia: config.include_marginalia,
    }
}

/// Goals given by the caller win; otherwise the goals stated in the documents are used.
fn effective_goals(requested: &[Goal], profile: &Profile) -> Vec<Goal> {
    if requested.is_empty() {
        profile.goals.clone()
    } else {
        requested.to_vec()
    }
}

fn process_document(
    doc: DocumentInput,
    opts: &NormalizeOptions,
    extractor: &Extractor,
) -> SourceDocument {
    let text = match healthdigest_markdown::normalize(&doc.text, opts) {
        Ok(normalized) => normalized.text,
        Err(e) => {
            warn!(
                document = %doc.name,
                error = %e,
                "normalization failed, extracting from raw text"
            );
            doc.text.clone()
        }
    };

    let profile = extractor.extract(&text);
    debug!(
        document = %doc.name,
        fields = profile.populated_fields(),
        "document extracted"
    );

    SourceDocument::new(doc.name, &doc.text, profile)
}

fn document_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::NaiveDate;
    use healthdigest_shared::{Category, GoalKind};

    use super::*;

    fn fixtures_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures/documents")
    }

    fn config() -> AnalyzeConfig {
        AnalyzeConfig {
            goals: vec![],
            include_marginalia: false,
            tool_version: "test".to_string(),
            reference_date: NaiveDate::from_ymd_opt(2025, 6, 1),
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<String>>,
    }

    impl ProgressReporter for RecordingProgress {
        fn phase(&self, name: &str) {
            self.events.lock().unwrap().push(format!("phase:{name}"));
        }
        fn document_extracted(&self, name: &str, current: usize, total: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("doc:{name}:{current}/{total}"));
        }
        fn done(&self, _report: &HealthReport) {
            self.events.lock().unwrap().push("done".to_string());
        }
    }

    #[tokio::test]
    async fn analyzes_fixture_files_in_upload_order() {
        let dir = fixtures_dir();
        let paths = vec![
            dir.join("examination.md"),
            dir.join("nutrition.md"),
            dir.join("intake_form.md"),
        ];
        let progress = RecordingProgress::default();

        let report = analyze_files(&paths, &config(), &progress).await.unwrap();

        let names: Vec<&str> = report.sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["examination.md", "nutrition.md", "intake_form.md"]);

        // First-wins scalars come from the examination.
        assert_eq!(report.profile.age, Some(70));
        assert_eq!(report.profile.gender.as_deref(), Some("Male"));
        assert_eq!(report.profile.weight_kg, Some(95.0));

        // Lists are unioned across all three documents.
        assert!(report.profile.has_condition("type 2 diabetes"));
        assert!(report.profile.has_condition("high blood pressure"));
        assert!(report.profile.has_condition("migraine"));
        assert!(!report.profile.has_condition("asthma"));
        assert_eq!(report.profile.allergies, vec!["peanuts", "shellfish", "penicillin"]);

        // Last-wins labs: nutrition.md restates cholesterol.
        assert_eq!(
            report.profile.recent_labs.get("cholesterol").map(String::as_str),
            Some("215")
        );

        // No goals requested, so stated goals drive the engine.
        let kinds: Vec<GoalKind> = report.goals.iter().map(|g| g.kind).collect();
        assert_eq!(
            kinds,
            vec![
                GoalKind::WeightLoss,
                GoalKind::EnergyBoost,
                GoalKind::MuscleGain,
                GoalKind::GeneralHealth,
            ]
        );
        assert!(report.recommendations.contains(Category::Monitoring));

        let events = progress.events.lock().unwrap();
        assert_eq!(events.first().map(String::as_str), Some("phase:Reading documents"));
        assert!(events.contains(&"doc:nutrition.md:2/3".to_string()));
        assert_eq!(events.last().map(String::as_str), Some("done"));
    }

    #[tokio::test]
    async fn requested_goals_override_stated_goals() {
        let mut config = config();
        config.goals = vec![Goal::new(GoalKind::MuscleGain)];
        let docs = vec![DocumentInput::new("a.md", "Goals: lose 5 kg")];

        let report = analyze_documents(docs, &config, &SilentProgress).await.unwrap();

        assert_eq!(report.goals, vec![Goal::new(GoalKind::MuscleGain)]);
        assert_eq!(report.profile.goals[0].kind, GoalKind::WeightLoss);
        let exercise = report.recommendations.get(Category::Exercise).unwrap();
        assert_eq!(
            exercise,
            ["Focus on progressive resistance training 3-4 times per week"]
        );
    }

    #[tokio::test]
    async fn source_metadata_describes_raw_text() {
        let docs = vec![DocumentInput::new("exam", "Age: 40")];
        let report = analyze_documents(docs, &config(), &SilentProgress).await.unwrap();

        let source = &report.sources[0];
        assert_eq!(source.char_count, 7);
        assert_eq!(source.content_hash, healthdigest_shared::content_hash("Age: 40"));
        assert_eq!(source.profile.age, Some(40));
        assert_eq!(report.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(report.tool_version, "test");
    }

    #[test]
    fn extract_document_keeps_marginalia_when_asked() {
        let doc = DocumentInput::new("note.md", "<!-- Age: 33 -->\nWeight: 60 kg");

        let dropped = extract_document(doc.clone(), &config());
        assert_eq!(dropped.profile.age, None);

        let mut keep = config();
        keep.include_marginalia = true;
        let kept = extract_document(doc, &keep);
        assert_eq!(kept.profile.age, Some(33));
        assert_eq!(kept.profile.weight_kg, Some(60.0));
    }

    #[tokio::test]
    async fn empty_documents_still_get_baseline() {
        let docs = vec![DocumentInput::new("blank.md", "")];
        let report = analyze_documents(docs, &config(), &SilentProgress).await.unwrap();
        assert!(report.profile.is_empty());
        assert_eq!(report.recommendations.len(), 3);
    }

    #[tokio::test]
    async fn no_documents_is_validation_error() {
        let err = analyze_documents(vec![], &config(), &SilentProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, HealthDigestError::Validation { .. }));

        let err = analyze_files(&[], &config(), &SilentProgress).await.unwrap_err();
        assert!(matches!(err, HealthDigestError::Validation { .. }));
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let paths = vec![PathBuf::from("/nonexistent/exam.md")];
        let err = analyze_files(&paths, &config(), &SilentProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, HealthDigestError::Io { .. }));
    }
}
