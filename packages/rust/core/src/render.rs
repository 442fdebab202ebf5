//! Markdown rendering of profiles, recommendations and reports.

use std::fmt::Write;

use healthdigest_shared::{Category, Goal, HealthReport, Profile, Recommendations};

/// Render a profile as a standalone Markdown document.
pub fn render_profile(profile: &Profile) -> String {
    let mut md = String::new();
    profile_section(&mut md, profile, 1);
    md
}

/// Render recommendations as a standalone Markdown document.
pub fn render_recommendations(recs: &Recommendations) -> String {
    let mut md = String::new();
    recommendations_section(&mut md, recs, 1);
    md
}

/// Render a full analysis report.
pub fn render_report(report: &HealthReport) -> String {
    let mut md = String::from("# Health Report\n\n");

    let _ = writeln!(
        md,
        "Generated {} by healthdigest {} (report `{}`).\n",
        report.generated_at.format("%Y-%m-%d %H:%M UTC"),
        report.tool_version,
        report.id
    );

    if !report.sources.is_empty() {
        md.push_str("## Sources\n\n| Document | Characters | Fields found |\n| --- | --- | --- |\n");
        for source in &report.sources {
            let _ = writeln!(
                md,
                "| {} | {} | {} |",
                source.name.replace('|', "/"),
                source.char_count,
                source.profile.populated_fields()
            );
        }
        md.push('\n');
    }

    profile_section(&mut md, &report.profile, 2);
    md.push('\n');
    recommendations_section(&mut md, &report.recommendations, 2);
    md
}

fn heading(md: &mut String, level: usize, text: &str) {
    let _ = writeln!(md, "{} {text}\n", "#".repeat(level));
}

fn profile_section(md: &mut String, profile: &Profile, level: usize) {
    heading(md, level, "Patient Profile");

    if profile.is_empty() {
        md.push_str("_No data extracted._\n");
        return;
    }

    let metrics = metric_lines(profile);
    if !metrics.is_empty() {
        heading(md, level + 1, "Metrics");
        for line in metrics {
            let _ = writeln!(md, "- {line}");
        }
        md.push('\n');
    }

    for (title, items) in [
        ("Conditions", &profile.conditions),
        ("Medications", &profile.medications),
        ("Allergies", &profile.allergies),
        ("Dietary Restrictions", &profile.dietary_restrictions),
    ] {
        if items.is_empty() {
            continue;
        }
        heading(md, level + 1, title);
        for item in items {
            let _ = writeln!(md, "- {item}");
        }
        md.push('\n');
    }

    if !profile.recent_labs.is_empty() {
        heading(md, level + 1, "Recent Labs");
        md.push_str("| Lab | Value |\n| --- | --- |\n");
        for (name, value) in &profile.recent_labs {
            let _ = writeln!(md, "| {name} | {value} |");
        }
        md.push('\n');
    }

    if !profile.goals.is_empty() {
        heading(md, level + 1, "Goals");
        for goal in &profile.goals {
            let _ = writeln!(md, "- {}", goal_line(goal));
        }
        md.push('\n');
    }

    trim_trailing_blank(md);
}

fn metric_lines(profile: &Profile) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(age) = profile.age {
        lines.push(format!("**Age:** {age}"));
    }
    if let Some(gender) = &profile.gender {
        lines.push(format!("**Gender:** {gender}"));
    }
    if let Some(height) = profile.height_cm {
        lines.push(format!("**Height:** {height:.1} cm"));
    }
    if let Some(weight) = profile.weight_kg {
        lines.push(format!("**Weight:** {weight:.1} kg"));
    }
    if let (Some(bmi), Some(category)) = (profile.bmi, profile.bmi_category()) {
        lines.push(format!("**BMI:** {bmi:.1} ({category})"));
    }
    lines
}

fn goal_line(goal: &Goal) -> String {
    let mut line = format!(
        "{} {}",
        goal.kind.label(),
        "★".repeat(usize::from(goal.priority))
    );
    let target = match (goal.target_value, goal.target_date) {
        (Some(value), Some(date)) => Some(format!("target {value:.1} kg by {date}")),
        (Some(value), None) => Some(format!("target {value:.1} kg")),
        (None, Some(date)) => Some(format!("by {date}")),
        (None, None) => None,
    };
    if let Some(target) = target {
        let _ = write!(line, " ({target})");
    }
    line
}

fn recommendations_section(md: &mut String, recs: &Recommendations, level: usize) {
    heading(md, level, "Recommendations");

    if recs.is_empty() {
        md.push_str("_No recommendations._\n");
        return;
    }

    for category in Category::ALL {
        let items = recs.get(category).unwrap_or_default();
        if items.is_empty() {
            continue;
        }
        heading(md, level + 1, category.title());
        for item in items {
            let _ = writeln!(md, "- {item}");
        }
        md.push('\n');
    }

    trim_trailing_blank(md);
}

fn trim_trailing_blank(md: &mut String) {
    while md.ends_with("\n\n") {
        md.pop();
    }
}
