//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use healthdigest_core::pipeline::{self, DocumentInput, ProgressReporter};
use healthdigest_core::{recommend, render};
use healthdigest_shared::{
    AnalyzeConfig, AppConfig, Goal, GoalKind, HealthReport, MAX_GOAL_PRIORITY, MIN_GOAL_PRIORITY,
    OutputFormat, Profile, init_config, load_config,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// HealthDigest: turn medical documents into a profile and personalized recommendations.
#[derive(Parser)]
#[command(
    name = "healthdigest",
    version,
    about = "Extract a structured health profile from medical documents and suggest next steps.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Analyze documents: extract, merge, and recommend.
    Analyze {
        /// Parsed document text files, in upload order.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Goal kind (e.g. weight-loss) or a free-text goal. Repeatable, in priority order.
        #[arg(short, long = "goal", value_parser = parse_goal)]
        goals: Vec<Goal>,

        /// Output format: markdown or json (defaults to config).
        #[arg(short, long)]
        format: Option<OutputFormat>,

        /// Write the report to this file instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Keep the text of parser marginalia comments.
        #[arg(long)]
        include_marginalia: bool,
    },

    /// Extract the profile from a single document.
    Extract {
        /// Parsed document text file.
        file: PathBuf,

        /// Output format: markdown or json (defaults to config).
        #[arg(short, long)]
        format: Option<OutputFormat>,

        /// Keep the text of parser marginalia comments.
        #[arg(long)]
        include_marginalia: bool,
    },

    /// Run the recommendation engine on a saved profile JSON.
    Recommend {
        /// Profile JSON file (a surrounding ```json fence is accepted).
        #[arg(long)]
        profile: PathBuf,

        /// Goal kind or free-text goal. Repeatable, in priority order.
        #[arg(short, long = "goal", value_parser = parse_goal)]
        goals: Vec<Goal>,

        /// Output format: markdown or json (defaults to config).
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

/// Parse `--goal`: `KIND[:PRIORITY]`, or free text classified by keyword.
fn parse_goal(raw: &str) -> std::result::Result<Goal, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("goal must not be empty".to_string());
    }
    let free_text = raw.contains(char::is_whitespace);
    if let Some((kind, priority)) = raw.rsplit_once(':').filter(|_| !free_text) {
        let kind = kind.parse::<GoalKind>().map_err(|e| e.to_string())?;
        let priority = priority
            .trim()
            .parse::<u8>()
            .map_err(|_| format!("invalid goal priority '{priority}'"))?;
        if !(MIN_GOAL_PRIORITY..=MAX_GOAL_PRIORITY).contains(&priority) {
            return Err(format!(
                "goal priority must be between {MIN_GOAL_PRIORITY} and {MAX_GOAL_PRIORITY}"
            ));
        }
        return Ok(Goal::new(kind).with_priority(priority));
    }
    match raw.parse::<GoalKind>() {
        Ok(kind) => Ok(Goal::new(kind)),
        Err(_) if free_text => {
            Ok(Goal::new(healthdigest_extract::classify_goal(raw)))
        }
        Err(e) => Err(e.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "healthdigest=info",
        1 => "healthdigest=debug",
        _ => "healthdigest=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Analyze {
            files,
            goals,
            format,
            out,
            include_marginalia,
        } => cmd_analyze(&files, goals, format, out.as_deref(), include_marginalia).await,
        Command::Extract {
            file,
            format,
            include_marginalia,
        } => cmd_extract(&file, format, include_marginalia).await,
        Command::Recommend {
            profile,
            goals,
            format,
        } => cmd_recommend(&profile, goals, format).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

/// Merge config-file values with command-line flags. Flags win.
fn analyze_config(
    app: &AppConfig,
    goals: Vec<Goal>,
    include_marginalia: bool,
) -> AnalyzeConfig {
    let mut config = AnalyzeConfig::from(app);
    config.tool_version = env!("CARGO_PKG_VERSION").to_string();
    if !goals.is_empty() {
        config.goals = goals;
    }
    config.include_marginalia |= include_marginalia;
    config
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_analyze(
    files: &[PathBuf],
    goals: Vec<Goal>,
    format: Option<OutputFormat>,
    out: Option<&Path>,
    include_marginalia: bool,
) -> Result<()> {
    let app = load_config()?;
    let config = analyze_config(&app, goals, include_marginalia);
    let format = format.unwrap_or(app.defaults.output_format);

    info!(
        files = files.len(),
        goals = config.goals.len(),
        %format,
        "analyzing documents"
    );

    let reporter = CliProgress::new();
    let report = pipeline::analyze_files(files, &config, &reporter).await?;

    let rendered = match format {
        OutputFormat::Json => to_json(&report)?,
        OutputFormat::Markdown => render::render_report(&report),
    };

    match out {
        Some(path) => {
            tokio::fs::write(path, rendered)
                .await
                .wrap_err_with(|| format!("failed to write report to {}", path.display()))?;
            print_summary(&report, path);
        }
        None => print!("{rendered}"),
    }

    Ok(())
}

fn print_summary(report: &HealthReport, path: &Path) {
    println!();
    println!("  Report written!");
    println!("  ID:              {}", report.id);
    println!("  Documents:       {}", report.sources.len());
    println!("  Profile fields:  {}", report.profile.populated_fields());
    println!("  Recommendations: {}", report.recommendations.total_entries());
    println!("  Path:            {}", path.display());
    println!();
}

async fn cmd_extract(
    file: &Path,
    format: Option<OutputFormat>,
    include_marginalia: bool,
) -> Result<()> {
    let app = load_config()?;
    let config = analyze_config(&app, Vec::new(), include_marginalia);
    let format = format.unwrap_or(app.defaults.output_format);

    let text = tokio::fs::read_to_string(file)
        .await
        .wrap_err_with(|| format!("failed to read {}", file.display()))?;
    let name = file.display().to_string();

    let source = tokio::task::spawn_blocking(move || {
        pipeline::extract_document(DocumentInput::new(name, text), &config)
    })
    .await?;

    info!(
        document = %source.name,
        fields = source.profile.populated_fields(),
        "profile extracted"
    );

    match format {
        OutputFormat::Json => println!("{}", to_json(&source.profile)?),
        OutputFormat::Markdown => print!("{}", render::render_profile(&source.profile)),
    }

    Ok(())
}

async fn cmd_recommend(
    profile_path: &Path,
    goals: Vec<Goal>,
    format: Option<OutputFormat>,
) -> Result<()> {
    let app = load_config()?;
    let config = analyze_config(&app, goals, false);
    let format = format.unwrap_or(app.defaults.output_format);

    let raw = tokio::fs::read_to_string(profile_path)
        .await
        .wrap_err_with(|| format!("failed to read {}", profile_path.display()))?;
    let profile = Profile::from_json_lenient(&raw)?;

    let goals = if config.goals.is_empty() {
        profile.goals.clone()
    } else {
        config.goals
    };
    let recs = recommend(&profile, &goals);

    info!(
        goals = goals.len(),
        categories = recs.len(),
        "recommendations built"
    );

    match format {
        OutputFormat::Json => println!("{}", to_json(&recs)?),
        OutputFormat::Markdown => print!("{}", render::render_recommendations(&recs)),
    }

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| eyre!("JSON serialization failed: {e}"))
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .expect("valid spinner template")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn document_extracted(&self, name: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Extracted [{current}/{total}] {name}"));
    }

    fn done(&self, _report: &HealthReport) {
        self.spinner.finish_and_clear();
    }
}
