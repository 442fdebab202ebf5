//! Shared types, error model, and configuration for HealthDigest.
//!
//! This crate is the foundation depended on by all other HealthDigest crates.
//! It provides:
//! - [`HealthDigestError`], the unified error type
//! - Domain types ([`Profile`], [`Goal`], [`Recommendations`], [`HealthReport`])
//! - Configuration ([`AppConfig`], [`AnalyzeConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AnalyzeConfig, AppConfig, DefaultsConfig, ExtractionConfig, OutputFormat, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{HealthDigestError, Result};
pub use types::{
    BmiCategory, CURRENT_SCHEMA_VERSION, Category, Goal, GoalKind, HealthReport,
    MAX_GOAL_PRIORITY, MIN_GOAL_PRIORITY, Profile, Recommendations, ReportId, SourceDocument,
    body_mass_index, content_hash,
};
