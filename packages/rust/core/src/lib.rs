//! Core analysis logic and pipeline orchestration for HealthDigest.
//!
//! This crate merges per-document profiles, evaluates the recommendation
//! rules, renders results as Markdown, and ties normalization and extraction
//! together into the end-to-end `analyze` workflow.

pub mod merge;
pub mod pipeline;
pub mod recommend;
pub mod render;
pub mod rules;

pub use merge::merge;
pub use recommend::recommend;
