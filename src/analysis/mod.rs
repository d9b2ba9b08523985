//! AI-assisted match analysis.
//!
//! A [`TextGenerator`] turns a prompt into prose:
//! - Local: Ollama (default)
//! - Remote: OpenAI (feature-flagged)
//!
//! Generated analyses are cached on disk keyed by match fingerprint, so
//! a match is only ever analyzed once per prompt revision.

pub mod cache;
pub mod generator;

use thiserror::Error;

pub use cache::AnalysisCache;
pub use generator::{create_generator, GeneratorConfig, TextGenerator};

/// Errors that can occur while generating analysis text.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Generator backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Generator response unparseable: {0}")]
    ResponseParse(String),
}
