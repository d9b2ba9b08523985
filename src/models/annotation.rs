//! Match average-rank annotations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Average-rank label recorded against a completed match.
///
/// Written by a background task after an average-rank request names a
/// match, so the annotation never blocks the response path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRankAnnotation {
    /// Upstream match identifier.
    pub match_id: String,

    /// Average rank label ("Gold II", or "Unranked").
    pub average: String,

    /// Number of parsable rank labels that entered the mean.
    pub sample_size: usize,

    /// When the annotation was written.
    pub recorded_at: DateTime<Utc>,
}

impl MatchRankAnnotation {
    pub fn new(match_id: String, average: String, sample_size: usize) -> Self {
        Self {
            match_id,
            average,
            sample_size,
            recorded_at: Utc::now(),
        }
    }
}
