//! Filesystem persistence.
//!
//! Everything this service stores lives under one data directory:
//! - Per-region leaderboard journals (JSONL, append-only)
//! - Analysis cache entries (one JSON file per fingerprint)
//! - Match average-rank annotations (JSONL)

use std::path::PathBuf;
use thiserror::Error;

use crate::models::Region;

mod cursor;
mod jsonl;
mod store;

pub use cursor::{decode_cursor, encode_cursor};
pub use jsonl::{JsonlReader, JsonlWriter};
pub use store::{LeaderboardPage, LeaderboardStore, TierFilter};

/// Errors that can occur during storage operations.
///
/// `Io`/`Json` mean the store itself is unavailable, and the serving
/// layer surfaces them distinctly from an empty result so an outage
/// never masquerades as an empty leaderboard.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid cursor")]
    InvalidCursor,

    #[error("player {player_id} has no leaderboard row in {region}")]
    PlayerNotFound { region: Region, player_id: String },
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn leaderboard_dir(&self) -> PathBuf {
        self.data_dir.join("leaderboard")
    }

    /// Journal file for one region's ladder.
    pub fn region_journal(&self, region: Region) -> PathBuf {
        self.leaderboard_dir()
            .join(format!("{}.jsonl", region.as_str().to_lowercase()))
    }

    pub fn analysis_dir(&self) -> PathBuf {
        self.data_dir.join("analysis")
    }

    pub fn annotations_path(&self) -> PathBuf {
        self.data_dir.join("annotations").join("match_ranks.jsonl")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}
