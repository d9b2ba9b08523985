//! # Ladder Tracker
//!
//! A local ranked-ladder leaderboard tracker with AI-powered match analysis.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (leaderboard entries, regions, annotations)
//! - **rank**: Tier/division codec and rank averaging
//! - **fetch**: Rate-limit-aware upstream API client
//! - **storage**: Filesystem data lake operations (JSONL journals)
//! - **sync**: Ladder refresh orchestration
//! - **analysis**: Match analysis generation with versioned caching
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod analysis;
pub mod api;
pub mod config;
pub mod fetch;
pub mod limiter;
pub mod models;
pub mod rank;
pub mod seed;
pub mod storage;
pub mod sync;

pub use models::*;

use std::time::Duration;

/// Parse a human-friendly duration string (e.g., "6h", "30m", "90s").
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('h') {
        (n, 3600)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else {
        // Default to seconds
        (s, 1)
    };

    let num: u64 = num_str.parse().ok()?;
    Some(Duration::from_secs(num * multiplier))
}
