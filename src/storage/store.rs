//! Leaderboard store over per-region JSONL journals.
//!
//! A row upsert is a journal append; readers keep the **last** line per
//! player, which makes re-writing a player's row idempotent without any
//! read-modify-write cycle. Every read operation collapses the journal
//! into one deduplicated snapshot sorted by `(rank_value desc,
//! player_id asc)`, a strict total order, so pages and windows are
//! deterministic for a fixed journal state.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;

use tracing::{debug, info};

use crate::models::{LeaderboardEntry, Region};
use crate::rank::{RankError, Tier};

use super::cursor::{decode_cursor, encode_cursor};
use super::jsonl::{JsonlReader, JsonlWriter};
use super::{StorageConfig, StorageError};

/// Tier partition selector for paged reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierFilter {
    All,
    Only(Tier),
}

impl TierFilter {
    fn matches(&self, entry: &LeaderboardEntry) -> bool {
        match self {
            TierFilter::All => true,
            TierFilter::Only(tier) => entry.tier == *tier,
        }
    }
}

impl FromStr for TierFilter {
    type Err = RankError;

    /// `"ALL"` (any case) selects everything; anything else must parse
    /// as a tier name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            Ok(TierFilter::All)
        } else {
            Ok(TierFilter::Only(s.parse()?))
        }
    }
}

/// One page of a region's ladder, best rank first.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LeaderboardPage {
    pub entries: Vec<LeaderboardEntry>,
    /// Opaque token resuming after the last row; absent on the final page.
    pub next_cursor: Option<String>,
    /// Row count of the whole filtered partition, not just this page.
    pub total_players: usize,
}

/// Ladder ordering: higher `rank_value` first, ties broken by ascending
/// player id so equal-rank rows still have one canonical order.
fn compare_entries(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.rank_value
        .cmp(&a.rank_value)
        .then_with(|| a.player_id.cmp(&b.player_id))
}

/// True when `entry` sits strictly after the cursor position in ladder
/// order.
fn after_position(entry: &LeaderboardEntry, rank_value: i64, player_id: &str) -> bool {
    match entry.rank_value.cmp(&rank_value) {
        Ordering::Less => true,
        Ordering::Greater => false,
        Ordering::Equal => entry.player_id.as_str() > player_id,
    }
}

/// Append-only leaderboard store.
#[derive(Clone)]
pub struct LeaderboardStore {
    config: StorageConfig,
}

impl LeaderboardStore {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    fn writer(&self, region: Region) -> JsonlWriter<LeaderboardEntry> {
        JsonlWriter::new(self.config.region_journal(region))
    }

    fn reader(&self, region: Region) -> JsonlReader<LeaderboardEntry> {
        JsonlReader::new(self.config.region_journal(region))
    }

    /// Deduplicated, fully sorted snapshot of one region's ladder.
    ///
    /// Exactly one journal read per call; public operations slice this
    /// snapshot, so each of them is point-in-time consistent even while
    /// a refresh is appending concurrently.
    fn snapshot(&self, region: Region) -> Result<Vec<LeaderboardEntry>, StorageError> {
        let rows = self.reader(region).read_all()?;

        let mut latest: HashMap<String, LeaderboardEntry> = HashMap::with_capacity(rows.len());
        for row in rows {
            latest.insert(row.player_id.clone(), row);
        }

        let mut entries: Vec<LeaderboardEntry> = latest.into_values().collect();
        entries.sort_by(compare_entries);
        Ok(entries)
    }

    /// Upsert one row. Re-upserting the same player replaces their row
    /// on the next read; different players never contend.
    pub fn upsert(&self, entry: &LeaderboardEntry) -> Result<(), StorageError> {
        self.writer(entry.region).append(entry)
    }

    /// Upsert a batch, grouping appends by region journal. Returns the
    /// number of rows written.
    pub fn upsert_batch(&self, entries: &[LeaderboardEntry]) -> Result<usize, StorageError> {
        if entries.is_empty() {
            return Ok(0);
        }

        let mut by_region: HashMap<Region, Vec<LeaderboardEntry>> = HashMap::new();
        for entry in entries {
            by_region.entry(entry.region).or_default().push(entry.clone());
        }

        let mut written = 0;
        for (region, group) in by_region {
            written += self.writer(region).append_batch(&group)?;
        }

        Ok(written)
    }

    /// One page of the region ladder.
    ///
    /// The cursor is decoded before the journal is read, so a malformed
    /// token is rejected without touching the filesystem. Rows strictly
    /// after the cursor position are returned, at most `limit` of them;
    /// `next_cursor` is present iff rows remain beyond this page.
    pub fn page(
        &self,
        region: Region,
        filter: TierFilter,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<LeaderboardPage, StorageError> {
        let position = cursor.map(decode_cursor).transpose()?;

        let filtered: Vec<LeaderboardEntry> = self
            .snapshot(region)?
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect();
        let total_players = filtered.len();

        let start = match &position {
            Some((rank_value, player_id)) => filtered
                .iter()
                .position(|e| after_position(e, *rank_value, player_id))
                .unwrap_or(total_players),
            None => 0,
        };

        let end = (start + limit).min(total_players);
        let entries = filtered[start..end].to_vec();

        let next_cursor = if end < total_players {
            entries
                .last()
                .map(|e| encode_cursor(e.rank_value, &e.player_id))
        } else {
            None
        };

        Ok(LeaderboardPage {
            entries,
            next_cursor,
            total_players,
        })
    }

    /// Window of rows centered on a player in the unfiltered region
    /// order: up to `window` neighbors on each side, clamped at the
    /// ladder edges. An absent player is an error, never an empty Ok.
    pub fn surrounding(
        &self,
        region: Region,
        player_id: &str,
        window: usize,
    ) -> Result<Vec<LeaderboardEntry>, StorageError> {
        let snapshot = self.snapshot(region)?;

        let index = snapshot
            .iter()
            .position(|e| e.player_id == player_id)
            .ok_or_else(|| StorageError::PlayerNotFound {
                region,
                player_id: player_id.to_string(),
            })?;

        let start = index.saturating_sub(window);
        let end = (index + window + 1).min(snapshot.len());

        Ok(snapshot[start..end].to_vec())
    }

    /// Drop every row for a region. Returns the deduplicated row count
    /// that was discarded.
    pub fn reset(&self, region: Region) -> Result<usize, StorageError> {
        let cleared = self.count(region)?;
        self.writer(region).write_all(&[])?;

        info!("Reset {} leaderboard, dropped {} rows", region, cleared);
        Ok(cleared)
    }

    /// Rewrite a region journal down to its deduplicated snapshot.
    ///
    /// Refresh runs call this at the end of each region pass so journal
    /// size tracks the ladder instead of the append history.
    pub fn compact(&self, region: Region) -> Result<usize, StorageError> {
        let raw_lines = self.reader(region).count()?;
        let snapshot = self.snapshot(region)?;
        let kept = self.writer(region).write_all(&snapshot)?;

        debug!(
            "Compacted {} journal: {} lines down to {} rows",
            region, raw_lines, kept
        );
        Ok(kept)
    }

    /// Deduplicated row count for a region.
    pub fn count(&self, region: Region) -> Result<usize, StorageError> {
        Ok(self.snapshot(region)?.len())
    }
}
