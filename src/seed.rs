//! Synthetic ladder data for local development.

use tracing::info;
use uuid::Uuid;

use crate::models::{LeaderboardEntry, Region};
use crate::rank::{self, Division, Tier};
use crate::storage::{LeaderboardStore, StorageError};

/// Display names given to synthetic rows, cycled with a numeric suffix.
const NAME_POOL: [&str; 10] = [
    "Blue Sentinel",
    "Red Buff Enjoyer",
    "Mid Or Feed",
    "Ward Bot",
    "Baron Thief",
    "Dragon Soul",
    "Flash On F",
    "Scaling Merchant",
    "Roam Timer",
    "Peel Machine",
];

/// Insert `players` synthetic rows into one region's ladder.
///
/// Rows are spread over the whole rank scale, best first, so pagination
/// and tier filters have something to chew on. Ids are fresh on every
/// call; reseeding adds rows rather than replacing them, and `reset`
/// clears them again.
pub fn seed_region(
    store: &LeaderboardStore,
    region: Region,
    players: usize,
) -> Result<usize, StorageError> {
    let entries: Vec<LeaderboardEntry> =
        (0..players).map(|i| synthetic_entry(region, i)).collect();
    let written = store.upsert_batch(&entries)?;

    info!("Seeded {} with {} synthetic players", region, written);
    Ok(written)
}

/// Deterministic rank spread: index 0 lands in Challenger, then each
/// index steps one codec position down the scale, wrapping at Iron IV.
fn synthetic_entry(region: Region, i: usize) -> LeaderboardEntry {
    let top = rank::score(Tier::Challenger, Division::I);
    let codec = top - (i as u32 % (top + 1));
    let (tier, division) = rank::decode(codec);

    let league_points = if tier.is_apex() {
        (i as u32 * 131) % 1400
    } else {
        (i as u32 * 13) % 100
    };
    let wins = 40 + (i as u32 * 7) % 60;
    let losses = 35 + (i as u32 * 5) % 50;

    let name = format!("{} {}", NAME_POOL[i % NAME_POOL.len()], i + 1);

    LeaderboardEntry::new(
        Uuid::new_v4().to_string(),
        region,
        tier,
        division,
        league_points,
        wins,
        losses,
    )
    .with_identity(name, region.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{StorageConfig, TierFilter};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn test_store(tmp: &TempDir) -> LeaderboardStore {
        LeaderboardStore::new(StorageConfig::new(tmp.path().to_path_buf()))
    }

    #[test]
    fn test_seed_spreads_over_the_scale() {
        let tmp = TempDir::new().unwrap();
        let store = test_store(&tmp);

        let written = seed_region(&store, Region::Euw, 40).unwrap();
        assert_eq!(written, 40);

        let page = store.page(Region::Euw, TierFilter::All, None, 100).unwrap();
        assert_eq!(page.total_players, 40);

        assert!(page.entries.iter().any(|e| e.tier == Tier::Challenger));
        assert!(page.entries.iter().any(|e| e.tier == Tier::Iron));

        let values: Vec<i64> = page.entries.iter().map(|e| e.rank_value).collect();
        let mut sorted = values.clone();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(values, sorted);
    }

    #[test]
    fn test_seed_is_additive() {
        let tmp = TempDir::new().unwrap();
        let store = test_store(&tmp);

        seed_region(&store, Region::Kr, 5).unwrap();
        seed_region(&store, Region::Kr, 5).unwrap();

        assert_eq!(store.count(Region::Kr).unwrap(), 10);
    }

    #[test]
    fn test_seed_only_touches_the_requested_region() {
        let tmp = TempDir::new().unwrap();
        let store = test_store(&tmp);

        seed_region(&store, Region::Na, 3).unwrap();

        assert_eq!(store.count(Region::Na).unwrap(), 3);
        assert_eq!(store.count(Region::Euw).unwrap(), 0);
    }

    #[test]
    fn test_synthetic_identity_fields() {
        let entry = synthetic_entry(Region::Kr, 0);

        assert_eq!(entry.tier, Tier::Challenger);
        assert_eq!(entry.tag_line, "KR");
        assert!(entry.game_name.ends_with(" 1"));
        assert!(!entry.player_id.is_empty());
    }
}
