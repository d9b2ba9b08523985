//! Leaderboard row model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rank::{self, Division, Tier};

use super::Region;

/// One player's row on a regional ladder.
///
/// Keyed by `(region, player_id)`; the refresh job and the seeder are the
/// only writers. `rank_value` is the authoritative sort key and is always
/// derived from the tier/division/LP triple at construction time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Opaque upstream account identifier.
    pub player_id: String,

    /// Display name.
    pub game_name: String,

    /// Tag shown after the display name.
    pub tag_line: String,

    /// Region partition this row belongs to.
    pub region: Region,

    /// Current tier.
    pub tier: Tier,

    /// Current division; apex rows conventionally carry I.
    pub division: Division,

    /// League points within the tier/division.
    pub league_points: u32,

    /// Ranked wins this season.
    pub wins: u32,

    /// Ranked losses this season.
    pub losses: u32,

    /// Composite ladder sort key (codec score widened with LP).
    pub rank_value: i64,

    /// When this row was last upserted.
    pub updated_at: DateTime<Utc>,
}

impl LeaderboardEntry {
    /// Build a row, deriving `rank_value` from the rank triple.
    pub fn new(
        player_id: String,
        region: Region,
        tier: Tier,
        division: Division,
        league_points: u32,
        wins: u32,
        losses: u32,
    ) -> Self {
        let division = if tier.is_apex() { Division::I } else { division };
        let rank_value = rank::rank_value(rank::score(tier, division), league_points);

        Self {
            player_id,
            game_name: String::new(),
            tag_line: String::new(),
            region,
            tier,
            division,
            league_points,
            wins,
            losses,
            rank_value,
            updated_at: Utc::now(),
        }
    }

    /// Builder method to set the display identity.
    pub fn with_identity(mut self, game_name: String, tag_line: String) -> Self {
        self.game_name = game_name;
        self.tag_line = tag_line;
        self
    }

    /// Human-facing rank label ("Gold II"; apex tiers omit the division).
    pub fn rank_label(&self) -> String {
        if self.tier.is_apex() {
            self.tier.to_string()
        } else {
            format!("{} {}", self.tier, self.division)
        }
    }

    /// Win rate over played games, 0.0 when none were played.
    pub fn winrate(&self) -> f64 {
        let total = self.wins + self.losses;
        if total == 0 {
            0.0
        } else {
            self.wins as f64 / total as f64
        }
    }
}
