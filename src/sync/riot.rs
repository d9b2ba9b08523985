//! Upstream ladder endpoints.
//!
//! [`LadderSource`] is the seam between the refresh pipeline and the
//! upstream ranked API. Errors cross it as [`FetchError`] so rate-limit
//! outcomes keep their retry-after payload whichever implementation sits
//! behind the trait: the real HTTP endpoints in production, a scripted
//! mock in tests.

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::fetch::{FetchClient, FetchError};
use crate::models::Region;
use crate::rank::{Division, Tier};

/// Ranked queue all ladder reads target.
const QUEUE: &str = "RANKED_SOLO_5x5";

/// One ladder entry as the upstream wire format reports it.
///
/// Paged entry listings carry a per-entry tier; apex league lists omit
/// it (the league wrapper names the tier instead).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireLeagueEntry {
    pub summoner_id: String,
    #[serde(default)]
    pub tier: Option<String>,
    pub rank: String,
    pub league_points: u32,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
}

/// Apex league wrapper object.
#[derive(Debug, Clone, Deserialize)]
pub struct WireLeagueList {
    pub tier: String,
    pub entries: Vec<WireLeagueEntry>,
}

/// Resolved account record for one player.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSummoner {
    pub id: String,
    pub puuid: String,
    #[serde(default)]
    pub name: String,
}

/// Read access to the upstream ranked ladder.
#[async_trait]
pub trait LadderSource: Send + Sync {
    /// Full league list for one apex tier.
    async fn apex_league(&self, region: Region, tier: Tier) -> Result<WireLeagueList, FetchError>;

    /// One page of a non-apex tier/division listing. Pages are 1-based;
    /// an empty page means the division is exhausted.
    async fn entries_page(
        &self,
        region: Region,
        tier: Tier,
        division: Division,
        page: u32,
    ) -> Result<Vec<WireLeagueEntry>, FetchError>;

    /// Resolve one player's account record by their ladder id.
    async fn summoner(&self, region: Region, summoner_id: &str)
        -> Result<WireSummoner, FetchError>;
}

/// Ladder source backed by the real upstream HTTP endpoints.
pub struct RiotLadderSource {
    client: FetchClient,
}

impl RiotLadderSource {
    pub fn new(client: FetchClient) -> Self {
        Self { client }
    }

    fn endpoint(&self, region: Region, path: &str) -> Result<Url, FetchError> {
        Ok(Url::parse(&format!(
            "https://{}{}",
            region.platform_host(),
            path
        ))?)
    }
}

#[async_trait]
impl LadderSource for RiotLadderSource {
    async fn apex_league(&self, region: Region, tier: Tier) -> Result<WireLeagueList, FetchError> {
        debug_assert!(tier.is_apex());

        let league = match tier {
            Tier::Challenger => "challengerleagues",
            Tier::Grandmaster => "grandmasterleagues",
            _ => "masterleagues",
        };
        let url = self.endpoint(
            region,
            &format!("/lol/league/v4/{}/by-queue/{}", league, QUEUE),
        )?;

        self.client.get_json(&url).await
    }

    async fn entries_page(
        &self,
        region: Region,
        tier: Tier,
        division: Division,
        page: u32,
    ) -> Result<Vec<WireLeagueEntry>, FetchError> {
        let url = self.endpoint(
            region,
            &format!(
                "/lol/league/v4/entries/{}/{}/{}?page={}",
                QUEUE,
                tier.as_str(),
                division,
                page
            ),
        )?;

        self.client.get_json(&url).await
    }

    async fn summoner(
        &self,
        region: Region,
        summoner_id: &str,
    ) -> Result<WireSummoner, FetchError> {
        let url = self.endpoint(region, &format!("/lol/summoner/v4/summoners/{}", summoner_id))?;

        self.client.get_json(&url).await
    }
}

/// Scripted ladder source for tests.
///
/// Serves canned apex lists and entry pages, and can be told to report
/// specific players as missing or to rate-limit their lookups a fixed
/// number of times before succeeding.
#[cfg(test)]
pub struct MockLadderSource {
    apex: std::collections::HashMap<Tier, Vec<WireLeagueEntry>>,
    pages: std::collections::HashMap<(Tier, Division), Vec<Vec<WireLeagueEntry>>>,
    missing: std::collections::HashSet<String>,
    rate_limit_budget: std::sync::Mutex<std::collections::HashMap<String, u32>>,
    summoner_delay: Option<std::time::Duration>,
    summoner_calls: std::sync::atomic::AtomicU32,
}

#[cfg(test)]
impl MockLadderSource {
    pub fn new() -> Self {
        Self {
            apex: std::collections::HashMap::new(),
            pages: std::collections::HashMap::new(),
            missing: std::collections::HashSet::new(),
            rate_limit_budget: std::sync::Mutex::new(std::collections::HashMap::new()),
            summoner_delay: None,
            summoner_calls: std::sync::atomic::AtomicU32::new(0),
        }
    }

    pub fn with_apex(mut self, tier: Tier, entries: Vec<WireLeagueEntry>) -> Self {
        self.apex.insert(tier, entries);
        self
    }

    /// Append one page to a tier/division listing; pages serve in the
    /// order they were added.
    pub fn with_page(mut self, tier: Tier, division: Division, entries: Vec<WireLeagueEntry>) -> Self {
        self.pages.entry((tier, division)).or_default().push(entries);
        self
    }

    pub fn with_missing(mut self, summoner_id: &str) -> Self {
        self.missing.insert(summoner_id.to_string());
        self
    }

    /// Rate-limit the next `count` lookups of this player.
    pub fn with_rate_limits(self, summoner_id: &str, count: u32) -> Self {
        self.rate_limit_budget
            .lock()
            .unwrap()
            .insert(summoner_id.to_string(), count);
        self
    }

    pub fn with_summoner_delay(mut self, delay: std::time::Duration) -> Self {
        self.summoner_delay = Some(delay);
        self
    }

    pub fn summoner_calls(&self) -> u32 {
        self.summoner_calls.load(std::sync::atomic::Ordering::Relaxed)
    }
}

#[cfg(test)]
#[async_trait]
impl LadderSource for MockLadderSource {
    async fn apex_league(&self, _region: Region, tier: Tier) -> Result<WireLeagueList, FetchError> {
        Ok(WireLeagueList {
            tier: tier.as_str().to_string(),
            entries: self.apex.get(&tier).cloned().unwrap_or_default(),
        })
    }

    async fn entries_page(
        &self,
        _region: Region,
        tier: Tier,
        division: Division,
        page: u32,
    ) -> Result<Vec<WireLeagueEntry>, FetchError> {
        Ok(self
            .pages
            .get(&(tier, division))
            .and_then(|pages| pages.get((page - 1) as usize))
            .cloned()
            .unwrap_or_default())
    }

    async fn summoner(
        &self,
        _region: Region,
        summoner_id: &str,
    ) -> Result<WireSummoner, FetchError> {
        self.summoner_calls
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);

        if let Some(delay) = self.summoner_delay {
            tokio::time::sleep(delay).await;
        }

        if self.missing.contains(summoner_id) {
            return Err(FetchError::NotFound);
        }

        {
            let mut budget = self.rate_limit_budget.lock().unwrap();
            if let Some(remaining) = budget.get_mut(summoner_id) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(FetchError::RateLimited {
                        retry_after_secs: 0,
                    });
                }
            }
        }

        Ok(WireSummoner {
            id: summoner_id.to_string(),
            puuid: format!("puuid-{}", summoner_id),
            name: format!("Player {}", summoner_id),
        })
    }
}

/// Build a wire entry the way paged listings report them.
#[cfg(test)]
pub fn wire_entry(summoner_id: &str, rank: &str, league_points: u32) -> WireLeagueEntry {
    WireLeagueEntry {
        summoner_id: summoner_id.to_string(),
        tier: None,
        rank: rank.to_string(),
        league_points,
        wins: 60,
        losses: 40,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paged_entry_deserialization() {
        let json = r#"{
            "leagueId": "abc-123",
            "queueType": "RANKED_SOLO_5x5",
            "tier": "GOLD",
            "rank": "II",
            "summonerId": "enc-summoner-1",
            "leaguePoints": 75,
            "wins": 120,
            "losses": 110,
            "veteran": false,
            "inactive": false,
            "freshBlood": true,
            "hotStreak": false
        }"#;

        let entry: WireLeagueEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.summoner_id, "enc-summoner-1");
        assert_eq!(entry.tier.as_deref(), Some("GOLD"));
        assert_eq!(entry.rank, "II");
        assert_eq!(entry.league_points, 75);
        assert_eq!(entry.wins, 120);
    }

    #[test]
    fn test_apex_list_entries_have_no_tier() {
        let json = r#"{
            "leagueId": "chall-league",
            "tier": "CHALLENGER",
            "name": "Fizz's Scouts",
            "queue": "RANKED_SOLO_5x5",
            "entries": [
                {"summonerId": "s1", "rank": "I", "leaguePoints": 1203, "wins": 400, "losses": 300}
            ]
        }"#;

        let list: WireLeagueList = serde_json::from_str(json).unwrap();
        assert_eq!(list.tier, "CHALLENGER");
        assert_eq!(list.entries.len(), 1);
        assert!(list.entries[0].tier.is_none());
        assert_eq!(list.entries[0].league_points, 1203);
    }

    #[test]
    fn test_summoner_deserialization_without_name() {
        // Newer upstream revisions drop the display name entirely.
        let json = r#"{"id": "enc-1", "puuid": "puuid-1", "profileIconId": 4568, "summonerLevel": 311}"#;

        let summoner: WireSummoner = serde_json::from_str(json).unwrap();
        assert_eq!(summoner.id, "enc-1");
        assert_eq!(summoner.puuid, "puuid-1");
        assert!(summoner.name.is_empty());
    }

    #[tokio::test]
    async fn test_mock_pages_serve_in_order() {
        let source = MockLadderSource::new()
            .with_page(Tier::Gold, Division::Iv, vec![wire_entry("a", "IV", 10)])
            .with_page(Tier::Gold, Division::Iv, vec![wire_entry("b", "IV", 20)]);

        let first = source
            .entries_page(Region::Euw, Tier::Gold, Division::Iv, 1)
            .await
            .unwrap();
        let second = source
            .entries_page(Region::Euw, Tier::Gold, Division::Iv, 2)
            .await
            .unwrap();
        let third = source
            .entries_page(Region::Euw, Tier::Gold, Division::Iv, 3)
            .await
            .unwrap();

        assert_eq!(first[0].summoner_id, "a");
        assert_eq!(second[0].summoner_id, "b");
        assert!(third.is_empty());
    }

    #[tokio::test]
    async fn test_mock_rate_limit_budget_depletes() {
        let source = MockLadderSource::new().with_rate_limits("s1", 2);

        for _ in 0..2 {
            let err = source.summoner(Region::Euw, "s1").await.unwrap_err();
            assert!(matches!(err, FetchError::RateLimited { .. }));
        }

        let resolved = source.summoner(Region::Euw, "s1").await.unwrap();
        assert_eq!(resolved.puuid, "puuid-s1");
        assert_eq!(source.summoner_calls(), 3);
    }
}
