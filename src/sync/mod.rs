//! Periodic ladder refresh.
//!
//! The orchestrator walks every configured region top-down: the three
//! apex league lists first, then paged tier/division listings from
//! Diamond I downward until a division runs dry or the per-region cap
//! is hit. Collected rows are resolved to account records through a
//! bounded fan-out, upserted into the store as they resolve, and the
//! region journal is compacted at the end of each pass.
//!
//! One player failing to resolve never fails the run; those failures
//! are collected and reported. Storage failures do fail the run, since
//! continuing would silently drop everything that follows.

pub mod riot;

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::{interval, sleep};
use tracing::{debug, error, info, warn};

use crate::fetch::FetchError;
use crate::limiter::{map_bounded, LimiterError};
use crate::models::{LeaderboardEntry, Region};
use crate::rank::{Division, Tier};
use crate::storage::{LeaderboardStore, StorageError};
use riot::{LadderSource, WireLeagueEntry};

/// Apex tiers served as whole league lists, best first.
const APEX_TIERS: [Tier; 3] = [Tier::Challenger, Tier::Grandmaster, Tier::Master];

/// Division walk order within a non-apex tier, best first.
const DIVISIONS: [Division; 4] = [Division::I, Division::Ii, Division::Iii, Division::Iv];

/// Errors that can occur during a refresh run.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Limiter error: {0}")]
    Limiter(#[from] LimiterError),

    #[error("No regions configured")]
    NoRegions,

    #[error("A refresh is already running")]
    AlreadyRunning,

    #[error("Refresh cancelled")]
    Cancelled,
}

/// Configuration for refresh runs.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Regions to walk, in order.
    pub regions: Vec<Region>,

    /// Pause between periodic runs.
    pub interval: Duration,

    /// Concurrent account lookups per region.
    pub fan_out: usize,

    /// Nominal upstream page length; a shorter page ends its division.
    pub page_size: usize,

    /// Hard page stop per division, whatever the pages report.
    pub max_pages_per_division: u32,

    /// Most ladder rows collected per region in one pass.
    pub ladder_cap: usize,

    /// Tries per upstream call before a rate limit becomes an error.
    pub max_item_attempts: u32,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            regions: vec![Region::Euw],
            interval: Duration::from_secs(3600), // 1 hour
            fan_out: 5,
            page_size: 205,
            max_pages_per_division: 10,
            ladder_cap: 10_000,
            max_item_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RefreshStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

/// Running counters, updated as regions finish.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshProgress {
    pub regions_done: u32,
    pub players_upserted: u32,
    pub players_skipped: u32,
    pub rate_limited_hits: u32,
    pub message: String,
}

/// State of the refresh pipeline, readable while a run is in flight.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshState {
    /// When the last run started
    pub started_at: Option<DateTime<Utc>>,

    /// When the last run completed
    pub completed_at: Option<DateTime<Utc>>,

    /// Last run status
    pub status: RefreshStatus,

    /// Counters for the current or last run
    pub progress: RefreshProgress,

    /// Errors encountered
    pub errors: Vec<String>,
}

/// Result of one completed refresh run.
#[derive(Debug, Clone)]
pub struct RefreshResult {
    pub regions_done: u32,
    pub players_upserted: u32,
    pub players_skipped: u32,
    pub rate_limited_hits: u32,
    pub errors: Vec<String>,
    pub duration: Duration,
}

/// A collected ladder row tagged with the tier the walk found it
/// under. Apex list entries carry no per-entry tier of their own.
#[derive(Debug, Clone)]
struct TaggedEntry {
    tier: Tier,
    wire: WireLeagueEntry,
}

enum ItemOutcome {
    Upserted,
    Skipped,
}

enum ItemError {
    Fetch { summoner_id: String, error: FetchError },
    Storage(StorageError),
}

/// Per-region counters folded into the run totals.
#[derive(Debug, Default)]
struct RegionTally {
    upserted: u32,
    skipped: u32,
    rate_limited_hits: u32,
    errors: Vec<String>,
}

/// Run one upstream call, backing off and resubmitting on rate limits.
///
/// Every rate-limited response counts one hit and sleeps the advertised
/// delay before the next try; after `max_attempts` tries the last
/// rate-limit error is returned as-is. Any other outcome returns
/// immediately.
async fn retry_rate_limited<T, F, Fut>(
    max_attempts: u32,
    hits: &AtomicU32,
    mut call: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 1;
    loop {
        match call().await {
            Err(FetchError::RateLimited { retry_after_secs }) => {
                hits.fetch_add(1, Ordering::Relaxed);
                if attempt >= max_attempts {
                    return Err(FetchError::RateLimited { retry_after_secs });
                }
                debug!(
                    "Rate limited (attempt {}/{}), resubmitting in {}s",
                    attempt, max_attempts, retry_after_secs
                );
                sleep(Duration::from_secs(retry_after_secs)).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}

/// Refresh orchestrator.
pub struct RefreshOrchestrator {
    config: RefreshConfig,
    source: Arc<dyn LadderSource>,
    store: LeaderboardStore,
    state: Arc<RwLock<RefreshState>>,
    cancel_token: Arc<RwLock<bool>>,
}

impl RefreshOrchestrator {
    /// Create a new refresh orchestrator.
    pub fn new(
        config: RefreshConfig,
        source: Arc<dyn LadderSource>,
        store: LeaderboardStore,
    ) -> Self {
        Self {
            config,
            source,
            store,
            state: Arc::new(RwLock::new(RefreshState::default())),
            cancel_token: Arc::new(RwLock::new(false)),
        }
    }

    /// Get current refresh state.
    pub async fn state(&self) -> RefreshState {
        self.state.read().await.clone()
    }

    /// Check if a refresh is currently running.
    pub async fn is_running(&self) -> bool {
        self.state.read().await.status == RefreshStatus::Running
    }

    /// Stop the periodic loop and abandon the current run between
    /// regions.
    pub async fn cancel(&self) {
        *self.cancel_token.write().await = true;
    }

    /// Run a single refresh pass over all configured regions.
    pub async fn sync_once(&self) -> Result<RefreshResult, RefreshError> {
        if self.config.regions.is_empty() {
            return Err(RefreshError::NoRegions);
        }
        self.begin_run(false).await?;
        self.run_marked().await
    }

    /// Begin a manual refresh in the background (for the API endpoint).
    /// Refuses to start while another run is in flight; the returned
    /// snapshot is already marked Running.
    pub async fn trigger(self: &Arc<Self>) -> Result<RefreshState, RefreshError> {
        if self.config.regions.is_empty() {
            return Err(RefreshError::NoRegions);
        }
        self.begin_run(true).await?;
        let snapshot = self.state().await;

        let this = self.clone();
        tokio::spawn(async move {
            if let Err(e) = this.run_marked().await {
                error!("Manual refresh failed: {}", e);
            }
        });

        Ok(snapshot)
    }

    /// Run periodic refreshes in the background until cancelled.
    pub async fn run_periodic(self: Arc<Self>) {
        let mut ticker = interval(self.config.interval);

        info!(
            "Starting periodic ladder refresh every {:?} for {} regions",
            self.config.interval,
            self.config.regions.len()
        );

        loop {
            ticker.tick().await;

            if *self.cancel_token.read().await {
                info!("Periodic ladder refresh stopped");
                break;
            }

            match self.sync_once().await {
                Ok(result) => {
                    info!(
                        "Periodic refresh completed: {} upserted, {} skipped across {} regions in {:?}",
                        result.players_upserted,
                        result.players_skipped,
                        result.regions_done,
                        result.duration
                    );
                }
                Err(RefreshError::Cancelled) => {
                    info!("Periodic ladder refresh cancelled");
                    break;
                }
                Err(e) => {
                    error!("Periodic refresh failed: {}", e);
                }
            }
        }
    }

    /// Flip state to Running. With `exclusive`, an in-flight run is
    /// left untouched and reported instead; the check and the flip
    /// happen under one write lock.
    async fn begin_run(&self, exclusive: bool) -> Result<(), RefreshError> {
        let mut state = self.state.write().await;
        if exclusive && state.status == RefreshStatus::Running {
            warn!("Refresh already in progress");
            return Err(RefreshError::AlreadyRunning);
        }
        state.status = RefreshStatus::Running;
        state.started_at = Some(Utc::now());
        state.completed_at = None;
        state.progress = RefreshProgress::default();
        state.errors.clear();
        Ok(())
    }

    async fn fail_run(&self, message: String) {
        let mut state = self.state.write().await;
        state.status = RefreshStatus::Failed;
        state.completed_at = Some(Utc::now());
        state.errors.push(message);
    }

    async fn run_marked(&self) -> Result<RefreshResult, RefreshError> {
        // Reset cancel token
        *self.cancel_token.write().await = false;

        let start = Instant::now();
        info!(
            "Starting ladder refresh for {} regions",
            self.config.regions.len()
        );

        let mut totals = RegionTally::default();
        let mut regions_done = 0u32;

        for &region in &self.config.regions {
            if *self.cancel_token.read().await {
                warn!("Ladder refresh cancelled after {} regions", regions_done);
                self.fail_run("refresh cancelled".to_string()).await;
                return Err(RefreshError::Cancelled);
            }

            let tally = match self.sync_region(region).await {
                Ok(tally) => tally,
                Err(e) => {
                    error!("Ladder refresh failed in {}: {}", region, e);
                    self.fail_run(e.to_string()).await;
                    return Err(e);
                }
            };

            totals.upserted += tally.upserted;
            totals.skipped += tally.skipped;
            totals.rate_limited_hits += tally.rate_limited_hits;
            totals.errors.extend(tally.errors);
            regions_done += 1;

            let mut state = self.state.write().await;
            state.progress.regions_done = regions_done;
            state.progress.players_upserted = totals.upserted;
            state.progress.players_skipped = totals.skipped;
            state.progress.rate_limited_hits = totals.rate_limited_hits;
            state.progress.message = format!(
                "{} of {} regions refreshed",
                regions_done,
                self.config.regions.len()
            );
        }

        let duration = start.elapsed();

        // Update final state
        {
            let mut state = self.state.write().await;
            state.completed_at = Some(Utc::now());
            state.status = if totals.errors.is_empty() {
                RefreshStatus::Completed
            } else {
                RefreshStatus::Failed
            };
            state.errors = totals.errors.clone();
        }

        info!(
            "Ladder refresh finished: {} upserted, {} skipped, {} rate-limit hits, {} errors in {:?}",
            totals.upserted,
            totals.skipped,
            totals.rate_limited_hits,
            totals.errors.len(),
            duration
        );

        Ok(RefreshResult {
            regions_done,
            players_upserted: totals.upserted,
            players_skipped: totals.skipped,
            rate_limited_hits: totals.rate_limited_hits,
            errors: totals.errors,
            duration,
        })
    }

    /// Refresh a single region's ladder.
    async fn sync_region(&self, region: Region) -> Result<RegionTally, RefreshError> {
        info!("Refreshing {} ladder", region);

        let mut errors = Vec::new();
        let hits = AtomicU32::new(0);

        let raw = self.collect_ladder(region, &hits, &mut errors).await;
        let collected = raw.len();
        debug!("Collected {} ladder rows for {}", collected, region);

        {
            let mut state = self.state.write().await;
            state.progress.message = format!("resolving {} players for {}", collected, region);
        }

        let results = map_bounded(raw, self.config.fan_out, |item| {
            let hits = &hits;
            async move { self.resolve_item(region, item, hits).await }
        })
        .await?;

        let mut upserted = 0u32;
        let mut skipped = 0u32;
        for result in results {
            match result {
                Ok(ItemOutcome::Upserted) => upserted += 1,
                Ok(ItemOutcome::Skipped) => skipped += 1,
                Err(ItemError::Storage(e)) => return Err(e.into()),
                Err(ItemError::Fetch { summoner_id, error }) => {
                    errors.push(format!("{} {}: {}", region, summoner_id, error));
                }
            }
        }

        // Journals grow by one line per upsert; fold them back down.
        if let Err(e) = self.store.compact(region) {
            warn!("Compaction failed for {}: {}", region, e);
        }

        Ok(RegionTally {
            upserted,
            skipped,
            rate_limited_hits: hits.load(Ordering::Relaxed),
            errors,
        })
    }

    /// Walk one region's ladder top-down and collect raw rows.
    ///
    /// Endpoint failures that survive the rate-limit retries are
    /// recorded and the walk moves on, so one dead division cannot
    /// blank out the whole region.
    async fn collect_ladder(
        &self,
        region: Region,
        hits: &AtomicU32,
        errors: &mut Vec<String>,
    ) -> Vec<TaggedEntry> {
        let cap = self.config.ladder_cap;
        let mut raw: Vec<TaggedEntry> = Vec::new();

        for tier in APEX_TIERS {
            let fetched = retry_rate_limited(self.config.max_item_attempts, hits, || {
                self.source.apex_league(region, tier)
            })
            .await;

            match fetched {
                Ok(list) => {
                    debug!("{} {}: {} entries", region, tier.as_str(), list.entries.len());
                    raw.extend(list.entries.into_iter().map(|wire| TaggedEntry { tier, wire }));
                }
                Err(e) => errors.push(format!("{} {} league: {}", region, tier.as_str(), e)),
            }
        }

        raw.truncate(cap);
        if raw.len() == cap {
            info!("Ladder cap {} reached for {}, stopping collection", cap, region);
            return raw;
        }

        'walk: for tier in Tier::ALL.iter().rev().copied().filter(|t| !t.is_apex()) {
            for division in DIVISIONS {
                for page in 1..=self.config.max_pages_per_division {
                    let fetched = retry_rate_limited(self.config.max_item_attempts, hits, || {
                        self.source.entries_page(region, tier, division, page)
                    })
                    .await;

                    let batch = match fetched {
                        Ok(batch) => batch,
                        Err(e) => {
                            errors.push(format!(
                                "{} {} {} page {}: {}",
                                region,
                                tier.as_str(),
                                division,
                                page,
                                e
                            ));
                            break;
                        }
                    };

                    if batch.is_empty() {
                        break;
                    }

                    let short_page = batch.len() < self.config.page_size;
                    raw.extend(batch.into_iter().map(|wire| TaggedEntry { tier, wire }));

                    if raw.len() >= cap {
                        raw.truncate(cap);
                        info!("Ladder cap {} reached for {}, stopping collection", cap, region);
                        break 'walk;
                    }
                    if short_page {
                        break;
                    }
                }
            }
        }

        raw
    }

    /// Resolve one collected row into a stored entry.
    ///
    /// A missing account record means the player has no profile this
    /// season; that is a skip, not an error. Unrecognized tier or
    /// division strings are upstream schema drift and also skip the
    /// row, with a warning.
    async fn resolve_item(
        &self,
        region: Region,
        item: TaggedEntry,
        hits: &AtomicU32,
    ) -> Result<ItemOutcome, ItemError> {
        let tier = match item.wire.tier.as_deref() {
            Some(reported) => match reported.parse::<Tier>() {
                Ok(tier) => tier,
                Err(e) => {
                    warn!("Skipping {} in {}: {}", item.wire.summoner_id, region, e);
                    return Ok(ItemOutcome::Skipped);
                }
            },
            None => item.tier,
        };

        let division = if tier.is_apex() {
            Division::I
        } else {
            match item.wire.rank.parse::<Division>() {
                Ok(division) => division,
                Err(e) => {
                    warn!("Skipping {} in {}: {}", item.wire.summoner_id, region, e);
                    return Ok(ItemOutcome::Skipped);
                }
            }
        };

        let lookup = retry_rate_limited(self.config.max_item_attempts, hits, || {
            self.source.summoner(region, &item.wire.summoner_id)
        })
        .await;

        let summoner = match lookup {
            Ok(summoner) => summoner,
            Err(FetchError::NotFound) => {
                debug!(
                    "No account record for {} in {}, skipping",
                    item.wire.summoner_id, region
                );
                return Ok(ItemOutcome::Skipped);
            }
            Err(error) => {
                return Err(ItemError::Fetch {
                    summoner_id: item.wire.summoner_id,
                    error,
                })
            }
        };

        let game_name = if summoner.name.is_empty() {
            "Unknown".to_string()
        } else {
            summoner.name
        };

        let entry = LeaderboardEntry::new(
            summoner.puuid,
            region,
            tier,
            division,
            item.wire.league_points,
            item.wire.wins,
            item.wire.losses,
        )
        .with_identity(game_name, region.as_str().to_string());

        self.store.upsert(&entry).map_err(ItemError::Storage)?;
        Ok(ItemOutcome::Upserted)
    }
}
