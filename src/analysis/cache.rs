//! On-disk analysis cache.
//!
//! One JSON file per match fingerprint, named by a digest prefix so
//! arbitrary fingerprint strings stay filesystem-safe. Every entry
//! records the prompt revision it was generated under; an entry from
//! any other revision is a miss, so bumping the version invalidates
//! the whole cache without touching the files.
//!
//! Reads and writes are best-effort: a corrupt or unwritable entry
//! costs a recompute, never the response.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::GeneratorError;
use crate::storage::StorageConfig;

/// One cached analysis entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedAnalysis {
    pub fingerprint: String,
    pub version: String,
    pub analysis: String,
    pub created_at: DateTime<Utc>,
}

/// Versioned cache over generated analyses.
#[derive(Clone)]
pub struct AnalysisCache {
    config: StorageConfig,
    version: String,
}

impl AnalysisCache {
    pub fn new(config: StorageConfig, version: String) -> Self {
        Self { config, version }
    }

    /// Return the cached analysis, or run `compute` and cache its
    /// output. The flag reports whether the text came from the cache.
    pub async fn get_or_compute<F, Fut>(
        &self,
        fingerprint: &str,
        compute: F,
    ) -> Result<(String, bool), GeneratorError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<String, GeneratorError>>,
    {
        if let Some(analysis) = self.get(fingerprint) {
            return Ok((analysis, true));
        }

        let analysis = compute().await?;
        self.put(fingerprint, &analysis);
        Ok((analysis, false))
    }

    /// Look up a cached analysis for the current prompt revision.
    pub fn get(&self, fingerprint: &str) -> Option<String> {
        let path = self.entry_path(fingerprint);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => return None,
        };

        match serde_json::from_str::<CachedAnalysis>(&raw) {
            Ok(record) if record.version == self.version && record.fingerprint == fingerprint => {
                debug!("Analysis cache hit for {}", fingerprint);
                Some(record.analysis)
            }
            Ok(record) => {
                debug!(
                    "Analysis cache entry for {} is stale (version {})",
                    fingerprint, record.version
                );
                None
            }
            Err(e) => {
                warn!("Corrupt analysis cache entry {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Best-effort write under the current prompt revision.
    pub fn put(&self, fingerprint: &str, analysis: &str) {
        let record = CachedAnalysis {
            fingerprint: fingerprint.to_string(),
            version: self.version.clone(),
            analysis: analysis.to_string(),
            created_at: Utc::now(),
        };

        if let Err(e) = self.persist(&record) {
            warn!("Failed to persist analysis for {}: {}", fingerprint, e);
        }
    }

    fn persist(&self, record: &CachedAnalysis) -> std::io::Result<()> {
        std::fs::create_dir_all(self.config.analysis_dir())?;
        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(self.entry_path(&record.fingerprint), json)
    }

    fn entry_path(&self, fingerprint: &str) -> PathBuf {
        let digest = Sha256::digest(fingerprint.as_bytes());
        self.config
            .analysis_dir()
            .join(format!("{}.json", hex::encode(&digest[..8])))
    }
}
