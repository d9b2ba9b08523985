use std::sync::Arc;

use crate::analysis::{AnalysisCache, TextGenerator};
use crate::storage::{LeaderboardStore, StorageConfig};
use crate::sync::RefreshOrchestrator;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<StorageConfig>,
    pub store: LeaderboardStore,
    pub orchestrator: Arc<RefreshOrchestrator>,
    pub cache: Arc<AnalysisCache>,
    pub generator: Arc<dyn TextGenerator>,
}
