use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use churn_score::config::{ModelConfig, ScoringConfig};
use churn_score::error::AppError;
use churn_score::scoring::{
    FeatureStore, FeatureStoreError, FeatureVector, InMemoryFeatureStore, OnnxInferenceEngine,
    ScoringOptions, ScoringService, SqliteFeatureStore,
};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Feature source selected by configuration.
pub(crate) enum ConfiguredFeatureStore {
    Sqlite(SqliteFeatureStore),
    Empty(InMemoryFeatureStore),
}

impl FeatureStore for ConfiguredFeatureStore {
    fn fetch(
        &self,
        user_id: Uuid,
        product_id: &str,
    ) -> Result<Option<FeatureVector>, FeatureStoreError> {
        match self {
            ConfiguredFeatureStore::Sqlite(store) => store.fetch(user_id, product_id),
            ConfiguredFeatureStore::Empty(store) => store.fetch(user_id, product_id),
        }
    }
}

pub(crate) type ChurnScoringService = ScoringService<ConfiguredFeatureStore, OnnxInferenceEngine>;

pub(crate) fn open_feature_store(
    config: &ScoringConfig,
) -> Result<ConfiguredFeatureStore, AppError> {
    match &config.feature_store_path {
        Some(path) => {
            info!(path = %path.display(), "opening feature store");
            Ok(ConfiguredFeatureStore::Sqlite(SqliteFeatureStore::open(path)?))
        }
        None => {
            warn!("no feature store configured; every pair scores on a zero vector");
            Ok(ConfiguredFeatureStore::Empty(InMemoryFeatureStore::default()))
        }
    }
}

pub(crate) fn scoring_options(config: &ScoringConfig) -> ScoringOptions {
    ScoringOptions {
        recommendations: config.recommendations,
        lookup_workers: config.lookup_workers,
    }
}

/// Loads the model and opens the feature store. Any failure here is fatal
/// for the process.
pub(crate) fn build_scoring_service(
    model: &ModelConfig,
    scoring: &ScoringConfig,
) -> Result<ChurnScoringService, AppError> {
    let engine = OnnxInferenceEngine::load(&model.path)?;
    let store = open_feature_store(scoring)?;

    Ok(ScoringService::new(
        Arc::new(store),
        Arc::new(engine),
        model.version.clone(),
        scoring_options(scoring),
    ))
}

pub(crate) fn parse_uuid(raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|err| format!("failed to parse '{raw}' as a UUID ({err})"))
}
