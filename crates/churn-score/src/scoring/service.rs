use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::debug;
use uuid::Uuid;

use super::attribution::{attribute, AttributionMode, Factor};
use super::classifier::RiskTier;
use super::features::FeatureVector;
use super::inference::{Inference, InferenceEngine, InferenceError};
use super::provider::FeatureVectorProvider;
use super::recommendation::{recommend, Recommendation};
use super::store::FeatureStore;

/// Pipeline switches chosen at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringOptions {
    /// Run the recommendation stage regardless of attribution mode.
    pub recommendations: bool,
    /// Upper bound on feature lookups in flight at once.
    pub lookup_workers: usize,
}

impl Default for ScoringOptions {
    fn default() -> Self {
        Self {
            recommendations: true,
            lookup_workers: 16,
        }
    }
}

/// Full outcome of one scoring call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub request_id: Uuid,
    pub model_version: String,
    pub score: f64,
    pub risk_level: RiskTier,
    pub top_factors: Vec<Factor>,
    #[serde(skip_serializing)]
    pub attribution: AttributionMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,
}

/// Score-only view for callers that do not need explainability.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleScore {
    pub request_id: Uuid,
    pub model_version: String,
    pub score: f64,
    pub risk_level: RiskTier,
}

impl ScoreResult {
    pub fn simple(&self) -> SimpleScore {
        SimpleScore {
            request_id: self.request_id,
            model_version: self.model_version.clone(),
            score: self.score,
            risk_level: self.risk_level,
        }
    }
}

/// Service composing feature assembly, inference, classification,
/// attribution and recommendation into one call.
pub struct ScoringService<S, E> {
    provider: FeatureVectorProvider<S>,
    engine: Arc<E>,
    model_version: String,
    options: ScoringOptions,
    lookups: Arc<Semaphore>,
}

impl<S, E> ScoringService<S, E>
where
    S: FeatureStore + 'static,
    E: InferenceEngine + 'static,
{
    /// `engine` must already be initialized; the service never loads models itself.
    pub fn new(
        store: Arc<S>,
        engine: Arc<E>,
        model_version: impl Into<String>,
        options: ScoringOptions,
    ) -> Self {
        let lookups = Arc::new(Semaphore::new(options.lookup_workers.max(1)));
        Self {
            provider: FeatureVectorProvider::new(store),
            engine,
            model_version: model_version.into(),
            options,
            lookups,
        }
    }

    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    pub fn options(&self) -> &ScoringOptions {
        &self.options
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Score a pair on a request task. Lookup and inference run on the
    /// blocking pool; lookups are additionally capped by `lookup_workers`.
    pub async fn score(
        &self,
        user_id: Uuid,
        product_id: &str,
    ) -> Result<ScoreResult, ScoringError> {
        let vector = {
            let _permit = self.lookups.acquire().await?;
            let provider = self.provider.clone();
            let product = product_id.to_string();
            tokio::task::spawn_blocking(move || provider.assemble(user_id, &product)).await?
        };

        let engine = Arc::clone(&self.engine);
        let inference = tokio::task::spawn_blocking(move || engine.infer(&vector)).await??;

        Ok(self.compose(user_id, product_id, &vector, inference))
    }

    /// Same pipeline on the calling thread, for CLI and batch use.
    pub fn score_blocking(
        &self,
        user_id: Uuid,
        product_id: &str,
    ) -> Result<ScoreResult, ScoringError> {
        let vector = self.provider.assemble(user_id, product_id);
        let inference = self.engine.infer(&vector)?;
        Ok(self.compose(user_id, product_id, &vector, inference))
    }

    fn compose(
        &self,
        user_id: Uuid,
        product_id: &str,
        vector: &FeatureVector,
        inference: Inference,
    ) -> ScoreResult {
        let risk_level = RiskTier::classify(inference.score);
        let attribution = attribute(vector, inference.contributions.as_deref());
        let recommendation = self.options.recommendations.then(|| {
            recommend(
                risk_level,
                attribution.top().map(|factor| factor.name),
                user_id,
                product_id,
            )
        });

        let request_id = Uuid::new_v4();
        debug!(
            %request_id,
            score = inference.score,
            risk = risk_level.label(),
            factors = attribution.factors.len(),
            mode = ?attribution.mode,
            "scored subscription"
        );

        ScoreResult {
            request_id,
            model_version: self.model_version.clone(),
            score: inference.score,
            risk_level,
            top_factors: attribution.factors,
            attribution: attribution.mode,
            recommendation,
        }
    }
}

/// Error raised by the scoring service.
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error("scoring worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
    #[error("feature lookup pool closed")]
    LookupPoolClosed(#[from] tokio::sync::AcquireError),
}
