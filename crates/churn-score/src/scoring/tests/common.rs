use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;
use uuid::Uuid;

use crate::scoring::features::{FeatureName, FeatureVector};
use crate::scoring::inference::{Inference, InferenceEngine, InferenceError, StaticInferenceEngine};
use crate::scoring::service::{ScoringOptions, ScoringService};
use crate::scoring::store::InMemoryFeatureStore;

pub(super) const PRODUCT: &str = "premium_monthly";
pub(super) const MODEL_VERSION: &str = "churn_v1";

pub(super) fn user() -> Uuid {
    Uuid::parse_str("6f1c2a9e-3d4b-4c8a-9e21-5b7d0f3a8c11").expect("valid uuid")
}

pub(super) fn failing_payments(count: f64) -> FeatureVector {
    FeatureVector::zeroed().with(FeatureName::FailCnt14d, count)
}

pub(super) fn store_with(vector: FeatureVector) -> Arc<InMemoryFeatureStore> {
    let store = InMemoryFeatureStore::default();
    store.insert(user(), PRODUCT, vector);
    Arc::new(store)
}

pub(super) fn build_service<E>(
    store: Arc<InMemoryFeatureStore>,
    engine: E,
) -> ScoringService<InMemoryFeatureStore, E>
where
    E: InferenceEngine + 'static,
{
    ScoringService::new(
        store,
        Arc::new(engine),
        MODEL_VERSION,
        ScoringOptions::default(),
    )
}

pub(super) fn static_service(
    vector: FeatureVector,
    score: f64,
) -> ScoringService<InMemoryFeatureStore, StaticInferenceEngine> {
    build_service(store_with(vector), StaticInferenceEngine::new(score))
}

/// Engine that records the vectors it was asked to score.
#[derive(Default)]
pub(super) struct RecordingEngine {
    pub(super) score: f64,
    pub(super) contributions: Option<Vec<f64>>,
    pub(super) seen: parking_lot::Mutex<Vec<FeatureVector>>,
    pub(super) calls: AtomicUsize,
}

impl RecordingEngine {
    pub(super) fn new(score: f64, contributions: Option<Vec<f64>>) -> Self {
        Self {
            score,
            contributions,
            ..Self::default()
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl InferenceEngine for RecordingEngine {
    fn infer(&self, vector: &FeatureVector) -> Result<Inference, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(*vector);
        Ok(Inference {
            score: self.score,
            contributions: self.contributions.clone(),
        })
    }
}

pub(super) struct BrokenEngine;

impl InferenceEngine for BrokenEngine {
    fn infer(&self, _vector: &FeatureVector) -> Result<Inference, InferenceError> {
        Err(InferenceError::Runtime("tensor shape mismatch".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
