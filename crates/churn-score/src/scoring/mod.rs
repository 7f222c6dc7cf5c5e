//! Churn-risk scoring pipeline.
//!
//! A call flows through feature assembly ([`provider`]), model inference
//! ([`inference`]), tier classification ([`classifier`]), factor attribution
//! ([`attribution`]) and, when enabled, a retention recommendation
//! ([`recommendation`]). [`service::ScoringService`] sequences the stages and
//! [`router`] exposes them over HTTP.

pub mod attribution;
pub mod classifier;
pub mod features;
pub mod inference;
pub mod provider;
pub mod recommendation;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use attribution::{align_contributions, attribute, Attribution, AttributionMode, Factor, TOP_N};
pub use classifier::RiskTier;
pub use features::{FeatureName, FeatureVector, FEATURE_COUNT};
pub use inference::{
    Inference, InferenceEngine, InferenceError, ModelInfo, OnnxInferenceEngine,
    StaticInferenceEngine,
};
pub use provider::FeatureVectorProvider;
pub use recommendation::{recommend, Recommendation, RetentionAction};
pub use router::{scoring_router, ScoreRequest};
pub use service::{ScoreResult, ScoringError, ScoringOptions, ScoringService, SimpleScore};
pub use store::{FeatureStore, FeatureStoreError, InMemoryFeatureStore, SqliteFeatureStore};
