//! Model inference seam.
//!
//! The pipeline only depends on [`InferenceEngine`]; the ONNX-backed engine is
//! constructed once at startup and injected, and tests substitute a fixed engine.

mod onnx;

pub use onnx::OnnxInferenceEngine;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

use super::features::FeatureVector;

/// Raw model output for one feature vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Inference {
    /// Churn probability; interpreted as [0, 1] but not clamped.
    pub score: f64,
    /// Per-feature contribution weights, possibly prefixed by a bias term.
    /// An empty vector marks a declared output that could not be read.
    pub contributions: Option<Vec<f64>>,
}

/// Scores feature vectors against a loaded model.
///
/// Implementations are shared across request tasks and must be safe to call
/// concurrently through `&self`.
pub trait InferenceEngine: Send + Sync {
    fn infer(&self, vector: &FeatureVector) -> Result<Inference, InferenceError>;

    /// Descriptive metadata for status endpoints; engines without an artifact return `None`.
    fn model_info(&self) -> Option<ModelInfo> {
        None
    }
}

/// Metadata about the loaded artifact.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub path: String,
    pub outputs: Vec<String>,
    pub explainable: bool,
    pub loaded_at: DateTime<Utc>,
    pub inference_count: u64,
    pub avg_latency_ms: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("model artifact not found: {}", .0.display())]
    ModelNotFound(PathBuf),
    #[error("failed to load model: {0}")]
    Load(String),
    #[error("malformed tensor: {0}")]
    Shape(String),
    #[error("inference failed: {0}")]
    Runtime(String),
    #[error("model produced no score output")]
    MissingScore,
}

/// Engine returning the same output for every vector.
#[derive(Debug, Clone)]
pub struct StaticInferenceEngine {
    score: f64,
    contributions: Option<Vec<f64>>,
}

impl StaticInferenceEngine {
    pub fn new(score: f64) -> Self {
        Self {
            score,
            contributions: None,
        }
    }

    pub fn with_contributions(mut self, contributions: Vec<f64>) -> Self {
        self.contributions = Some(contributions);
        self
    }
}

impl InferenceEngine for StaticInferenceEngine {
    fn infer(&self, _vector: &FeatureVector) -> Result<Inference, InferenceError> {
        Ok(Inference {
            score: self.score,
            contributions: self.contributions.clone(),
        })
    }
}
