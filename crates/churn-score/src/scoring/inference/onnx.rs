use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use parking_lot::Mutex;
use tracing::{info, warn};

use super::{Inference, InferenceEngine, InferenceError, ModelInfo};
use crate::scoring::features::{FeatureVector, FEATURE_COUNT};

/// ONNX Runtime session loaded once and shared by every request.
///
/// `Session::run` needs exclusive access to the session, so calls are
/// serialized on the session lock; nothing else about the engine is mutable
/// after `load` returns.
pub struct OnnxInferenceEngine {
    session: Mutex<Session>,
    outputs: Vec<String>,
    path: PathBuf,
    loaded_at: DateTime<Utc>,
    latency_sum_us: AtomicU64,
    inference_count: AtomicU64,
}

fn load_error(error: impl Display) -> InferenceError {
    InferenceError::Load(error.to_string())
}

fn runtime_error(error: impl Display) -> InferenceError {
    InferenceError::Runtime(error.to_string())
}

impl OnnxInferenceEngine {
    /// Initialization phase: read and validate the artifact.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading churn model");

        if !path.exists() {
            return Err(InferenceError::ModelNotFound(path.to_path_buf()));
        }

        let session = Session::builder()
            .map_err(load_error)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(load_error)?
            .commit_from_file(path)
            .map_err(load_error)?;

        if session.inputs.is_empty() {
            return Err(InferenceError::Load("model declares no inputs".to_string()));
        }

        let outputs: Vec<String> = session
            .outputs
            .iter()
            .map(|output| output.name.clone())
            .collect();
        if outputs.is_empty() {
            return Err(InferenceError::Load(
                "model declares no outputs".to_string(),
            ));
        }

        info!(
            outputs = outputs.len(),
            explainable = outputs.len() > 1,
            "churn model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            outputs,
            path: path.to_path_buf(),
            loaded_at: Utc::now(),
            latency_sum_us: AtomicU64::new(0),
            inference_count: AtomicU64::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn input_tensor(vector: &FeatureVector) -> Result<Tensor<f32>, InferenceError> {
        let row = Array2::<f32>::from_shape_vec((1, FEATURE_COUNT), vector.to_f32())
            .map_err(|error| InferenceError::Shape(error.to_string()))?;
        Tensor::from_array(row).map_err(|error| InferenceError::Shape(error.to_string()))
    }
}

impl InferenceEngine for OnnxInferenceEngine {
    fn infer(&self, vector: &FeatureVector) -> Result<Inference, InferenceError> {
        let started = Instant::now();
        let input = Self::input_tensor(vector)?;

        let inference = {
            let mut session = self.session.lock();
            let outputs = session
                .run(ort::inputs![input])
                .map_err(runtime_error)?;

            let score_value = outputs
                .get(&self.outputs[0])
                .ok_or(InferenceError::MissingScore)?;
            let (_, scores) = score_value
                .try_extract_tensor::<f32>()
                .map_err(runtime_error)?;
            if scores.len() != 1 {
                return Err(InferenceError::Shape(format!(
                    "score output `{}` has {} elements, expected 1",
                    self.outputs[0],
                    scores.len()
                )));
            }
            let score = f64::from(scores[0]);

            let contributions = match self.outputs.get(1) {
                Some(name) => match outputs.get(name).map(|value| value.try_extract_tensor::<f32>()) {
                    Some(Ok((_, weights))) => {
                        Some(weights.iter().map(|weight| f64::from(*weight)).collect())
                    }
                    Some(Err(error)) => {
                        warn!(output = %name, %error, "contribution output unreadable");
                        Some(Vec::new())
                    }
                    None => {
                        warn!(output = %name, "contribution output missing from run");
                        Some(Vec::new())
                    }
                },
                None => None,
            };

            Inference {
                score,
                contributions,
            }
        };

        self.latency_sum_us
            .fetch_add(started.elapsed().as_micros() as u64, Ordering::Relaxed);
        self.inference_count.fetch_add(1, Ordering::Relaxed);

        Ok(inference)
    }

    fn model_info(&self) -> Option<ModelInfo> {
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let count = self.inference_count.load(Ordering::Relaxed);
        let avg_latency_ms = if count > 0 {
            (sum as f64 / count as f64) / 1000.0
        } else {
            0.0
        };

        Some(ModelInfo {
            path: self.path.display().to_string(),
            outputs: self.outputs.clone(),
            explainable: self.outputs.len() > 1,
            loaded_at: self.loaded_at,
            inference_count: count,
            avg_latency_ms,
        })
    }
}
