use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use super::inference::{InferenceEngine, ModelInfo};
use super::service::{ScoreResult, ScoringError, ScoringService};
use super::store::FeatureStore;

/// Scoring request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRequest {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    #[serde(rename = "prodId")]
    pub product_id: String,
}

/// Model status payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelStatusView {
    pub model_version: String,
    pub recommendations: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelInfo>,
}

/// Router builder exposing the churn scoring endpoints.
pub fn scoring_router<S, E>(service: Arc<ScoringService<S, E>>) -> Router
where
    S: FeatureStore + 'static,
    E: InferenceEngine + 'static,
{
    Router::new()
        .route("/api/v1/churn/score", post(simple_score_handler::<S, E>))
        .route(
            "/api/v1/churn/score/detail",
            post(detail_score_handler::<S, E>),
        )
        .route("/api/v1/churn/model", get(model_handler::<S, E>))
        .with_state(service)
}

pub(crate) async fn simple_score_handler<S, E>(
    State(service): State<Arc<ScoringService<S, E>>>,
    Json(request): Json<ScoreRequest>,
) -> Response
where
    S: FeatureStore + 'static,
    E: InferenceEngine + 'static,
{
    match run_scoring(&service, request).await {
        Ok(result) => (StatusCode::OK, Json(result.simple())).into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn detail_score_handler<S, E>(
    State(service): State<Arc<ScoringService<S, E>>>,
    Json(request): Json<ScoreRequest>,
) -> Response
where
    S: FeatureStore + 'static,
    E: InferenceEngine + 'static,
{
    match run_scoring(&service, request).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn model_handler<S, E>(
    State(service): State<Arc<ScoringService<S, E>>>,
) -> Json<ModelStatusView>
where
    S: FeatureStore + 'static,
    E: InferenceEngine + 'static,
{
    Json(ModelStatusView {
        model_version: service.model_version().to_string(),
        recommendations: service.options().recommendations,
        model: service.engine().model_info(),
    })
}

async fn run_scoring<S, E>(
    service: &Arc<ScoringService<S, E>>,
    request: ScoreRequest,
) -> Result<ScoreResult, Response>
where
    S: FeatureStore + 'static,
    E: InferenceEngine + 'static,
{
    let product_id = request.product_id.as_str();
    if product_id.trim().is_empty() {
        let payload = json!({ "error": "prodId must not be empty" });
        return Err((StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response());
    }

    service
        .score(request.user_id, product_id)
        .await
        .map_err(|err| {
            error!(user_id = %request.user_id, product_id, error = %err, "scoring failed");
            scoring_failure(err)
        })
}

fn scoring_failure(err: ScoringError) -> Response {
    let payload = json!({ "error": err.to_string() });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
}
