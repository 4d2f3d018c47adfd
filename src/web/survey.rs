use crate::domain::submission::{self, SurveyForm};
use crate::services::security;
use crate::state::SharedState;
use crate::store::SUBMISSIONS_COLLECTION;
use crate::web::auth::client_ip;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const MAX_DRAFT_KEY_LEN: usize = 64;

#[derive(Deserialize)]
pub struct RecommendationPayload {
    pub recommendation: String,
}

#[derive(Serialize)]
pub struct SubmitAck {
    pub id: String,
    pub anonymous_id: String,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", post(submit_survey))
        .route("/recommendation", post(submit_recommendation))
        .route("/draft/:key", put(save_draft))
        .route("/draft/:key", get(load_draft))
        .route("/draft/:key", delete(clear_draft))
        .with_state(state)
}

async fn submit_survey(
    headers: HeaderMap,
    State(state): State<SharedState>,
    Json(form): Json<SurveyForm>,
) -> Result<Response, StatusCode> {
    let ip = client_ip(&headers);
    if !state.survey_limiter.check(&ip).await {
        tracing::warn!("survey rate limit exceeded for IP: {}", ip);
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }

    let prepared = match submission::validate_survey(&form) {
        Ok(prepared) => prepared,
        Err(errors) => {
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(errors)).into_response())
        }
    };

    // Jitter before the write so submit latency does not reveal form content.
    security::add_random_delay().await;

    let id = state
        .store
        .write(SUBMISSIONS_COLLECTION, prepared.record)
        .await
        .map_err(|e| {
            tracing::error!("failed to submit survey: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    tracing::info!("survey submitted: id={}", id);
    Ok((
        StatusCode::CREATED,
        Json(SubmitAck {
            id,
            anonymous_id: prepared.anonymous_id,
        }),
    )
        .into_response())
}

async fn submit_recommendation(
    headers: HeaderMap,
    State(state): State<SharedState>,
    Json(payload): Json<RecommendationPayload>,
) -> Result<Response, StatusCode> {
    let ip = client_ip(&headers);
    if !state.survey_limiter.check(&ip).await {
        tracing::warn!("recommendation rate limit exceeded for IP: {}", ip);
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }

    let prepared = match submission::validate_recommendation(&payload.recommendation) {
        Ok(prepared) => prepared,
        Err(errors) => {
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(errors)).into_response())
        }
    };

    security::add_random_delay().await;

    let id = state
        .store
        .write(SUBMISSIONS_COLLECTION, prepared.record)
        .await
        .map_err(|e| {
            tracing::error!("failed to submit recommendation: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    tracing::info!("recommendation submitted: id={}", id);
    Ok((
        StatusCode::CREATED,
        Json(SubmitAck {
            id,
            anonymous_id: prepared.anonymous_id,
        }),
    )
        .into_response())
}

async fn save_draft(
    State(state): State<SharedState>,
    Path(key): Path<String>,
    Json(value): Json<Value>,
) -> Result<StatusCode, StatusCode> {
    if key.is_empty() || key.len() > MAX_DRAFT_KEY_LEN {
        return Err(StatusCode::BAD_REQUEST);
    }
    state.drafts.save(&key, value).await;
    Ok(StatusCode::NO_CONTENT)
}

async fn load_draft(
    State(state): State<SharedState>,
    Path(key): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    state
        .drafts
        .load(&key)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn clear_draft(
    State(state): State<SharedState>,
    Path(key): Path<String>,
) -> StatusCode {
    state.drafts.clear(&key).await;
    StatusCode::NO_CONTENT
}
