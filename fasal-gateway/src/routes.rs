//! Policy submission endpoint

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::post,
};
use serde::{Deserialize, Serialize};

use fasal_core::models::{CreatePolicyRequest, Policy};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub const CREATE_POLICY_PATH: &str = "/api/policies/create";

/// Body of a successful `POST /api/policies/create`.
#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CreatePolicyResponse {
    pub policy: Policy,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(CREATE_POLICY_PATH, post(create_policy))
        .with_state(state)
}

/// Inserts the submitted policy as-is. Only the JSON shape is checked.
pub async fn create_policy(
    State(state): State<AppState>,
    payload: Result<Json<CreatePolicyRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreatePolicyResponse>)> {
    let Json(request) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let policy = state
        .store
        .insert_policy(request)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    tracing::info!(policy_id = %policy.id, owner = %policy.user_id, crop = %policy.crop, "Policy created");
    Ok((StatusCode::CREATED, Json(CreatePolicyResponse { policy })))
}
