//! Admin endpoints gated by `admin::admin_middleware`: trigger
//! any scheduled job, backfill a player's gamelog history, inspect or kick
//! the bot fleet, and grant premium manually.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::ledger;
use crate::models::BotProfile;
use crate::utils::response::{ApiResponse, AppError};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TriggerJobRequest {
    pub job_name: String,
}

pub async fn trigger_job(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TriggerJobRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state
        .scheduler
        .trigger(&request.job_name)
        .await
        .map_err(|e| AppError::bad_request(&e))?;
    Ok(Json(ApiResponse::success(())))
}

#[derive(Debug, Deserialize)]
pub struct BackfillRequest {
    pub player_external_id: String,
}

#[derive(Debug, serde::Serialize)]
pub struct BackfillResponse {
    pub rows_failed: i32,
}

pub async fn backfill(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BackfillRequest>,
) -> Result<Json<ApiResponse<BackfillResponse>>, AppError> {
    let rows_failed = state
        .scheduler
        .backfill_player(&request.player_external_id)
        .await
        .map_err(|e| AppError::internal(&e.to_string()))?;
    Ok(Json(ApiResponse::success(BackfillResponse { rows_failed })))
}

pub async fn bot_stats(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse<Vec<BotProfile>>>, AppError> {
    let bots = ledger::bots::list_all(&state.db.pool).await?;
    Ok(Json(ApiResponse::success(bots)))
}

pub async fn trigger_bots(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse<()>>, AppError> {
    state.scheduler.trigger("bot_engine").await.map_err(|e| AppError::internal(&e))?;
    Ok(Json(ApiResponse::success(())))
}

#[derive(Debug, Deserialize)]
pub struct GrantPremiumRequest {
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

pub async fn grant_premium(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GrantPremiumRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    ledger::users::grant_premium(&state.db.pool, request.user_id, request.expires_at).await?;
    Ok(Json(ApiResponse::success(())))
}
