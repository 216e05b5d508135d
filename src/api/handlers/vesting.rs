//! `POST /api/vesting/start` and `POST /api/vesting/claim`.

use std::sync::Arc;

use axum::extract::State;
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::models::{AccrualSplit, ClaimResult};
use crate::utils::response::{ApiResponse, AppError};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct StartVestingRequest {
    #[serde(rename = "playerIds")]
    pub player_ids: Vec<Uuid>,
}

pub async fn start_vesting(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<StartVestingRequest>,
) -> Result<Json<ApiResponse<Vec<AccrualSplit>>>, AppError> {
    let splits = state.accrual.set_splits(auth.user_id, request.player_ids).await?;
    Ok(Json(ApiResponse::success(splits)))
}

pub async fn claim_vesting(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<ClaimResult>>>, AppError> {
    let results = state.accrual.claim(auth.user_id).await?;
    let total_claimed: i64 = results.iter().map(|r| r.shares_claimed).sum();
    crate::metrics::record_accrual_claimed(total_claimed);
    Ok(Json(ApiResponse::success(results)))
}
