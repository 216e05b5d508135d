//! `POST /api/contest/:id/enter`, `PUT /api/contest/:contestId/entry/:entryId`,
//! and the public `GET /api/contest/:id/leaderboard`.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::{Extension, Json};
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::ledger;
use crate::models::{ContestEntryResponse, EditContestRequest, EnterContestRequest, LeaderboardRow};
use crate::utils::response::{ApiResponse, AppError};
use crate::AppState;

pub async fn enter_contest(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(contest_id): Path<Uuid>,
    Json(request): Json<EnterContestRequest>,
) -> Result<Json<ApiResponse<ContestEntryResponse>>, AppError> {
    request.validate().map_err(|e| AppError::bad_request(&e.to_string()))?;
    let response = state.contests.enter(contest_id, auth.user_id, request.lineup).await?;
    crate::metrics::record_contest_entry();
    Ok(Json(ApiResponse::success(response)))
}

pub async fn edit_entry(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path((contest_id, entry_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<EditContestRequest>,
) -> Result<Json<ApiResponse<ContestEntryResponse>>, AppError> {
    request.validate().map_err(|e| AppError::bad_request(&e.to_string()))?;
    let response = state.contests.edit(contest_id, entry_id, auth.user_id, request.lineup).await?;
    Ok(Json(ApiResponse::success(response)))
}

pub async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Path(contest_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<LeaderboardRow>>>, AppError> {
    let rows = ledger::contests::leaderboard(&state.db.pool, contest_id).await?;
    let leaderboard = rows
        .into_iter()
        .enumerate()
        .map(|(i, (user_id, username, total_score, payout, rank))| LeaderboardRow {
            user_id,
            username,
            total_score,
            payout,
            rank: rank.map(i64::from).unwrap_or((i + 1) as i64),
        })
        .collect();

    Ok(Json(ApiResponse::success(leaderboard)))
}
