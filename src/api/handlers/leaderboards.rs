//! `GET /api/leaderboards?category=...` (public, no auth required).

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::ledger;
use crate::ledger::users::LeaderboardCandidate;
use crate::utils::response::{ApiResponse, AppError};
use crate::AppState;

const DEFAULT_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub category: String,
    pub limit: Option<i64>,
}

pub async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<ApiResponse<Vec<LeaderboardCandidate>>>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);

    let rows = match query.category.as_str() {
        "netWorth" => ledger::users::leaderboard_net_worth(&state.db.pool, limit).await?,
        "cashBalance" => ledger::users::leaderboard_cash_balance(&state.db.pool, limit).await?,
        "portfolioValue" => ledger::users::leaderboard_portfolio_value(&state.db.pool, limit).await?,
        "sharesMined" => ledger::users::leaderboard_shares_mined(&state.db.pool, limit).await?,
        "marketOrders" => ledger::users::leaderboard_market_orders(&state.db.pool, limit).await?,
        other => return Err(AppError::bad_request(&format!("unknown leaderboard category '{other}'"))),
    };

    Ok(Json(ApiResponse::success(rows)))
}
