//! `GET /api/dashboard`: a public market summary, enriched with the
//! caller's own profile, holdings, and accrual status when a session
//! cookie is present.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use axum_extra::extract::CookieJar;
use serde::Serialize;

use crate::auth::middleware::try_authenticate;
use crate::ledger;
use crate::models::{Accrual, Contest, HoldingWithPlayer, PlayerSummary, TradeEvent, UserProfile};
use crate::utils::response::{ApiResponse, AppError};
use crate::AppState;

const DASHBOARD_PLAYER_LIMIT: usize = 25;
const RECENT_TRADES_LIMIT: i64 = 20;

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub players: Vec<PlayerSummary>,
    pub open_contests: Vec<Contest>,
    pub recent_trades: Vec<TradeEvent>,
    pub user: Option<DashboardUser>,
}

#[derive(Debug, Serialize)]
pub struct DashboardUser {
    pub profile: UserProfile,
    pub holdings: Vec<HoldingWithPlayer>,
    pub accrual: Accrual,
}

pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<ApiResponse<DashboardResponse>>, AppError> {
    let active = ledger::players::list_active(&state.db.pool).await?;

    let mut players: Vec<PlayerSummary> = active
        .into_iter()
        .map(|p| {
            let (best_bid, best_ask) = state.matching.best_bid_ask(p.id);
            PlayerSummary {
                id: p.id,
                name: p.name,
                team: p.team,
                position: p.position,
                last_trade_price: p.last_trade_price,
                volume_24h: p.volume_24h,
                price_change_24h: p.price_change_24h,
                best_bid,
                best_ask,
            }
        })
        .collect();
    players.sort_by(|a, b| b.volume_24h.cmp(&a.volume_24h));
    players.truncate(DASHBOARD_PLAYER_LIMIT);

    let player_ids: Vec<_> = players.iter().map(|p| p.id).collect();
    let recent_trades = ledger::trades::recent_across_players(&state.db.pool, &player_ids, RECENT_TRADES_LIMIT)
        .await?
        .iter()
        .map(TradeEvent::from)
        .collect();

    let open_contests = ledger::contests::list_open(&state.db.pool).await?;

    let user = match try_authenticate(&state, &jar) {
        Some(auth) => {
            let user_row = ledger::users::get_by_id(&state.db.pool, auth.user_id)
                .await?
                .ok_or_else(|| AppError::not_found("user not found"))?;
            let available = state.locks.available_balance(auth.user_id).await?;
            let holdings = ledger::holdings::get_user_holdings_with_players(&state.db.pool, auth.user_id).await?;
            let accrual = state.accrual.accrue(auth.user_id).await?;

            Some(DashboardUser {
                profile: UserProfile::new(&user_row, available),
                holdings,
                accrual,
            })
        }
        None => None,
    };

    Ok(Json(ApiResponse::success(DashboardResponse {
        players,
        open_contests,
        recent_trades,
        user,
    })))
}
