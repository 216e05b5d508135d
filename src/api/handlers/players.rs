//! `GET /api/players` and `GET /api/player/:id`.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use axum_extra::extract::CookieJar;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::middleware::try_authenticate;
use crate::ledger;
use crate::ledger::players::PlayerSearch;
use crate::models::{Holding, Player, PlayerSummary, Trade};
use crate::utils::response::{ApiResponse, AppError};
use crate::AppState;

const ORDER_BOOK_DEPTH: usize = 10;
const DEFAULT_PAGE_LIMIT: i64 = 50;
const RECENT_TRADES_LIMIT: i64 = 20;

#[derive(Debug, Deserialize)]
pub struct ListPlayersQuery {
    pub search: Option<String>,
    pub team: Option<String>,
    pub position: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<String>,
    #[serde(rename = "hasBuyOrders")]
    pub has_buy_orders: Option<bool>,
    #[serde(rename = "hasSellOrders")]
    pub has_sell_orders: Option<bool>,
    #[serde(rename = "teamsPlayingOnDate")]
    pub teams_playing_on_date: Option<chrono::NaiveDate>,
}

pub async fn list_players(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListPlayersQuery>,
) -> Result<Json<ApiResponse<Vec<PlayerSummary>>>, AppError> {
    // `bid`/`ask` order only exists once the live book is joined in, so the
    // database-side sort falls back to price and the final ordering is
    // applied after enrichment below.
    let db_sort_by = match query.sort_by.as_deref() {
        Some("bid") | Some("ask") => None,
        other => other.map(str::to_string),
    };

    let params = PlayerSearch {
        search: query.search.clone(),
        team: query.team.clone(),
        position: query.position.clone(),
        has_buy_orders: query.has_buy_orders,
        has_sell_orders: query.has_sell_orders,
        sort_by: db_sort_by,
        sort_order: query.sort_order.clone(),
        limit: query.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
        offset: query.offset.unwrap_or(0),
    };

    let mut players = ledger::players::search(&state.db.pool, &params).await?;

    if let Some(day) = query.teams_playing_on_date {
        let games = ledger::games::get_games_by_day(&state.db.pool, day).await?;
        let playing_teams: std::collections::HashSet<&str> = games
            .iter()
            .flat_map(|g| [g.home_team.as_str(), g.away_team.as_str()])
            .collect();
        players.retain(|p| playing_teams.contains(p.team.as_str()));
    }

    let mut summaries: Vec<PlayerSummary> = players
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

    let descending = query.sort_order.as_deref() != Some("asc");
    match query.sort_by.as_deref() {
        Some("bid") => summaries.sort_by(|a, b| cmp_option_decimal(a.best_bid, b.best_bid, descending)),
        Some("ask") => summaries.sort_by(|a, b| cmp_option_decimal(a.best_ask, b.best_ask, descending)),
        _ => {}
    }

    Ok(Json(ApiResponse::success(summaries)))
}

fn cmp_option_decimal(a: Option<Decimal>, b: Option<Decimal>, descending: bool) -> std::cmp::Ordering {
    let ordering = a.cmp(&b);
    if descending {
        ordering.reverse()
    } else {
        ordering
    }
}

#[derive(Debug, Serialize)]
pub struct PlayerDetailResponse {
    pub player: Player,
    pub best_bid: Option<Decimal>,
    pub best_ask: Option<Decimal>,
    pub order_book: OrderBookView,
    pub recent_trades: Vec<Trade>,
    pub holding: Option<Holding>,
    pub available_balance: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct OrderBookView {
    pub bids: Vec<PriceLevelView>,
    pub asks: Vec<PriceLevelView>,
}

#[derive(Debug, Serialize)]
pub struct PriceLevelView {
    pub price: Decimal,
    pub quantity: i64,
}

fn to_levels(levels: Vec<(Decimal, i64)>) -> Vec<PriceLevelView> {
    levels
        .into_iter()
        .map(|(price, quantity)| PriceLevelView { price, quantity })
        .collect()
}

pub async fn get_player(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(player_id): Path<Uuid>,
) -> Result<Json<ApiResponse<PlayerDetailResponse>>, AppError> {
    let player = ledger::players::get_by_id(&state.db.pool, player_id)
        .await?
        .ok_or_else(|| AppError::not_found("player not found"))?;

    let (best_bid, best_ask) = state.matching.best_bid_ask(player_id);
    let (bids, asks) = state.matching.snapshot(player_id, ORDER_BOOK_DEPTH);
    let recent_trades = ledger::trades::recent_for_player(&state.db.pool, player_id, RECENT_TRADES_LIMIT).await?;

    let (holding, available_balance) = match try_authenticate(&state, &jar) {
        Some(auth) => {
            let holding = ledger::holdings::get(&state.db.pool, auth.user_id, player_id).await?;
            let available = state.locks.available_balance(auth.user_id).await?;
            (holding, Some(available))
        }
        None => (None, None),
    };

    Ok(Json(ApiResponse::success(PlayerDetailResponse {
        player,
        best_bid,
        best_ask,
        order_book: OrderBookView { bids: to_levels(bids), asks: to_levels(asks) },
        recent_trades,
        holding,
        available_balance,
    })))
}
