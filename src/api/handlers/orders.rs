//! `POST /api/orders/:playerId` and `POST /api/orders/:orderId/cancel`.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::{Extension, Json};
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::models::{CreateOrderRequest, OrderResponse, OrderType};
use crate::utils::response::{ApiResponse, AppError};
use crate::AppState;

pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(player_id): Path<Uuid>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>, AppError> {
    request.validate().map_err(|e| AppError::bad_request(&e.to_string()))?;

    let response = match request.order_type {
        OrderType::Limit => {
            let limit_price = request
                .limit_price
                .ok_or_else(|| AppError::bad_request("limitPrice is required for a limit order"))?;
            let order = state
                .matching
                .place_limit_order(auth.user_id, player_id, request.side, request.quantity, limit_price)
                .await?;

            crate::metrics::record_order_submitted(&request.side.to_string());

            OrderResponse {
                order,
                requested_quantity: None,
                filled_quantity: None,
                cancelled_quantity: None,
                avg_fill_price: None,
                total_cost: None,
            }
        }
        OrderType::Market => {
            let (order, summary) = state
                .matching
                .place_market_order(auth.user_id, player_id, request.side, request.quantity)
                .await?;

            crate::metrics::record_order_submitted(&request.side.to_string());
            crate::metrics::record_trade_executed();

            OrderResponse {
                order,
                requested_quantity: Some(summary.requested_quantity),
                filled_quantity: Some(summary.filled_quantity),
                cancelled_quantity: Some(summary.cancelled_quantity),
                avg_fill_price: summary.avg_fill_price,
                total_cost: Some(summary.total_cost),
            }
        }
    };

    Ok(Json(ApiResponse::success(response)))
}

pub async fn cancel_order(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.matching.cancel_order(order_id, auth.user_id).await?;
    crate::metrics::record_order_cancelled();
    Ok(Json(ApiResponse::success(())))
}
