use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A user's position in a single player's shares. Created on first
/// acquisition; a zero-quantity row is allowed and kept rather than deleted
/// so that `avg_cost_basis` history is not lost across a full sell-off.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Holding {
    pub user_id: Uuid,
    pub player_id: Uuid,
    pub quantity: i64,
    pub avg_cost_basis: Decimal,
    pub total_cost_basis: Decimal,
}

/// A holding joined with the player it refers to, for single-query list
/// views.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HoldingWithPlayer {
    pub player_id: Uuid,
    pub name: String,
    pub team: String,
    pub position: String,
    pub quantity: i64,
    pub avg_cost_basis: Decimal,
    pub last_trade_price: Option<Decimal>,
}
