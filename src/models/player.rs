use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A roster player. `last_trade_price` is set only by executed trades
/// -- never by a bot's fair-value estimate.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub team: String,
    pub position: String,
    pub is_active: bool,
    pub is_eligible_for_accrual: bool,
    pub last_trade_price: Option<Decimal>,
    pub volume_24h: Decimal,
    pub price_change_24h: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub id: Uuid,
    pub name: String,
    pub team: String,
    pub position: String,
    pub last_trade_price: Option<Decimal>,
    pub volume_24h: Decimal,
    pub price_change_24h: Decimal,
    pub best_bid: Option<Decimal>,
    pub best_ask: Option<Decimal>,
}

/// Upsert payload produced by the roster-sync scheduler job.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerUpsert {
    pub external_id: String,
    pub name: String,
    pub team: String,
    pub position: String,
    pub is_active: bool,
}
