use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An executed trade. Append-only: buyer != seller, price > 0, quantity > 0,
/// enforced at insertion by the matching engine, not by the schema.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Trade {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub player_id: Uuid,
    pub buy_order_id: Uuid,
    pub sell_order_id: Uuid,
    pub quantity: i64,
    pub price: Decimal,
    pub executed_at: DateTime<Utc>,
}

/// Broadcast-facing trade event.
#[derive(Debug, Clone, Serialize)]
pub struct TradeEvent {
    pub player_id: Uuid,
    pub quantity: i64,
    pub price: Decimal,
}

impl From<&Trade> for TradeEvent {
    fn from(t: &Trade) -> Self {
        Self {
            player_id: t.player_id,
            quantity: t.quantity,
            price: t.price,
        }
    }
}
