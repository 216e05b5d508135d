//! Outbound broadcast message shapes. Every core component
//! that mutates shared state constructs one of these and sends it on the
//! broadcast hub; it never reaches into transport concerns itself.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BroadcastMessage {
    #[serde(rename = "trade")]
    Trade {
        player_id: Uuid,
        quantity: i64,
        price: Decimal,
    },
    #[serde(rename = "orderBook")]
    OrderBook { player_id: Uuid },
    #[serde(rename = "marketActivity")]
    MarketActivity,
    #[serde(rename = "portfolio")]
    Portfolio { user_id: Uuid, balance: Decimal },
    #[serde(rename = "liveStats")]
    LiveStats { game_id: Uuid },
    #[serde(rename = "contestUpdate")]
    ContestUpdate {
        contest_id: Option<Uuid>,
        game_id: Option<Uuid>,
    },
}

impl From<&crate::models::Trade> for BroadcastMessage {
    fn from(trade: &crate::models::Trade) -> Self {
        BroadcastMessage::Trade {
            player_id: trade.player_id,
            quantity: trade.quantity,
            price: trade.price,
        }
    }
}

pub type Broadcaster = tokio::sync::broadcast::Sender<BroadcastMessage>;

pub fn new_hub() -> Broadcaster {
    let (tx, _rx) = tokio::sync::broadcast::channel(1024);
    tx
}
