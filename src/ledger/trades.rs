use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::Trade;

pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    buyer_id: Uuid,
    seller_id: Uuid,
    player_id: Uuid,
    buy_order_id: Uuid,
    sell_order_id: Uuid,
    quantity: i64,
    price: Decimal,
) -> Result<Trade, sqlx::Error> {
    sqlx::query_as::<_, Trade>(
        r#"
        INSERT INTO trades (id, buyer_id, seller_id, player_id, buy_order_id, sell_order_id, quantity, price, executed_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(buyer_id)
    .bind(seller_id)
    .bind(player_id)
    .bind(buy_order_id)
    .bind(sell_order_id)
    .bind(quantity)
    .bind(price)
    .fetch_one(&mut **tx)
    .await
}

pub async fn recent_for_player(pool: &PgPool, player_id: Uuid, limit: i64) -> Result<Vec<Trade>, sqlx::Error> {
    sqlx::query_as::<_, Trade>(
        "SELECT * FROM trades WHERE player_id = $1 ORDER BY executed_at DESC LIMIT $2",
    )
    .bind(player_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Backs the dashboard's "market activity" feed: one query across every
/// player shown, not a per-player loop.
pub async fn recent_across_players(pool: &PgPool, player_ids: &[Uuid], limit: i64) -> Result<Vec<Trade>, sqlx::Error> {
    if player_ids.is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_as::<_, Trade>(
        "SELECT * FROM trades WHERE player_id = ANY($1) ORDER BY executed_at DESC LIMIT $2",
    )
    .bind(player_ids)
    .bind(limit)
    .fetch_all(pool)
    .await
}
