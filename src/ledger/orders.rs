use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::{Order, OrderSide, OrderStatus, OrderType};

pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    user_id: Uuid,
    player_id: Uuid,
    side: OrderSide,
    order_type: OrderType,
    quantity: i64,
    limit_price: Option<Decimal>,
) -> Result<Order, sqlx::Error> {
    sqlx::query_as::<_, Order>(
        r#"
        INSERT INTO orders (id, user_id, player_id, side, order_type, quantity, filled_quantity, limit_price, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, 0, $7, 'open', NOW(), NOW())
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(player_id)
    .bind(side)
    .bind(order_type)
    .bind(quantity)
    .bind(limit_price)
    .fetch_one(&mut **tx)
    .await
}

/// Applied after each fill. `status` must be recomputed by the caller —
/// a market order's unfilled residual is `cancelled`, not left `filled`
/// with `filled_quantity < quantity`.
pub async fn apply_fill_tx(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
    filled_delta: i64,
    status: OrderStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE orders SET filled_quantity = filled_quantity + $2, status = $3, updated_at = NOW() WHERE id = $1",
    )
    .bind(order_id)
    .bind(filled_delta)
    .bind(status)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn set_status_tx(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
    status: OrderStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1")
        .bind(order_id)
        .bind(status)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn list_open_for_recovery(pool: &PgPool) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE status IN ('open', 'partial') ORDER BY created_at")
        .fetch_all(pool)
        .await
}

pub async fn list_open_for_player(pool: &PgPool, player_id: Uuid) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE player_id = $1 AND status IN ('open', 'partial') ORDER BY created_at",
    )
    .bind(player_id)
    .fetch_all(pool)
    .await
}

pub async fn list_open_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE user_id = $1 AND status IN ('open', 'partial') ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn list_open_for_user_and_player(pool: &PgPool, user_id: Uuid, player_id: Uuid) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE user_id = $1 AND player_id = $2 AND status IN ('open', 'partial') ORDER BY created_at",
    )
    .bind(user_id)
    .bind(player_id)
    .fetch_all(pool)
    .await
}

/// Distinct players with at least one resting order, letting the bot
/// fleet tell "cold" players (no open interest) from "warm" ones in a
/// single query instead of checking each candidate individually.
pub async fn list_player_ids_with_open_orders(pool: &PgPool) -> Result<Vec<Uuid>, sqlx::Error> {
    sqlx::query_scalar("SELECT DISTINCT player_id FROM orders WHERE status IN ('open', 'partial')")
        .fetch_all(pool)
        .await
}

/// One query for every player shown on a list page, never a per-player
/// loop. Returns the DB-persisted resting orders; the live in-memory book
/// is the matching engine's.
pub async fn get_batch_books(pool: &PgPool, player_ids: &[Uuid]) -> Result<Vec<Order>, sqlx::Error> {
    if player_ids.is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE player_id = ANY($1) AND status IN ('open', 'partial') ORDER BY player_id, created_at",
    )
    .bind(player_ids)
    .fetch_all(pool)
    .await
}

pub async fn count_today_for_user(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM orders WHERE user_id = $1 AND created_at >= date_trunc('day', NOW())",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
}
