use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::{Holding, HoldingWithPlayer};

pub async fn get(pool: &PgPool, user_id: Uuid, player_id: Uuid) -> Result<Option<Holding>, sqlx::Error> {
    sqlx::query_as::<_, Holding>("SELECT * FROM holdings WHERE user_id = $1 AND player_id = $2")
        .bind(user_id)
        .bind(player_id)
        .fetch_optional(pool)
        .await
}

/// Batch fetch across player ids for one user, backing order-book and
/// market pages that must show "your position" without an N+1 loop.
pub async fn get_batch(pool: &PgPool, user_id: Uuid, player_ids: &[Uuid]) -> Result<Vec<Holding>, sqlx::Error> {
    if player_ids.is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_as::<_, Holding>("SELECT * FROM holdings WHERE user_id = $1 AND player_id = ANY($2)")
        .bind(user_id)
        .bind(player_ids)
        .fetch_all(pool)
        .await
}

/// Single-join batch view for a user's portfolio page: every holding with
/// its player row attached, one query regardless of holding count.
pub async fn get_user_holdings_with_players(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<HoldingWithPlayer>, sqlx::Error> {
    sqlx::query_as::<_, HoldingWithPlayer>(
        r#"
        SELECT h.player_id, p.name, p.team, p.position, h.quantity, h.avg_cost_basis, p.last_trade_price
        FROM holdings h
        JOIN players p ON p.id = h.player_id
        WHERE h.user_id = $1 AND h.quantity > 0
        ORDER BY p.name
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn get_for_update_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    player_id: Uuid,
) -> Result<Option<Holding>, sqlx::Error> {
    sqlx::query_as::<_, Holding>(
        "SELECT * FROM holdings WHERE user_id = $1 AND player_id = $2 FOR UPDATE",
    )
    .bind(user_id)
    .bind(player_id)
    .fetch_optional(&mut **tx)
    .await
}

/// Sum of all outstanding locks (open orders plus pending contest entries)
/// against one holding, used to compute how many shares are actually free
/// to spend on a new contest entry.
pub async fn locked_quantity_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    player_id: Uuid,
) -> Result<i64, sqlx::Error> {
    let locked: Option<i64> = sqlx::query_scalar(
        "SELECT SUM(quantity) FROM holdings_locks WHERE user_id = $1 AND player_id = $2",
    )
    .bind(user_id)
    .bind(player_id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(locked.unwrap_or(0))
}

/// Increase a holding's quantity, recomputing `avg_cost_basis` against the
/// fill price. `price` is the fill price for a trade, or `Decimal::ZERO`
/// for accrual claims.
pub async fn add_quantity_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    player_id: Uuid,
    quantity: i64,
    price: Decimal,
) -> Result<(), sqlx::Error> {
    let existing = get_for_update_tx(tx, user_id, player_id).await?;
    let added_cost = Decimal::from(quantity) * price;

    match existing {
        Some(holding) => {
            let new_quantity = holding.quantity + quantity;
            let new_total_cost = holding.total_cost_basis + added_cost;
            let new_avg = if new_quantity > 0 {
                new_total_cost / Decimal::from(new_quantity)
            } else {
                Decimal::ZERO
            };
            sqlx::query(
                "UPDATE holdings SET quantity = $3, avg_cost_basis = $4, total_cost_basis = $5 WHERE user_id = $1 AND player_id = $2",
            )
            .bind(user_id)
            .bind(player_id)
            .bind(new_quantity)
            .bind(new_avg)
            .bind(new_total_cost)
            .execute(&mut **tx)
            .await?;
        }
        None => {
            let avg = if quantity > 0 { price } else { Decimal::ZERO };
            sqlx::query(
                "INSERT INTO holdings (user_id, player_id, quantity, avg_cost_basis, total_cost_basis) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(user_id)
            .bind(player_id)
            .bind(quantity)
            .bind(avg)
            .bind(added_cost)
            .execute(&mut **tx)
            .await?;
        }
    }

    Ok(())
}

/// Decrease a holding's quantity. `avg_cost_basis` and `total_cost_basis`
/// are left untouched; used both for trade settlement and contest-entry
/// share burning.
pub async fn subtract_quantity_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    player_id: Uuid,
    quantity: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE holdings SET quantity = quantity - $3 WHERE user_id = $1 AND player_id = $2")
        .bind(user_id)
        .bind(player_id)
        .bind(quantity)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
