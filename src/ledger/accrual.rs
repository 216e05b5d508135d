use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::{Accrual, AccrualSplit};

pub async fn get_or_create_tx(tx: &mut Transaction<'_, Postgres>, user_id: Uuid) -> Result<Accrual, sqlx::Error> {
    let existing = sqlx::query_as::<_, Accrual>(
        "SELECT * FROM accrual WHERE user_id = $1 FOR UPDATE",
    )
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?;

    if let Some(accrual) = existing {
        return Ok(accrual);
    }

    sqlx::query_as::<_, Accrual>(
        r#"
        INSERT INTO accrual (user_id, shares_accumulated, residual_ms, last_accrued_at, last_claimed_at, cap_reached_at)
        VALUES ($1, 0, 0, NOW(), NULL, NULL)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .fetch_one(&mut **tx)
    .await
}

pub async fn save_tx(tx: &mut Transaction<'_, Postgres>, accrual: &Accrual) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE accrual SET
            shares_accumulated = $2,
            residual_ms = $3,
            last_accrued_at = $4,
            last_claimed_at = $5,
            cap_reached_at = $6
        WHERE user_id = $1
        "#,
    )
    .bind(accrual.user_id)
    .bind(accrual.shares_accumulated)
    .bind(accrual.residual_ms)
    .bind(accrual.last_accrued_at)
    .bind(accrual.last_claimed_at)
    .bind(accrual.cap_reached_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn get_splits(pool: &PgPool, user_id: Uuid) -> Result<Vec<AccrualSplit>, sqlx::Error> {
    sqlx::query_as::<_, AccrualSplit>(
        "SELECT * FROM accrual_splits WHERE user_id = $1 ORDER BY shares_per_hour DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn replace_splits_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    splits: &[(Uuid, i32)],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM accrual_splits WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

    for (player_id, shares_per_hour) in splits {
        sqlx::query(
            "INSERT INTO accrual_splits (user_id, player_id, shares_per_hour) VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(player_id)
        .bind(shares_per_hour)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

pub async fn list_all_active(pool: &PgPool) -> Result<Vec<Accrual>, sqlx::Error> {
    sqlx::query_as::<_, Accrual>("SELECT * FROM accrual").fetch_all(pool).await
}
