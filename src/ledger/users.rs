use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::User;

pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn get_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await
}

pub async fn create(pool: &PgPool, username: &str) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, username, balance, is_premium, premium_expires_at, is_admin, is_bot, created_at, updated_at)
        VALUES ($1, $2, 0, false, NULL, false, false, NOW(), NOW())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .fetch_one(pool)
    .await
}

pub async fn create_bot(pool: &PgPool, username: &str) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, username, balance, is_premium, premium_expires_at, is_admin, is_bot, created_at, updated_at)
        VALUES ($1, $2, 0, false, NULL, false, true, NOW(), NOW())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .fetch_one(pool)
    .await
}

/// Credit `amount` onto a user's cash balance within an already-open
/// transaction. Callers are expected to hold the row lock acquired by the
/// lock manager or their own `SELECT ... FOR UPDATE`.
pub async fn credit_balance_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    amount: Decimal,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET balance = balance + $2, updated_at = NOW() WHERE id = $1")
        .bind(user_id)
        .bind(amount)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn debit_balance_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    amount: Decimal,
) -> Result<(), sqlx::Error> {
    credit_balance_tx(tx, user_id, -amount).await
}

pub async fn grant_premium(
    pool: &PgPool,
    user_id: Uuid,
    expires_at: chrono::DateTime<chrono::Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET is_premium = true, premium_expires_at = $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(user_id)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list_bots(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE is_bot = true")
        .fetch_all(pool)
        .await
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct LeaderboardCandidate {
    pub user_id: Uuid,
    pub username: String,
    pub value: Decimal,
}

/// One query per leaderboard category, never a per-user loop.
pub async fn leaderboard_cash_balance(pool: &PgPool, limit: i64) -> Result<Vec<LeaderboardCandidate>, sqlx::Error> {
    sqlx::query_as::<_, LeaderboardRow>(
        "SELECT id, username, balance AS value FROM users WHERE is_bot = false ORDER BY balance DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .map(|rows| rows.into_iter().map(Into::into).collect())
}

pub async fn leaderboard_net_worth(pool: &PgPool, limit: i64) -> Result<Vec<LeaderboardCandidate>, sqlx::Error> {
    sqlx::query_as::<_, LeaderboardRow>(
        r#"
        SELECT u.id, u.username,
            u.balance + COALESCE((
                SELECT SUM(h.quantity * COALESCE(p.last_trade_price, 0))
                FROM holdings h JOIN players p ON p.id = h.player_id
                WHERE h.user_id = u.id
            ), 0) AS value
        FROM users u
        WHERE u.is_bot = false
        ORDER BY value DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .map(|rows| rows.into_iter().map(Into::into).collect())
}

pub async fn leaderboard_portfolio_value(pool: &PgPool, limit: i64) -> Result<Vec<LeaderboardCandidate>, sqlx::Error> {
    sqlx::query_as::<_, LeaderboardRow>(
        r#"
        SELECT u.id, u.username,
            COALESCE((
                SELECT SUM(h.quantity * COALESCE(p.last_trade_price, 0))
                FROM holdings h JOIN players p ON p.id = h.player_id
                WHERE h.user_id = u.id
            ), 0) AS value
        FROM users u
        WHERE u.is_bot = false
        ORDER BY value DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .map(|rows| rows.into_iter().map(Into::into).collect())
}

pub async fn leaderboard_shares_mined(pool: &PgPool, limit: i64) -> Result<Vec<LeaderboardCandidate>, sqlx::Error> {
    sqlx::query_as::<_, LeaderboardRow>(
        r#"
        SELECT u.id, u.username, COALESCE(a.shares_accumulated, 0) AS value
        FROM users u
        LEFT JOIN accrual a ON a.user_id = u.id
        WHERE u.is_bot = false
        ORDER BY value DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .map(|rows| rows.into_iter().map(Into::into).collect())
}

pub async fn leaderboard_market_orders(pool: &PgPool, limit: i64) -> Result<Vec<LeaderboardCandidate>, sqlx::Error> {
    sqlx::query_as::<_, LeaderboardRow>(
        r#"
        SELECT u.id, u.username, COUNT(o.id)::numeric AS value
        FROM users u
        LEFT JOIN orders o ON o.user_id = u.id
        WHERE u.is_bot = false
        GROUP BY u.id, u.username
        ORDER BY value DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .map(|rows| rows.into_iter().map(Into::into).collect())
}

#[derive(Debug, sqlx::FromRow)]
struct LeaderboardRow {
    id: Uuid,
    username: String,
    value: Decimal,
}

impl From<LeaderboardRow> for LeaderboardCandidate {
    fn from(row: LeaderboardRow) -> Self {
        Self {
            user_id: row.id,
            username: row.username,
            value: row.value,
        }
    }
}
