use chrono::NaiveDate;
use sqlx::PgPool;

use crate::models::PortfolioSnapshot;

/// Writes every active (non-bot) user's rank for `day` in one query using
/// window functions, rather than a per-user ranking loop.
pub async fn write_daily(pool: &PgPool, day: NaiveDate) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        WITH ranked AS (
            SELECT
                u.id AS user_id,
                u.balance AS cash_balance,
                u.balance + COALESCE(SUM(h.quantity * COALESCE(p.last_trade_price, 0)), 0) AS portfolio_value
            FROM users u
            LEFT JOIN holdings h ON h.user_id = u.id
            LEFT JOIN players p ON p.id = h.player_id
            WHERE u.is_bot = false
            GROUP BY u.id
        )
        INSERT INTO portfolio_snapshots (user_id, snapshot_date, cash_balance, portfolio_value, cash_rank, portfolio_rank)
        SELECT
            user_id,
            $1,
            cash_balance,
            portfolio_value,
            RANK() OVER (ORDER BY cash_balance DESC),
            RANK() OVER (ORDER BY portfolio_value DESC)
        FROM ranked
        ON CONFLICT (user_id, snapshot_date) DO UPDATE SET
            cash_balance = EXCLUDED.cash_balance,
            portfolio_value = EXCLUDED.portfolio_value,
            cash_rank = EXCLUDED.cash_rank,
            portfolio_rank = EXCLUDED.portfolio_rank
        "#,
    )
    .bind(day)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn get_for_user(
    pool: &PgPool,
    user_id: uuid::Uuid,
    limit: i64,
) -> Result<Vec<PortfolioSnapshot>, sqlx::Error> {
    sqlx::query_as::<_, PortfolioSnapshot>(
        "SELECT * FROM portfolio_snapshots WHERE user_id = $1 ORDER BY snapshot_date DESC LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}
