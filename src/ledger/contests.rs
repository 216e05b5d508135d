use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::{Contest, ContestEntry, ContestLineup, ContestStatus};

pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Contest>, sqlx::Error> {
    sqlx::query_as::<_, Contest>("SELECT * FROM contests WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn get_by_game_day(pool: &PgPool, game_day: NaiveDate) -> Result<Option<Contest>, sqlx::Error> {
    sqlx::query_as::<_, Contest>("SELECT * FROM contests WHERE game_day = $1")
        .bind(game_day)
        .fetch_optional(pool)
        .await
}

pub async fn create(
    pool: &PgPool,
    game_day: NaiveDate,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    entry_fee: i64,
) -> Result<Contest, sqlx::Error> {
    sqlx::query_as::<_, Contest>(
        r#"
        INSERT INTO contests (id, game_day, status, starts_at, ends_at, entry_fee, entry_count, total_prize_pool, total_shares_entered)
        VALUES ($1, $2, 'open', $3, $4, $5, 0, 0, 0)
        ON CONFLICT (game_day) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(game_day)
    .bind(starts_at)
    .bind(ends_at)
    .bind(entry_fee)
    .fetch_one(pool)
    .await
}

pub async fn list_open(pool: &PgPool) -> Result<Vec<Contest>, sqlx::Error> {
    sqlx::query_as::<_, Contest>("SELECT * FROM contests WHERE status = 'open' ORDER BY starts_at")
        .fetch_all(pool)
        .await
}

pub async fn list_by_status(pool: &PgPool, status: ContestStatus) -> Result<Vec<Contest>, sqlx::Error> {
    sqlx::query_as::<_, Contest>("SELECT * FROM contests WHERE status = $1")
        .bind(status)
        .fetch_all(pool)
        .await
}

pub async fn get_for_update_tx(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> Result<Option<Contest>, sqlx::Error> {
    sqlx::query_as::<_, Contest>("SELECT * FROM contests WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
}

pub async fn set_status_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    status: ContestStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE contests SET status = $2 WHERE id = $1")
        .bind(id)
        .bind(status)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn adjust_aggregate_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    entry_count_delta: i32,
    shares_delta: i64,
    prize_pool_delta: Decimal,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE contests SET
            entry_count = entry_count + $2,
            total_shares_entered = total_shares_entered + $3,
            total_prize_pool = total_prize_pool + $4
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(entry_count_delta)
    .bind(shares_delta)
    .bind(prize_pool_delta)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn get_entry(pool: &PgPool, entry_id: Uuid) -> Result<Option<ContestEntry>, sqlx::Error> {
    sqlx::query_as::<_, ContestEntry>("SELECT * FROM contest_entries WHERE id = $1")
        .bind(entry_id)
        .fetch_optional(pool)
        .await
}

pub async fn get_entry_tx(tx: &mut Transaction<'_, Postgres>, entry_id: Uuid) -> Result<Option<ContestEntry>, sqlx::Error> {
    sqlx::query_as::<_, ContestEntry>("SELECT * FROM contest_entries WHERE id = $1 FOR UPDATE")
        .bind(entry_id)
        .fetch_optional(&mut **tx)
        .await
}

pub async fn get_entry_for_user(pool: &PgPool, contest_id: Uuid, user_id: Uuid) -> Result<Option<ContestEntry>, sqlx::Error> {
    sqlx::query_as::<_, ContestEntry>("SELECT * FROM contest_entries WHERE contest_id = $1 AND user_id = $2")
        .bind(contest_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_entries(pool: &PgPool, contest_id: Uuid) -> Result<Vec<ContestEntry>, sqlx::Error> {
    sqlx::query_as::<_, ContestEntry>("SELECT * FROM contest_entries WHERE contest_id = $1")
        .bind(contest_id)
        .fetch_all(pool)
        .await
}

pub async fn insert_entry_tx(
    tx: &mut Transaction<'_, Postgres>,
    contest_id: Uuid,
    user_id: Uuid,
) -> Result<ContestEntry, sqlx::Error> {
    sqlx::query_as::<_, ContestEntry>(
        r#"
        INSERT INTO contest_entries (id, contest_id, user_id, total_shares_entered, total_score, rank, payout, created_at)
        VALUES ($1, $2, $3, 0, 0, NULL, NULL, NOW())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(contest_id)
    .bind(user_id)
    .fetch_one(&mut **tx)
    .await
}

pub async fn adjust_entry_shares_tx(
    tx: &mut Transaction<'_, Postgres>,
    entry_id: Uuid,
    shares_delta: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE contest_entries SET total_shares_entered = total_shares_entered + $2 WHERE id = $1")
        .bind(entry_id)
        .bind(shares_delta)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn get_lineup(pool: &PgPool, entry_id: Uuid) -> Result<Vec<ContestLineup>, sqlx::Error> {
    sqlx::query_as::<_, ContestLineup>("SELECT * FROM contest_lineups WHERE entry_id = $1")
        .bind(entry_id)
        .fetch_all(pool)
        .await
}

pub async fn get_lineup_tx(tx: &mut Transaction<'_, Postgres>, entry_id: Uuid) -> Result<Vec<ContestLineup>, sqlx::Error> {
    sqlx::query_as::<_, ContestLineup>("SELECT * FROM contest_lineups WHERE entry_id = $1 FOR UPDATE")
        .bind(entry_id)
        .fetch_all(&mut **tx)
        .await
}

/// Replaces an entry's lineup wholesale. Callers compute share deltas
/// themselves before calling this -- this function only persists the new
/// rows.
pub async fn replace_lineup_tx(
    tx: &mut Transaction<'_, Postgres>,
    entry_id: Uuid,
    rows: &[(Uuid, i64)],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM contest_lineups WHERE entry_id = $1")
        .bind(entry_id)
        .execute(&mut **tx)
        .await?;

    for (player_id, shares_entered) in rows {
        sqlx::query(
            "INSERT INTO contest_lineups (entry_id, player_id, shares_entered) VALUES ($1, $2, $3)",
        )
        .bind(entry_id)
        .bind(player_id)
        .bind(shares_entered)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

/// All lineup rows for every entry in a contest in one query, used by the
/// scoring pass to compute each player's total shares entered across all
/// entries.
pub async fn get_all_lineups_for_contest(pool: &PgPool, contest_id: Uuid) -> Result<Vec<ContestLineup>, sqlx::Error> {
    sqlx::query_as::<_, ContestLineup>(
        r#"
        SELECT l.entry_id, l.player_id, l.shares_entered, l.fantasy_points, l.earned_score
        FROM contest_entries e
        JOIN contest_lineups l ON l.entry_id = e.id
        WHERE e.contest_id = $1
        "#,
    )
    .bind(contest_id)
    .fetch_all(pool)
    .await
}

pub async fn set_lineup_row_score_tx(
    tx: &mut Transaction<'_, Postgres>,
    entry_id: Uuid,
    player_id: Uuid,
    fantasy_points: Decimal,
    earned_score: Decimal,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE contest_lineups SET fantasy_points = $3, earned_score = $4 WHERE entry_id = $1 AND player_id = $2",
    )
    .bind(entry_id)
    .bind(player_id)
    .bind(fantasy_points)
    .bind(earned_score)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn set_entry_score_tx(
    tx: &mut Transaction<'_, Postgres>,
    entry_id: Uuid,
    total_score: Decimal,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE contest_entries SET total_score = $2 WHERE id = $1")
        .bind(entry_id)
        .bind(total_score)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn set_entry_rank_and_payout_tx(
    tx: &mut Transaction<'_, Postgres>,
    entry_id: Uuid,
    rank: i32,
    payout: Option<Decimal>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE contest_entries SET rank = $2, payout = $3 WHERE id = $1")
        .bind(entry_id)
        .bind(rank)
        .bind(payout)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn leaderboard(pool: &PgPool, contest_id: Uuid) -> Result<Vec<(Uuid, String, Decimal, Option<Decimal>, Option<i32>)>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT u.id, u.username, e.total_score, e.payout, e.rank
        FROM contest_entries e
        JOIN users u ON u.id = e.user_id
        WHERE e.contest_id = $1
        ORDER BY e.total_score DESC, e.created_at ASC
        "#,
    )
    .bind(contest_id)
    .fetch_all(pool)
    .await
}
