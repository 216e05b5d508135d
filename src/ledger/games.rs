use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{fantasy_points, BoxScoreLine, Game, GameStatus, GameUpsert, PlayerGameStat};

pub async fn upsert_game(pool: &PgPool, payload: &GameUpsert) -> Result<Game, sqlx::Error> {
    let game_day = crate::timeutil::game_day(payload.starts_at);
    sqlx::query_as::<_, Game>(
        r#"
        INSERT INTO games (id, external_id, home_team, away_team, game_day, starts_at, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (external_id) DO UPDATE SET
            home_team = EXCLUDED.home_team,
            away_team = EXCLUDED.away_team,
            starts_at = EXCLUDED.starts_at,
            status = EXCLUDED.status
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&payload.external_id)
    .bind(&payload.home_team)
    .bind(&payload.away_team)
    .bind(game_day)
    .bind(payload.starts_at)
    .bind(payload.status)
    .fetch_one(pool)
    .await
}

pub async fn get_games_by_day(pool: &PgPool, day: NaiveDate) -> Result<Vec<Game>, sqlx::Error> {
    sqlx::query_as::<_, Game>("SELECT * FROM games WHERE game_day = $1 ORDER BY starts_at")
        .bind(day)
        .fetch_all(pool)
        .await
}

pub async fn list_in_progress(pool: &PgPool) -> Result<Vec<Game>, sqlx::Error> {
    sqlx::query_as::<_, Game>("SELECT * FROM games WHERE status = 'inprogress'")
        .fetch_all(pool)
        .await
}

pub async fn set_status(pool: &PgPool, id: Uuid, status: GameStatus) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE games SET status = $2 WHERE id = $1")
        .bind(id)
        .bind(status)
        .execute(pool)
        .await?;
    Ok(())
}

/// Normalizes one provider box-score line, computes fantasy points once,
/// and upserts the row so every later scoring pass reads the precomputed
/// value instead of recomputing it.
pub async fn upsert_player_stat(
    pool: &PgPool,
    player_id: Uuid,
    game_id: Uuid,
    line: BoxScoreLine,
) -> Result<PlayerGameStat, sqlx::Error> {
    let points = fantasy_points(line);
    sqlx::query_as::<_, PlayerGameStat>(
        r#"
        INSERT INTO player_game_stats (player_id, game_id, pts, three_pm, reb, ast, stl, blk, tov, fantasy_points)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (player_id, game_id) DO UPDATE SET
            pts = EXCLUDED.pts,
            three_pm = EXCLUDED.three_pm,
            reb = EXCLUDED.reb,
            ast = EXCLUDED.ast,
            stl = EXCLUDED.stl,
            blk = EXCLUDED.blk,
            tov = EXCLUDED.tov,
            fantasy_points = EXCLUDED.fantasy_points
        RETURNING *
        "#,
    )
    .bind(player_id)
    .bind(game_id)
    .bind(line.pts)
    .bind(line.three_pm)
    .bind(line.reb)
    .bind(line.ast)
    .bind(line.stl)
    .bind(line.blk)
    .bind(line.tov)
    .bind(points)
    .fetch_one(pool)
    .await
}

/// Sums each player's fantasy points across every game played on `day`,
/// the input a contest settlement pass needs for its whole roster at once.
pub async fn fantasy_points_for_day(
    pool: &PgPool,
    player_ids: &[Uuid],
    day: NaiveDate,
) -> Result<HashMap<Uuid, Decimal>, sqlx::Error> {
    if player_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(Uuid, Decimal)> = sqlx::query_as(
        r#"
        SELECT s.player_id, SUM(s.fantasy_points) AS total
        FROM player_game_stats s
        JOIN games g ON g.id = s.game_id
        WHERE g.game_day = $1 AND s.player_id = ANY($2)
        GROUP BY s.player_id
        "#,
    )
    .bind(day)
    .bind(player_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().collect())
}

/// A player's most recent fantasy-point outings, newest first, feeding the
/// bot fleet's fair-value momentum calculation.
pub async fn recent_fantasy_points(
    pool: &PgPool,
    player_id: Uuid,
    limit: i64,
) -> Result<Vec<Decimal>, sqlx::Error> {
    let rows: Vec<(Decimal,)> = sqlx::query_as(
        r#"
        SELECT s.fantasy_points
        FROM player_game_stats s
        JOIN games g ON g.id = s.game_id
        WHERE s.player_id = $1 AND g.status = 'completed'
        ORDER BY g.starts_at DESC
        LIMIT $2
        "#,
    )
    .bind(player_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(v,)| v).collect())
}
