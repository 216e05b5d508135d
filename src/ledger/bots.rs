use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::BotProfile;

pub async fn get(pool: &PgPool, user_id: Uuid) -> Result<Option<BotProfile>, sqlx::Error> {
    sqlx::query_as::<_, BotProfile>("SELECT * FROM bot_profiles WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<BotProfile>, sqlx::Error> {
    sqlx::query_as::<_, BotProfile>("SELECT * FROM bot_profiles ORDER BY user_id")
        .fetch_all(pool)
        .await
}

/// Bots whose cooldown window (sampled between `min_action_cooldown_ms` and
/// `max_action_cooldown_ms` and stashed by the caller on `last_action_at`)
/// has elapsed, so the scheduler's bot tick skips bots that already acted
/// recently instead of waking every bot every tick.
pub async fn list_due_for_tick(pool: &PgPool) -> Result<Vec<BotProfile>, sqlx::Error> {
    sqlx::query_as::<_, BotProfile>(
        r#"
        SELECT * FROM bot_profiles
        WHERE last_action_at IS NULL
           OR last_action_at + (min_action_cooldown_ms || ' milliseconds')::interval <= NOW()
        "#,
    )
    .fetch_all(pool)
    .await
}

#[allow(clippy::too_many_arguments)]
pub async fn insert(
    pool: &PgPool,
    profile: &BotProfile,
) -> Result<BotProfile, sqlx::Error> {
    sqlx::query_as::<_, BotProfile>(
        r#"
        INSERT INTO bot_profiles (
            user_id, tier, aggressiveness, spread_percent, min_order_size, max_order_size,
            max_daily_orders, max_daily_volume, contest_entry_budget, max_contest_entries_per_day,
            min_action_cooldown_ms, max_action_cooldown_ms, last_action_at,
            orders_today, volume_today, contest_entries_today, last_reset_date
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, 0, 0, 0, $14)
        RETURNING *
        "#,
    )
    .bind(profile.user_id)
    .bind(profile.tier)
    .bind(profile.aggressiveness)
    .bind(profile.spread_percent)
    .bind(profile.min_order_size)
    .bind(profile.max_order_size)
    .bind(profile.max_daily_orders)
    .bind(profile.max_daily_volume)
    .bind(profile.contest_entry_budget)
    .bind(profile.max_contest_entries_per_day)
    .bind(profile.min_action_cooldown_ms)
    .bind(profile.max_action_cooldown_ms)
    .bind(profile.last_action_at)
    .bind(profile.last_reset_date)
    .fetch_one(pool)
    .await
}

pub async fn get_for_update_tx(tx: &mut Transaction<'_, Postgres>, user_id: Uuid) -> Result<Option<BotProfile>, sqlx::Error> {
    sqlx::query_as::<_, BotProfile>("SELECT * FROM bot_profiles WHERE user_id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await
}

/// Resets the daily counters if `last_reset_date` is behind `today`. Must
/// be called inside the same transaction that later increments the
/// counters for this tick, since the row is locked by the prior
/// `get_for_update_tx` call.
pub async fn reset_daily_counters_if_new_day_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    today: NaiveDate,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE bot_profiles SET
            orders_today = 0,
            volume_today = 0,
            contest_entries_today = 0,
            last_reset_date = $2
        WHERE user_id = $1 AND last_reset_date < $2
        "#,
    )
    .bind(user_id)
    .bind(today)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn record_order_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    volume: i64,
    acted_at: chrono::DateTime<chrono::Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE bot_profiles SET
            orders_today = orders_today + 1,
            volume_today = volume_today + $2,
            last_action_at = $3
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .bind(volume)
    .bind(acted_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn record_contest_entry_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    acted_at: chrono::DateTime<chrono::Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE bot_profiles SET contest_entries_today = contest_entries_today + 1, last_action_at = $2 WHERE user_id = $1",
    )
    .bind(user_id)
    .bind(acted_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn touch_last_action_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    acted_at: chrono::DateTime<chrono::Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE bot_profiles SET last_action_at = $2 WHERE user_id = $1")
        .bind(user_id)
        .bind(acted_at)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
