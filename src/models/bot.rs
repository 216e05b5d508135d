use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A market-maker bot's tier is a coarse label carried for display; its
/// actual behavior is driven entirely by the numeric fields below. Bots are ordinary `User` rows with `is_bot = true` plus this
/// sidecar profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "bot_tier", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BotTier {
    Conservative,
    Balanced,
    Aggressive,
}

/// Per-bot behavior parameters and daily counters. Counters
/// (`orders_today`, `volume_today`, `contest_entries_today`) reset when
/// `last_reset_date` falls behind the current America/New_York civil date;
/// `last_action_at` backs the per-bot cooldown window sampled uniformly
/// between `min_action_cooldown_ms` and `max_action_cooldown_ms` on every
/// tick.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BotProfile {
    pub user_id: Uuid,
    pub tier: BotTier,
    /// 0.0-1.0: scales order size and how far fair value estimates pull
    /// quotes from the last trade price.
    pub aggressiveness: Decimal,
    pub spread_percent: Decimal,
    pub min_order_size: i64,
    pub max_order_size: i64,
    pub max_daily_orders: i32,
    pub max_daily_volume: i64,
    pub contest_entry_budget: Decimal,
    pub max_contest_entries_per_day: i32,
    pub min_action_cooldown_ms: i64,
    pub max_action_cooldown_ms: i64,
    pub last_action_at: Option<DateTime<Utc>>,
    pub orders_today: i32,
    pub volume_today: i64,
    pub contest_entries_today: i32,
    pub last_reset_date: NaiveDate,
}

/// One bot's estimate of a player's intrinsic value, used to quote around
/// instead of around the last trade price (which a thin book can leave
/// stale). Not persisted; recomputed every bot tick.
#[derive(Debug, Clone, Copy)]
pub struct FairValueEstimate {
    pub player_id: Uuid,
    pub fair_value: Decimal,
}
