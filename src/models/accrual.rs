use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One per user. `residual_ms` carries the sub-millisecond remainder of the
/// last accrual calculation forward so repeated short-interval accruals
/// don't lose fractional shares to truncation. The
/// per-player breakdown of where those shares came from lives in
/// `AccrualSplit`, not here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Accrual {
    pub user_id: Uuid,
    pub shares_accumulated: Decimal,
    pub residual_ms: i64,
    pub last_accrued_at: DateTime<Utc>,
    pub last_claimed_at: Option<DateTime<Utc>>,
    pub cap_reached_at: Option<DateTime<Utc>>,
}

/// A user's per-hour accrual rate allocation to one player. The sum of a
/// user's `AccrualSplit::shares_per_hour` across all players must not exceed
/// `User::accrual_rate_total`; enforced by the accrual engine
/// at `set_splits` time, not by a database constraint.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AccrualSplit {
    pub user_id: Uuid,
    pub player_id: Uuid,
    pub shares_per_hour: i32,
}

#[derive(Debug, Deserialize)]
pub struct SetSplitsRequest {
    pub splits: Vec<SplitEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SplitEntry {
    pub player_id: Uuid,
    pub shares_per_hour: i32,
}

/// Result of a claim: whole shares credited to `Holding`, any leftover
/// fraction stays in `shares_accumulated`.
#[derive(Debug, Clone, Serialize)]
pub struct ClaimResult {
    pub player_id: Uuid,
    pub shares_claimed: i64,
    pub remaining_fractional: Decimal,
}
