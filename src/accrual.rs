//! Accrual Engine: grants each user a fixed shares/hour budget, split
//! across chosen players, with a daily cap and residual-millisecond
//! carry-over so repeated short intervals never lose a fractional share.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::ledger;
use crate::models::{Accrual, AccrualSplit, ClaimResult};

#[derive(Debug, thiserror::Error)]
pub enum AccrualError {
    #[error("invalid splits: {0}")]
    InvalidSplits(String),
    #[error("splits may name at most 10 players")]
    TooManyPlayers,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub struct AccrualEngine {
    pool: PgPool,
}

impl AccrualEngine {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Advances `accrual` to `now` in place. If the daily cap is already
    /// reached, residualMs resets to 0 and no shares are earned; otherwise
    /// `elapsedMs` (wall-clock gap plus carried residual) is converted to
    /// whole shares at `msPerShare = 3_600_000 / rateTotal`, and the
    /// remainder carries forward.
    fn apply_accrual(accrual: &mut Accrual, rate_total: i32, daily_cap: i32, now: DateTime<Utc>) {
        let cap = Decimal::from(daily_cap);
        if accrual.shares_accumulated >= cap {
            accrual.residual_ms = 0;
            accrual.cap_reached_at = Some(now);
            return;
        }

        let elapsed_ms = (now - accrual.last_accrued_at).num_milliseconds().max(0) + accrual.residual_ms;
        let ms_per_share = 3_600_000i64 / rate_total as i64;
        let shares = elapsed_ms / ms_per_share;
        accrual.residual_ms = elapsed_ms % ms_per_share;
        accrual.shares_accumulated = (accrual.shares_accumulated + Decimal::from(shares)).min(cap);
        accrual.last_accrued_at = now;
    }

    pub async fn accrue(&self, user_id: Uuid) -> Result<Accrual, AccrualError> {
        let user = ledger::users::get_by_id(&self.pool, user_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let mut tx = self.pool.begin().await?;
        let mut accrual = ledger::accrual::get_or_create_tx(&mut tx, user_id).await?;
        Self::apply_accrual(&mut accrual, user.accrual_rate_total(), user.accrual_daily_cap(), Utc::now());
        ledger::accrual::save_tx(&mut tx, &accrual).await?;
        tx.commit().await?;

        Ok(accrual)
    }

    /// Advances accrual to now, then distributes the whole accumulator
    /// across the user's splits and resets it to zero. Shares land in
    /// holdings at cost basis 0.
    pub async fn claim(&self, user_id: Uuid) -> Result<Vec<ClaimResult>, AccrualError> {
        let user = ledger::users::get_by_id(&self.pool, user_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let mut tx = self.pool.begin().await?;
        let mut accrual = ledger::accrual::get_or_create_tx(&mut tx, user_id).await?;
        Self::apply_accrual(&mut accrual, user.accrual_rate_total(), user.accrual_daily_cap(), Utc::now());

        let splits = ledger::accrual::get_splits(&self.pool, user_id).await?;
        let total_shares = accrual.shares_accumulated.to_i64().unwrap_or(0);
        let results = distribute_shares(total_shares, &splits);

        for result in &results {
            if result.shares_claimed > 0 {
                ledger::holdings::add_quantity_tx(&mut tx, user_id, result.player_id, result.shares_claimed, Decimal::ZERO).await?;
            }
        }

        let now = Utc::now();
        accrual.shares_accumulated = Decimal::ZERO;
        accrual.residual_ms = 0;
        accrual.last_accrued_at = now;
        accrual.last_claimed_at = Some(now);
        accrual.cap_reached_at = None;
        ledger::accrual::save_tx(&mut tx, &accrual).await?;

        tx.commit().await?;
        Ok(results)
    }

    /// Replaces the user's splits with an even division of their current
    /// rate across `player_ids`, auto-claiming whatever is already
    /// accumulated first so no shares are lost to the reallocation.
    pub async fn set_splits(&self, user_id: Uuid, player_ids: Vec<Uuid>) -> Result<Vec<AccrualSplit>, AccrualError> {
        if player_ids.is_empty() {
            return Err(AccrualError::InvalidSplits("at least one player is required".into()));
        }
        if player_ids.len() > 10 {
            return Err(AccrualError::TooManyPlayers);
        }
        let mut seen = std::collections::HashSet::new();
        if !player_ids.iter().all(|id| seen.insert(*id)) {
            return Err(AccrualError::InvalidSplits("duplicate player in splits".into()));
        }

        self.claim(user_id).await?;

        let user = ledger::users::get_by_id(&self.pool, user_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let n = player_ids.len() as i32;
        let rate_total = user.accrual_rate_total();
        let base = rate_total / n;
        let remainder = rate_total % n;

        let splits: Vec<(Uuid, i32)> = player_ids
            .iter()
            .enumerate()
            .map(|(i, pid)| {
                let rate = if (i as i32) < remainder { base + 1 } else { base };
                (*pid, rate)
            })
            .collect();

        let mut tx = self.pool.begin().await?;
        ledger::accrual::replace_splits_tx(&mut tx, user_id, &splits).await?;
        let mut accrual = ledger::accrual::get_or_create_tx(&mut tx, user_id).await?;
        accrual.last_accrued_at = Utc::now();
        accrual.residual_ms = 0;
        accrual.cap_reached_at = None;
        ledger::accrual::save_tx(&mut tx, &accrual).await?;
        tx.commit().await?;

        Ok(ledger::accrual::get_splits(&self.pool, user_id).await?)
    }
}

/// `splits` must already be ordered descending by `shares_per_hour` (the
/// order `ledger::accrual::get_splits` returns) -- the remainder from
/// integer floor division goes to the first entries in that order.
fn distribute_shares(total_shares: i64, splits: &[AccrualSplit]) -> Vec<ClaimResult> {
    if splits.is_empty() || total_shares <= 0 {
        return Vec::new();
    }

    let rate_sum: i64 = splits.iter().map(|s| s.shares_per_hour as i64).sum();
    if rate_sum == 0 {
        return Vec::new();
    }

    let mut distributed = 0i64;
    let mut results: Vec<ClaimResult> = splits
        .iter()
        .map(|split| {
            let share = total_shares * split.shares_per_hour as i64 / rate_sum;
            distributed += share;
            ClaimResult {
                player_id: split.player_id,
                shares_claimed: share,
                remaining_fractional: Decimal::ZERO,
            }
        })
        .collect();

    let mut remainder = total_shares - distributed;
    let mut i = 0;
    while remainder > 0 && i < results.len() {
        results[i].shares_claimed += 1;
        remainder -= 1;
        i += 1;
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn fresh(now: DateTime<Utc>) -> Accrual {
        Accrual {
            user_id: Uuid::new_v4(),
            shares_accumulated: Decimal::ZERO,
            residual_ms: 0,
            last_accrued_at: now,
            last_claimed_at: None,
            cap_reached_at: None,
        }
    }

    #[test]
    fn free_user_119_seconds_earns_3_shares_with_11s_residual() {
        let t0 = Utc::now();
        let mut accrual = fresh(t0);
        let t1 = t0 + chrono::Duration::milliseconds(119_000);

        AccrualEngine::apply_accrual(&mut accrual, 100, 2_400, t1);

        assert_eq!(accrual.shares_accumulated, Decimal::from(3));
        assert_eq!(accrual.residual_ms, 11_000);
    }

    #[test]
    fn accruing_zero_elapsed_time_is_a_no_op() {
        let t0 = Utc::now();
        let mut accrual = fresh(t0);
        let t1 = t0 + chrono::Duration::milliseconds(119_000);
        AccrualEngine::apply_accrual(&mut accrual, 100, 2_400, t1);
        let after_first = accrual.clone();

        AccrualEngine::apply_accrual(&mut accrual, 100, 2_400, t1);

        assert_eq!(accrual.shares_accumulated, after_first.shares_accumulated);
        assert_eq!(accrual.residual_ms, after_first.residual_ms);
    }

    #[test]
    fn cap_reached_stops_earning_and_zeroes_residual() {
        let t0 = Utc::now();
        let mut accrual = fresh(t0);
        accrual.shares_accumulated = Decimal::from(2_400);
        accrual.residual_ms = 500;

        let t1 = t0 + chrono::Duration::hours(1);
        AccrualEngine::apply_accrual(&mut accrual, 100, 2_400, t1);

        assert_eq!(accrual.shares_accumulated, Decimal::from(2_400));
        assert_eq!(accrual.residual_ms, 0);
        assert_eq!(accrual.cap_reached_at, Some(t1));
    }

    #[test]
    fn distribute_shares_gives_remainder_to_earlier_splits_in_descending_order() {
        let splits = vec![
            AccrualSplit { user_id: Uuid::new_v4(), player_id: Uuid::new_v4(), shares_per_hour: 60 },
            AccrualSplit { user_id: Uuid::new_v4(), player_id: Uuid::new_v4(), shares_per_hour: 40 },
        ];
        let results = distribute_shares(7, &splits);
        // 7 * 60/100 = 4.2 -> 4, 7 * 40/100 = 2.8 -> 2, distributed=6, remainder=1 to first.
        assert_eq!(results[0].shares_claimed, 5);
        assert_eq!(results[1].shares_claimed, 2);
    }
}
