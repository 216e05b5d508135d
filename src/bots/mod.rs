//! Bot Fleet: a roster of market-maker and accrual bots, each an ordinary
//! `User` with a `BotProfile` sidecar, ticked on a schedule. Every eligible
//! bot runs four independent strategies per tick, each under its own
//! timeout so one hung strategy can't starve the rest of the fleet.

pub mod fair_value;
mod strategies;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use sqlx::PgPool;

use crate::accrual::AccrualEngine;
use crate::contest::ContestEngine;
use crate::ledger;
use crate::locks::LockManager;
use crate::matching::MatchingEngine;
use crate::models::BotProfile;
use crate::websocket::messages::Broadcaster;

const STRATEGY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Lock(#[from] crate::locks::LockError),
    #[error(transparent)]
    Matching(#[from] crate::matching::MatchingError),
    #[error(transparent)]
    Accrual(#[from] crate::accrual::AccrualError),
    #[error(transparent)]
    Contest(#[from] crate::contest::ContestError),
    #[error("strategy timed out")]
    Timeout,
}

impl From<tokio::time::error::Elapsed> for BotError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        BotError::Timeout
    }
}

#[derive(Debug, Default, Clone, Copy, serde::Serialize)]
pub struct TickSummary {
    pub bots_considered: usize,
    pub bots_acted: usize,
    pub strategy_errors: usize,
}

pub struct BotFleet {
    pool: PgPool,
    locks: Arc<LockManager>,
    matching: Arc<MatchingEngine>,
    accrual: Arc<AccrualEngine>,
    contests: Arc<ContestEngine>,
    broadcast: Broadcaster,
}

impl BotFleet {
    pub fn new(
        pool: PgPool,
        locks: Arc<LockManager>,
        matching: Arc<MatchingEngine>,
        accrual: Arc<AccrualEngine>,
        contests: Arc<ContestEngine>,
        broadcast: Broadcaster,
    ) -> Self {
        Self {
            pool,
            locks,
            matching,
            accrual,
            contests,
            broadcast,
        }
    }

    /// Runs one tick over every bot whose cooldown (by `min_action_cooldown_ms`
    /// at minimum) has elapsed. A bot whose strategies error out is logged and
    /// skipped -- it never blocks the rest of the fleet.
    pub async fn run_tick(&self) -> Result<TickSummary, BotError> {
        let due = ledger::bots::list_due_for_tick(&self.pool).await?;
        let today = Utc::now().date_naive();

        let mut summary = TickSummary::default();
        for profile in due {
            summary.bots_considered += 1;
            match self.run_bot(profile, today).await {
                Ok(true) => summary.bots_acted += 1,
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(error = %err, "bot tick strategy error");
                    summary.strategy_errors += 1;
                }
            }
        }

        Ok(summary)
    }

    /// Returns `Ok(true)` if the bot's cooldown had elapsed and it ran its
    /// strategies (even if none of them ended up acting), `Ok(false)` if it
    /// is still cooling down.
    async fn run_bot(&self, profile: BotProfile, today: chrono::NaiveDate) -> Result<bool, BotError> {
        let mut tx = self.pool.begin().await?;
        ledger::bots::reset_daily_counters_if_new_day_tx(&mut tx, profile.user_id, today).await?;
        let profile = ledger::bots::get_for_update_tx(&mut tx, profile.user_id)
            .await?
            .unwrap_or(profile);
        tx.commit().await?;

        let sampled_cooldown_ms = rand::thread_rng().gen_range(profile.min_action_cooldown_ms..=profile.max_action_cooldown_ms.max(profile.min_action_cooldown_ms));
        if let Some(last) = profile.last_action_at {
            if (Utc::now() - last).num_milliseconds() < sampled_cooldown_ms {
                return Ok(false);
            }
        }

        self.run_strategy(self.strategies_accrue(&profile)).await?;
        self.run_strategy(self.strategies_make_market(&profile)).await?;
        self.run_strategy(self.strategies_take_liquidity(&profile)).await?;
        self.run_strategy(self.strategies_enter_contest(&profile)).await?;

        let mut tx = self.pool.begin().await?;
        ledger::bots::touch_last_action_tx(&mut tx, profile.user_id, Utc::now()).await?;
        tx.commit().await?;

        Ok(true)
    }

    async fn run_strategy<F>(&self, fut: F) -> Result<(), BotError>
    where
        F: std::future::Future<Output = Result<(), BotError>>,
    {
        match tokio::time::timeout(STRATEGY_TIMEOUT, fut).await {
            Ok(inner) => inner,
            Err(elapsed) => Err(elapsed.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn strategy_timeout_is_thirty_seconds() {
        assert_eq!(super::STRATEGY_TIMEOUT.as_secs(), 30);
    }
}
