//! Contest Engine: lineups are entered pre-start (burning shares), frozen
//! once the contest goes live, scored proportionally against live stats,
//! and settled top-half-wins once every referenced game is final.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::ledger;
use crate::locks::LockManager;
use crate::models::{Contest, ContestEntryResponse, ContestStatus, GameStatus, LineupSlot};

#[derive(Debug, thiserror::Error)]
pub enum ContestError {
    #[error("contest {0} not found")]
    ContestNotFound(Uuid),
    #[error("entry {0} not found")]
    EntryNotFound(Uuid),
    #[error("contest is not open for entry")]
    ContestNotOpen,
    #[error("lineup must not be empty")]
    EmptyLineup,
    #[error(transparent)]
    Lock(#[from] crate::locks::LockError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub struct ContestEngine {
    pool: PgPool,
    locks: Arc<LockManager>,
}

impl ContestEngine {
    pub fn new(pool: PgPool, locks: Arc<LockManager>) -> Self {
        Self { pool, locks }
    }

    pub async fn enter(
        &self,
        contest_id: Uuid,
        user_id: Uuid,
        lineup: Vec<LineupSlot>,
    ) -> Result<ContestEntryResponse, ContestError> {
        if lineup.is_empty() || lineup.iter().any(|s| s.shares_entered <= 0) {
            return Err(ContestError::EmptyLineup);
        }

        let _guard = self.locks.guard(user_id).await;

        let contest = ledger::contests::get_by_id(&self.pool, contest_id)
            .await?
            .ok_or(ContestError::ContestNotFound(contest_id))?;
        if contest.status != ContestStatus::Open {
            return Err(ContestError::ContestNotOpen);
        }

        let mut tx = self.pool.begin().await?;

        for slot in &lineup {
            let owned = ledger::holdings::get_for_update_tx(&mut tx, user_id, slot.player_id)
                .await?
                .map(|h| h.quantity)
                .unwrap_or(0);
            let locked = ledger::holdings::locked_quantity_tx(&mut tx, user_id, slot.player_id).await?;
            if owned - locked < slot.shares_entered {
                return Err(ContestError::Lock(crate::locks::LockError::InsufficientShares));
            }
            ledger::holdings::subtract_quantity_tx(&mut tx, user_id, slot.player_id, slot.shares_entered).await?;
        }

        let entry = ledger::contests::insert_entry_tx(&mut tx, contest_id, user_id).await?;
        let rows: Vec<(Uuid, i64)> = lineup.iter().map(|s| (s.player_id, s.shares_entered)).collect();
        ledger::contests::replace_lineup_tx(&mut tx, entry.id, &rows).await?;

        let total_shares: i64 = lineup.iter().map(|s| s.shares_entered).sum();
        ledger::contests::adjust_entry_shares_tx(&mut tx, entry.id, total_shares).await?;
        ledger::contests::adjust_aggregate_tx(&mut tx, contest_id, 1, total_shares, Decimal::from(contest.entry_fee)).await?;

        tx.commit().await?;

        self.entry_response(entry.id).await
    }

    /// Replaces a lineup wholesale, crediting reductions back to holdings
    /// and burning the incremental shares of an increase; entryCount is
    /// unchanged, only totalSharesEntered moves by the net delta.
    pub async fn edit(
        &self,
        contest_id: Uuid,
        entry_id: Uuid,
        user_id: Uuid,
        lineup: Vec<LineupSlot>,
    ) -> Result<ContestEntryResponse, ContestError> {
        if lineup.is_empty() || lineup.iter().any(|s| s.shares_entered <= 0) {
            return Err(ContestError::EmptyLineup);
        }

        let _guard = self.locks.guard(user_id).await;

        let contest = ledger::contests::get_by_id(&self.pool, contest_id)
            .await?
            .ok_or(ContestError::ContestNotFound(contest_id))?;
        if contest.status != ContestStatus::Open {
            return Err(ContestError::ContestNotOpen);
        }

        let entry = ledger::contests::get_entry(&self.pool, entry_id)
            .await?
            .ok_or(ContestError::EntryNotFound(entry_id))?;
        if entry.user_id != user_id || entry.contest_id != contest_id {
            return Err(ContestError::EntryNotFound(entry_id));
        }

        let mut tx = self.pool.begin().await?;

        let old_lineup = ledger::contests::get_lineup_tx(&mut tx, entry_id).await?;
        let old_by_player: HashMap<Uuid, i64> = old_lineup.iter().map(|l| (l.player_id, l.shares_entered)).collect();
        let new_by_player: HashMap<Uuid, i64> = lineup.iter().map(|s| (s.player_id, s.shares_entered)).collect();

        let all_players: HashSet<Uuid> = old_by_player.keys().chain(new_by_player.keys()).copied().collect();

        for player_id in &all_players {
            let old_qty = *old_by_player.get(player_id).unwrap_or(&0);
            let new_qty = *new_by_player.get(player_id).unwrap_or(&0);

            if new_qty > old_qty {
                let delta = new_qty - old_qty;
                let owned = ledger::holdings::get_for_update_tx(&mut tx, user_id, *player_id)
                    .await?
                    .map(|h| h.quantity)
                    .unwrap_or(0);
                let locked = ledger::holdings::locked_quantity_tx(&mut tx, user_id, *player_id).await?;
                if owned - locked < delta {
                    return Err(ContestError::Lock(crate::locks::LockError::InsufficientShares));
                }
                ledger::holdings::subtract_quantity_tx(&mut tx, user_id, *player_id, delta).await?;
            } else if old_qty > new_qty {
                let delta = old_qty - new_qty;
                ledger::holdings::add_quantity_tx(&mut tx, user_id, *player_id, delta, Decimal::ZERO).await?;
            }
        }

        let rows: Vec<(Uuid, i64)> = lineup.iter().map(|s| (s.player_id, s.shares_entered)).collect();
        ledger::contests::replace_lineup_tx(&mut tx, entry_id, &rows).await?;

        let old_total: i64 = old_by_player.values().sum();
        let new_total: i64 = new_by_player.values().sum();
        let shares_delta = new_total - old_total;
        ledger::contests::adjust_entry_shares_tx(&mut tx, entry_id, shares_delta).await?;
        ledger::contests::adjust_aggregate_tx(&mut tx, contest_id, 0, shares_delta, Decimal::ZERO).await?;

        tx.commit().await?;

        self.entry_response(entry_id).await
    }

    async fn entry_response(&self, entry_id: Uuid) -> Result<ContestEntryResponse, ContestError> {
        let entry = ledger::contests::get_entry(&self.pool, entry_id)
            .await?
            .ok_or(ContestError::EntryNotFound(entry_id))?;
        let lineup = ledger::contests::get_lineup(&self.pool, entry_id).await?;
        Ok(ContestEntryResponse { entry, lineup })
    }

    /// Recomputes every lineup row's `earnedScore` and each entry's
    /// `totalScore` from the current fantasy-point totals. Safe to re-run
    /// any number of times -- it only overwrites derived score columns,
    /// never balances or ranks.
    pub async fn score(&self, contest_id: Uuid) -> Result<(), ContestError> {
        let contest = ledger::contests::get_by_id(&self.pool, contest_id)
            .await?
            .ok_or(ContestError::ContestNotFound(contest_id))?;
        if contest.status == ContestStatus::Open {
            return Ok(());
        }

        let lineups = ledger::contests::get_all_lineups_for_contest(&self.pool, contest_id).await?;
        if lineups.is_empty() {
            return Ok(());
        }

        let player_ids: Vec<Uuid> = lineups.iter().map(|l| l.player_id).collect::<HashSet<_>>().into_iter().collect();
        let fantasy = ledger::games::fantasy_points_for_day(&self.pool, &player_ids, contest.game_day).await?;

        let mut totals_per_player: HashMap<Uuid, i64> = HashMap::new();
        for l in &lineups {
            *totals_per_player.entry(l.player_id).or_insert(0) += l.shares_entered;
        }

        let mut tx = self.pool.begin().await?;
        let mut entry_scores: HashMap<Uuid, Decimal> = HashMap::new();

        for l in &lineups {
            let player_fp = fantasy.get(&l.player_id).copied().unwrap_or(Decimal::ZERO);
            let total_for_player = totals_per_player.get(&l.player_id).copied().unwrap_or(0);
            let earned = if total_for_player > 0 {
                Decimal::from(l.shares_entered) / Decimal::from(total_for_player) * player_fp
            } else {
                Decimal::ZERO
            };

            ledger::contests::set_lineup_row_score_tx(&mut tx, l.entry_id, l.player_id, player_fp, earned).await?;
            *entry_scores.entry(l.entry_id).or_insert(Decimal::ZERO) += earned;
        }

        for (entry_id, total_score) in entry_scores {
            ledger::contests::set_entry_score_tx(&mut tx, entry_id, total_score).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Top `ceil(N/2)` entries by `totalScore` (ties broken by earliest
    /// entry) split the prize pool evenly. A no-op on anything but a
    /// `live` contest, so re-running settlement never redistributes.
    pub async fn settle(&self, contest_id: Uuid) -> Result<(), ContestError> {
        let mut tx = self.pool.begin().await?;
        let contest = ledger::contests::get_for_update_tx(&mut tx, contest_id)
            .await?
            .ok_or(ContestError::ContestNotFound(contest_id))?;

        if contest.status != ContestStatus::Live {
            tx.commit().await?;
            return Ok(());
        }

        let mut entries = ledger::contests::list_entries(&self.pool, contest_id).await?;
        entries.sort_by(|a, b| b.total_score.cmp(&a.total_score).then(a.created_at.cmp(&b.created_at)));

        let winner_count = (entries.len() + 1) / 2;
        let payout_per_winner = if winner_count > 0 {
            contest.total_prize_pool / Decimal::from(winner_count as i64)
        } else {
            Decimal::ZERO
        };

        for (i, entry) in entries.iter().enumerate() {
            let rank = (i + 1) as i32;
            let payout = if i < winner_count { Some(payout_per_winner) } else { None };
            ledger::contests::set_entry_rank_and_payout_tx(&mut tx, entry.id, rank, payout).await?;
            if let Some(amount) = payout {
                ledger::users::credit_balance_tx(&mut tx, entry.user_id, amount).await?;
            }
        }

        ledger::contests::set_status_tx(&mut tx, contest_id, ContestStatus::Completed).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Flips a contest from open to live once its start time has passed.
    /// Returns whether the transition happened, for the scheduler's
    /// per-record counters.
    pub async fn open_to_live_if_due(&self, contest_id: Uuid) -> Result<bool, ContestError> {
        let mut tx = self.pool.begin().await?;
        let contest = ledger::contests::get_for_update_tx(&mut tx, contest_id)
            .await?
            .ok_or(ContestError::ContestNotFound(contest_id))?;

        if contest.status == ContestStatus::Open && Utc::now() >= contest.starts_at {
            ledger::contests::set_status_tx(&mut tx, contest_id, ContestStatus::Live).await?;
            tx.commit().await?;
            Ok(true)
        } else {
            tx.commit().await?;
            Ok(false)
        }
    }

    /// A live contest is ready to settle once its window has elapsed and
    /// every game on its game day is final.
    pub async fn ready_to_settle(&self, contest: &Contest) -> Result<bool, ContestError> {
        if contest.status != ContestStatus::Live || Utc::now() < contest.ends_at {
            return Ok(false);
        }
        let games = ledger::games::get_games_by_day(&self.pool, contest.game_day).await?;
        Ok(!games.is_empty() && games.iter().all(|g| g.status == GameStatus::Completed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settle_50_50_splits_the_pool_evenly_among_the_top_half() {
        // Scores [100, 80, 60, 40, 20], prizePool $500: winners = ceil(5/2) = 3.
        let scores = [100, 80, 60, 40, 20];
        let winner_count = (scores.len() + 1) / 2;
        assert_eq!(winner_count, 3);
        let payout = Decimal::from(500) / Decimal::from(winner_count as i64);
        assert_eq!(payout.round_dp(2), Decimal::new(16667, 2));
    }
}
