//! The four strategies run on every bot tick, in order: accrue, make
//! markets, take liquidity priced away from fair value, and occasionally
//! enter a contest. Each is tolerant of the bot hitting its own daily caps
//! -- that just means the strategy is a no-op this tick, not an error.

use std::collections::HashSet;

use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::ledger;
use crate::models::{BotProfile, LineupSlot, OrderSide};
use crate::websocket::messages::BroadcastMessage;

use super::fair_value;
use super::{BotError, BotFleet};

const COLD_PRIORITY: f64 = 0.7;
const MAX_LINEUP_PLAYERS: usize = 7;
const MAX_SHARES_PER_PLAYER: i64 = 200;
const MAX_SHARE_FRACTION_OF_HOLDING: f64 = 0.6;
const MAX_TEAMS_IN_LINEUP: usize = 4;
const MIN_LINEUP_SHARES: i64 = 10;
const MAX_OPEN_CONTEST_ENTRIES: i32 = 10;

impl BotFleet {
    /// Advances the bot's own accrual, then 10% of the time reselects its
    /// splits across a fresh random sample of eligible players to keep the
    /// fleet's accrual diversified instead of piling onto one player.
    pub(super) async fn strategies_accrue(&self, profile: &BotProfile) -> Result<(), BotError> {
        self.accrual.accrue(profile.user_id).await?;

        let mut rng = rand::thread_rng();
        let existing = ledger::accrual::get_splits(&self.pool, profile.user_id).await?;

        if existing.is_empty() || rng.gen_bool(0.10) {
            let mut candidates = ledger::players::list_accrual_eligible(&self.pool).await?;
            if candidates.is_empty() {
                return Ok(());
            }
            candidates.shuffle(&mut rng);
            let count = rng.gen_range(1..=candidates.len().min(5));
            let player_ids: Vec<Uuid> = candidates.into_iter().take(count).map(|p| p.id).collect();
            self.accrual.set_splits(profile.user_id, player_ids).await?;
        }

        Ok(())
    }

    /// Cancels the bot's own resting orders older than 15 minutes, then
    /// quotes a two-sided market around fair value on a candidate set
    /// biased toward players with no existing open interest.
    pub(super) async fn strategies_make_market(&self, profile: &BotProfile) -> Result<(), BotError> {
        let cutoff = Utc::now() - chrono::Duration::minutes(15);
        for order in ledger::orders::list_open_for_user(&self.pool, profile.user_id).await? {
            if order.created_at < cutoff {
                self.matching.cancel_order(order.id, profile.user_id).await.ok();
            }
        }

        let mut active = ledger::players::list_active(&self.pool).await?;
        if active.is_empty() {
            return Ok(());
        }

        let warm: HashSet<Uuid> = ledger::orders::list_player_ids_with_open_orders(&self.pool)
            .await?
            .into_iter()
            .collect();

        let mut rng = rand::thread_rng();
        active.shuffle(&mut rng);

        let desired = (profile.aggressiveness * Decimal::from(5))
            .to_i64()
            .unwrap_or(1)
            .clamp(1, active.len() as i64) as usize;

        let (cold, warm_players): (Vec<_>, Vec<_>) = active.into_iter().partition(|p| !warm.contains(&p.id));
        let cold_target = ((desired as f64) * COLD_PRIORITY).round() as usize;

        let mut candidates: Vec<_> = cold.into_iter().take(cold_target).collect();
        let remaining = desired.saturating_sub(candidates.len());
        candidates.extend(warm_players.into_iter().take(remaining));
        if candidates.len() < desired {
            // Cold pool ran dry; top up doesn't matter which side.
        }

        for player in candidates {
            if profile.orders_today + 2 > profile.max_daily_orders {
                break;
            }

            let base = match player.last_trade_price {
                Some(price) => price,
                None => {
                    let recent = ledger::games::recent_fantasy_points(&self.pool, player.id, 10).await?;
                    fair_value::fair_value(&recent)
                }
            };
            if base <= Decimal::ZERO {
                continue;
            }

            let (best_bid, best_ask) = self.matching.best_bid_ask(player.id);

            let dynamic_spread = profile.spread_percent
                * (Decimal::ONE + Decimal::from(player.volume_24h.to_i64().unwrap_or(0).min(100)) / Decimal::from(1_000));
            let half_spread = (base * dynamic_spread / Decimal::from(200)).max(Decimal::new(1, 2));

            let size = rng.gen_range(profile.min_order_size..=profile.max_order_size.max(profile.min_order_size));
            if profile.volume_today + size * 2 > profile.max_daily_volume {
                continue;
            }

            let crossing_probability = 0.20 + 0.20 * profile.aggressiveness.to_f64().unwrap_or(0.0).clamp(0.0, 1.0);
            let crossing = rng.gen_bool(crossing_probability.clamp(0.0, 1.0));

            let bid_price = if crossing {
                best_ask.unwrap_or(base + half_spread)
            } else {
                (base - half_spread).max(Decimal::new(1, 2))
            };
            let ask_price = if crossing {
                best_bid.unwrap_or((base - half_spread).max(Decimal::new(1, 2)))
            } else {
                base + half_spread
            };

            if self
                .matching
                .place_limit_order(profile.user_id, player.id, OrderSide::Buy, size, bid_price)
                .await
                .is_ok()
            {
                self.record_order(profile.user_id, size).await?;
            }
            if ask_price > Decimal::ZERO
                && self
                    .matching
                    .place_limit_order(profile.user_id, player.id, OrderSide::Sell, size, ask_price)
                    .await
                    .is_ok()
            {
                self.record_order(profile.user_id, size).await?;
            }
        }

        Ok(())
    }

    /// Buys a resting ask priced well below fair value, or sells into a
    /// resting bid priced well above it, executing as an immediate
    /// market-like fill rather than resting a new quote.
    pub(super) async fn strategies_take_liquidity(&self, profile: &BotProfile) -> Result<(), BotError> {
        let threshold = profile.spread_percent / Decimal::from(100);
        let active = ledger::players::list_active(&self.pool).await?;

        for player in active.iter().take(10) {
            if profile.orders_today >= profile.max_daily_orders {
                break;
            }

            let recent = ledger::games::recent_fantasy_points(&self.pool, player.id, 10).await?;
            let fv = fair_value::fair_value(&recent);
            let (best_bid, best_ask) = self.matching.best_bid_ask(player.id);

            if let Some(ask) = best_ask {
                if ask <= fv * (Decimal::ONE - threshold) {
                    let size = profile.min_order_size.max(1);
                    if profile.volume_today + size <= profile.max_daily_volume
                        && self
                            .matching
                            .place_market_order(profile.user_id, player.id, OrderSide::Buy, size)
                            .await
                            .is_ok()
                    {
                        self.record_order(profile.user_id, size).await?;
                    }
                    continue;
                }
            }

            if let Some(bid) = best_bid {
                if bid >= fv * (Decimal::ONE + threshold) {
                    let owned = ledger::holdings::get(&self.pool, profile.user_id, player.id)
                        .await?
                        .map(|h| h.quantity)
                        .unwrap_or(0);
                    let size = owned.min(profile.max_order_size);
                    if size > 0
                        && profile.volume_today + size <= profile.max_daily_volume
                        && self
                            .matching
                            .place_market_order(profile.user_id, player.id, OrderSide::Sell, size)
                            .await
                            .is_ok()
                    {
                        self.record_order(profile.user_id, size).await?;
                    }
                }
            }
        }

        Ok(())
    }

    /// With probability `aggressiveness`, greedily fills a lineup from the
    /// bot's own holdings (highest tier first) and enters the first open
    /// contest with room left, subject to the per-player and per-lineup caps.
    pub(super) async fn strategies_enter_contest(&self, profile: &BotProfile) -> Result<(), BotError> {
        let mut rng = rand::thread_rng();
        if !rng.gen_bool(profile.aggressiveness.to_f64().unwrap_or(0.0).clamp(0.0, 1.0)) {
            return Ok(());
        }
        if profile.contest_entries_today >= profile.max_contest_entries_per_day {
            return Ok(());
        }

        let open_contests = ledger::contests::list_open(&self.pool).await?;
        let Some(contest) = open_contests.into_iter().find(|c| c.entry_count < MAX_OPEN_CONTEST_ENTRIES) else {
            return Ok(());
        };
        if Decimal::from(contest.entry_fee) > profile.contest_entry_budget {
            return Ok(());
        }

        let mut holdings = ledger::holdings::get_user_holdings_with_players(&self.pool, profile.user_id).await?;
        if holdings.is_empty() {
            return Ok(());
        }

        let population: Vec<Decimal> = holdings
            .iter()
            .filter_map(|h| h.last_trade_price)
            .collect();
        holdings.sort_by(|a, b| {
            let tier_a = fair_value::tier_for(a.last_trade_price.unwrap_or(Decimal::from(10)), &population);
            let tier_b = fair_value::tier_for(b.last_trade_price.unwrap_or(Decimal::from(10)), &population);
            tier_b.cmp(&tier_a)
        });

        let mut lineup = Vec::new();
        let mut teams = HashSet::new();
        let mut total_shares = 0i64;

        for holding in holdings {
            if lineup.len() >= MAX_LINEUP_PLAYERS {
                break;
            }
            if !teams.contains(&holding.team) && teams.len() >= MAX_TEAMS_IN_LINEUP {
                continue;
            }

            let max_from_holding = (holding.quantity as f64 * MAX_SHARE_FRACTION_OF_HOLDING).floor() as i64;
            let shares = max_from_holding.min(MAX_SHARES_PER_PLAYER).min(holding.quantity);
            if shares <= 0 {
                continue;
            }

            teams.insert(holding.team.clone());
            total_shares += shares;
            lineup.push(LineupSlot {
                player_id: holding.player_id,
                shares_entered: shares,
            });
        }

        if total_shares < MIN_LINEUP_SHARES {
            return Ok(());
        }

        self.contests.enter(contest.id, profile.user_id, lineup).await?;

        let mut tx = self.pool.begin().await?;
        ledger::bots::record_contest_entry_tx(&mut tx, profile.user_id, Utc::now()).await?;
        tx.commit().await?;

        let _ = self.broadcast.send(BroadcastMessage::ContestUpdate {
            contest_id: Some(contest.id),
            game_id: None,
        });

        Ok(())
    }

    async fn record_order(&self, user_id: Uuid, volume: i64) -> Result<(), BotError> {
        let mut tx = self.pool.begin().await?;
        ledger::bots::record_order_tx(&mut tx, user_id, volume, Utc::now()).await?;
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // Integration tests would require a database connection.
    // Quoting math is unit tested in fair_value.rs.
}
