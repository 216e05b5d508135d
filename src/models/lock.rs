use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// What a lock is holding funds/shares against. Reference ids are
/// order/contest-entry ids; `release_by_reference` uses `(reference_type,
/// reference_id)` to find every lock tied to a cancelled or fully-settled
/// intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "lock_reference_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LockReferenceType {
    Order,
    ContestEntry,
}

/// A cash reservation against a user's balance. The sum of a user's open
/// `BalanceLock`s is subtracted from `balance` to get `available_balance`;
/// the lock itself never touches `balance`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BalanceLock {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub reference_type: LockReferenceType,
    pub reference_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A share reservation against a user's holding in one player, same
/// accounting rule as `BalanceLock` but against `Holding::quantity`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HoldingsLock {
    pub id: Uuid,
    pub user_id: Uuid,
    pub player_id: Uuid,
    pub quantity: i64,
    pub reference_type: LockReferenceType,
    pub reference_id: Uuid,
    pub created_at: DateTime<Utc>,
}
