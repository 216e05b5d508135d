//! Reserves cash and shares against pending orders and contest entries so
//! concurrent operations can never double-spend a user's balance or
//! holdings.

use dashmap::DashMap;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use crate::models::LockReferenceType;

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("insufficient available balance")]
    InsufficientBalance,
    #[error("insufficient available shares")]
    InsufficientShares,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Serializes check-then-insert lock operations per user within this
/// process. The authoritative guard is still the `SELECT ... FOR UPDATE`
/// inside the transaction; this mutex only avoids two tasks racing to open
/// that transaction for the same user at once.
pub struct LockManager {
    pool: PgPool,
    user_mutexes: DashMap<Uuid, std::sync::Arc<AsyncMutex<()>>>,
}

impl LockManager {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            user_mutexes: DashMap::new(),
        }
    }

    fn mutex_for(&self, user_id: Uuid) -> std::sync::Arc<AsyncMutex<()>> {
        self.user_mutexes
            .entry(user_id)
            .or_insert_with(|| std::sync::Arc::new(AsyncMutex::new(())))
            .clone()
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Holds the same per-user mutex `reserve_cash`/`reserve_shares` take,
    /// for callers (contest entry/edit) that run several lock operations
    /// against one user across a single transaction and need them to not
    /// interleave with an order placement for that user.
    pub async fn guard(&self, user_id: Uuid) -> tokio::sync::OwnedMutexGuard<()> {
        self.mutex_for(user_id).lock_owned().await
    }

    pub async fn available_balance(&self, user_id: Uuid) -> Result<Decimal, LockError> {
        let row: (Decimal, Option<Decimal>) = sqlx::query_as(
            r#"
            SELECT u.balance, (SELECT SUM(amount) FROM balance_locks WHERE user_id = $1)
            FROM users u WHERE u.id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0 - row.1.unwrap_or(Decimal::ZERO))
    }

    pub async fn available_shares(&self, user_id: Uuid, player_id: Uuid) -> Result<i64, LockError> {
        let row: (Option<i64>, Option<i64>) = sqlx::query_as(
            r#"
            SELECT
                (SELECT quantity FROM holdings WHERE user_id = $1 AND player_id = $2),
                (SELECT SUM(quantity) FROM holdings_locks WHERE user_id = $1 AND player_id = $2)
            "#,
        )
        .bind(user_id)
        .bind(player_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0.unwrap_or(0) - row.1.unwrap_or(0))
    }

    /// Reserve cash against `(reference_type, reference_id)`. Fails closed:
    /// the whole check-then-insert runs inside one transaction holding a
    /// row lock on the user, serialized per-user by `user_mutexes`.
    pub async fn reserve_cash(
        &self,
        user_id: Uuid,
        reference_type: LockReferenceType,
        reference_id: Uuid,
        amount: Decimal,
    ) -> Result<Uuid, LockError> {
        let guard = self.mutex_for(user_id);
        let _permit = guard.lock().await;

        let mut tx = self.pool.begin().await?;
        let (balance,): (Decimal,) = sqlx::query_as("SELECT balance FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

        let locked: Option<Decimal> = sqlx::query_scalar("SELECT SUM(amount) FROM balance_locks WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

        if balance - locked.unwrap_or(Decimal::ZERO) < amount {
            return Err(LockError::InsufficientBalance);
        }

        let lock_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO balance_locks (id, user_id, amount, reference_type, reference_id, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            "#,
        )
        .bind(lock_id)
        .bind(user_id)
        .bind(amount)
        .bind(reference_type)
        .bind(reference_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(lock_id)
    }

    pub async fn reserve_shares(
        &self,
        user_id: Uuid,
        player_id: Uuid,
        reference_type: LockReferenceType,
        reference_id: Uuid,
        quantity: i64,
    ) -> Result<Uuid, LockError> {
        let guard = self.mutex_for(user_id);
        let _permit = guard.lock().await;

        let mut tx = self.pool.begin().await?;
        let owned: Option<(i64,)> = sqlx::query_as(
            "SELECT quantity FROM holdings WHERE user_id = $1 AND player_id = $2 FOR UPDATE",
        )
        .bind(user_id)
        .bind(player_id)
        .fetch_optional(&mut *tx)
        .await?;

        let owned = owned.map(|(q,)| q).unwrap_or(0);
        let locked: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(quantity) FROM holdings_locks WHERE user_id = $1 AND player_id = $2",
        )
        .bind(user_id)
        .bind(player_id)
        .fetch_one(&mut *tx)
        .await?;

        if owned - locked.unwrap_or(0) < quantity {
            return Err(LockError::InsufficientShares);
        }

        let lock_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO holdings_locks (id, user_id, player_id, quantity, reference_type, reference_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            "#,
        )
        .bind(lock_id)
        .bind(user_id)
        .bind(player_id)
        .bind(quantity)
        .bind(reference_type)
        .bind(reference_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(lock_id)
    }

    /// Shrinks (or removes, if `new_amount <= 0`) the cash lock tied to
    /// `reference_id`, used after a partial fill reduces remaining exposure.
    pub async fn adjust_lock_amount(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        reference_id: Uuid,
        new_amount: Decimal,
    ) -> Result<(), LockError> {
        if new_amount <= Decimal::ZERO {
            sqlx::query("DELETE FROM balance_locks WHERE reference_id = $1")
                .bind(reference_id)
                .execute(&mut **tx)
                .await?;
        } else {
            sqlx::query("UPDATE balance_locks SET amount = $2 WHERE reference_id = $1")
                .bind(reference_id)
                .bind(new_amount)
                .execute(&mut **tx)
                .await?;
        }
        Ok(())
    }

    pub async fn adjust_lock_quantity(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        reference_id: Uuid,
        new_quantity: i64,
    ) -> Result<(), LockError> {
        if new_quantity <= 0 {
            sqlx::query("DELETE FROM holdings_locks WHERE reference_id = $1")
                .bind(reference_id)
                .execute(&mut **tx)
                .await?;
        } else {
            sqlx::query("UPDATE holdings_locks SET quantity = $2 WHERE reference_id = $1")
                .bind(reference_id)
                .bind(new_quantity)
                .execute(&mut **tx)
                .await?;
        }
        Ok(())
    }

    pub async fn release_cash_by_reference(&self, reference_id: Uuid) -> Result<(), LockError> {
        sqlx::query("DELETE FROM balance_locks WHERE reference_id = $1")
            .bind(reference_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn release_shares_by_reference(&self, reference_id: Uuid) -> Result<(), LockError> {
        sqlx::query("DELETE FROM holdings_locks WHERE reference_id = $1")
            .bind(reference_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Same releases, but scoped to an already-open transaction (used by the
    /// matching engine and contest engine so lock release commits atomically
    /// with the settlement it is part of).
    pub async fn release_cash_by_reference_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        reference_id: Uuid,
    ) -> Result<(), LockError> {
        sqlx::query("DELETE FROM balance_locks WHERE reference_id = $1")
            .bind(reference_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    pub async fn release_shares_by_reference_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        reference_id: Uuid,
    ) -> Result<(), LockError> {
        sqlx::query("DELETE FROM holdings_locks WHERE reference_id = $1")
            .bind(reference_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_error_messages_are_stable() {
        assert_eq!(LockError::InsufficientBalance.to_string(), "insufficient available balance");
        assert_eq!(LockError::InsufficientShares.to_string(), "insufficient available shares");
    }
}
