use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A registered account. `balance` is authoritative cash; availability
/// against pending locks is computed by the lock manager, never stored here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub balance: Decimal,
    pub is_premium: bool,
    pub premium_expires_at: Option<DateTime<Utc>>,
    pub is_admin: bool,
    pub is_bot: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Shares/hour budget this user currently earns
    pub fn accrual_rate_total(&self) -> i32 {
        if self.is_premium_active() {
            200
        } else {
            100
        }
    }

    pub fn accrual_daily_cap(&self) -> i32 {
        if self.is_premium_active() {
            4_800
        } else {
            2_400
        }
    }

    pub fn is_premium_active(&self) -> bool {
        self.is_premium
            && self
                .premium_expires_at
                .map(|exp| exp > Utc::now())
                .unwrap_or(true)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub balance: Decimal,
    pub available_balance: Decimal,
    pub is_premium: bool,
}

impl UserProfile {
    pub fn new(user: &User, available_balance: Decimal) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            balance: user.balance,
            available_balance,
            is_premium: user.is_premium_active(),
        }
    }
}
