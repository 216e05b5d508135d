use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// One day's rank snapshot for a user, written by the scheduler's daily
/// portfolio-snapshot job so history queries don't need to recompute ranks
/// over the live table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PortfolioSnapshot {
    pub user_id: Uuid,
    pub snapshot_date: NaiveDate,
    pub cash_balance: Decimal,
    pub portfolio_value: Decimal,
    pub cash_rank: i64,
    pub portfolio_rank: i64,
}
