use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Ordering;
use uuid::Uuid;

use crate::models::OrderSide;

/// Price scaled to an exact integer so the book can be ordered without
/// floating-point drift; eight decimal places covers every price this
/// exchange will ever quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PriceLevel(i64);

impl PriceLevel {
    pub fn from_decimal(price: Decimal) -> Self {
        let scaled = (price * Decimal::from(100_000_000i64)).trunc();
        let value: i64 = scaled.mantissa() as i64 / 10i64.pow(scaled.scale());
        PriceLevel(value)
    }

    pub fn to_decimal(self) -> Decimal {
        Decimal::from(self.0) / Decimal::from(100_000_000i64)
    }

    pub fn from_raw(raw: i64) -> Self {
        PriceLevel(raw)
    }

    pub fn raw(self) -> i64 {
        self.0
    }
}

/// One resting order in an in-memory book. Ordering within a price level's
/// `VecDeque` is by `(created_at, id)` -- earliest wins, order id breaks an
/// exact timestamp tie.
#[derive(Debug, Clone)]
pub struct OrderEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub side: OrderSide,
    pub price: Decimal,
    pub remaining_quantity: i64,
    pub created_at: DateTime<Utc>,
}

impl OrderEntry {
    fn sort_key(&self) -> (DateTime<Utc>, Uuid) {
        (self.created_at, self.id)
    }
}

impl PartialEq for OrderEntry {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}
impl Eq for OrderEntry {}

impl PartialOrd for OrderEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for OrderEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

/// One fill produced while walking the book. The engine commits this to
/// the ledger before mutating the in-memory book.
#[derive(Debug, Clone)]
pub struct Fill {
    pub resting_order_id: Uuid,
    pub resting_user_id: Uuid,
    pub resting_side: OrderSide,
    pub quantity: i64,
    pub price: Decimal,
    pub resting_order_exhausted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketFillSummary {
    pub requested_quantity: i64,
    pub filled_quantity: i64,
    pub cancelled_quantity: i64,
    pub avg_fill_price: Option<Decimal>,
    pub total_cost: Decimal,
}

#[derive(Debug, thiserror::Error)]
pub enum MatchingError {
    #[error("invalid price: {0}")]
    InvalidPrice(String),
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),
    #[error("insufficient liquidity")]
    InsufficientLiquidity,
    #[error(transparent)]
    Lock(#[from] crate::locks::LockError),
    #[error("order not found: {0}")]
    OrderNotFound(Uuid),
    #[error("order is not cancellable in its current status")]
    NotCancellable,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
