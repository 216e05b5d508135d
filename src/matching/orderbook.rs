//! Per-player price-time-priority book. Mirrors the shape of
//! the concurrent orderbook this engine was modeled on: price levels in a
//! `BTreeMap`, resting orders within a level in priority order, an index for
//! O(1) cancellation, and last-trade-price/order-count as atomics readable
//! without taking the book lock.

use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};
use uuid::Uuid;

use crate::models::OrderSide;

use super::types::{OrderEntry, PriceLevel};

pub struct Orderbook {
    player_id: Uuid,
    bids: RwLock<BTreeMap<PriceLevel, VecDeque<OrderEntry>>>,
    asks: RwLock<BTreeMap<PriceLevel, VecDeque<OrderEntry>>>,
    last_trade_price: AtomicI64,
    order_count: AtomicI64,
}

fn insert_sorted(queue: &mut VecDeque<OrderEntry>, entry: OrderEntry) {
    let pos = queue.iter().position(|existing| existing > &entry).unwrap_or(queue.len());
    queue.insert(pos, entry);
}

impl Orderbook {
    pub fn new(player_id: Uuid) -> Self {
        Self {
            player_id,
            bids: RwLock::new(BTreeMap::new()),
            asks: RwLock::new(BTreeMap::new()),
            last_trade_price: AtomicI64::new(0),
            order_count: AtomicI64::new(0),
        }
    }

    pub fn player_id(&self) -> Uuid {
        self.player_id
    }

    pub fn order_count(&self) -> i64 {
        self.order_count.load(AtomicOrdering::Relaxed)
    }

    pub fn last_trade_price(&self) -> Option<Decimal> {
        let raw = self.last_trade_price.load(AtomicOrdering::Relaxed);
        if raw == 0 {
            None
        } else {
            Some(PriceLevel::from_raw(raw).to_decimal())
        }
    }

    pub fn set_last_trade_price(&self, price: Decimal) {
        self.last_trade_price
            .store(PriceLevel::from_decimal(price).raw(), AtomicOrdering::Relaxed);
    }

    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.read().keys().next_back().map(|p| p.to_decimal())
    }

    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.read().keys().next().map(|p| p.to_decimal())
    }

    pub fn insert(&self, entry: OrderEntry) {
        let level = PriceLevel::from_decimal(entry.price);
        let mut book = match entry.side {
            OrderSide::Buy => self.bids.write(),
            OrderSide::Sell => self.asks.write(),
        };
        insert_sorted(book.entry(level).or_default(), entry);
        self.order_count.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub fn remove(&self, side: OrderSide, order_id: Uuid) -> Option<OrderEntry> {
        let mut book = match side {
            OrderSide::Buy => self.bids.write(),
            OrderSide::Sell => self.asks.write(),
        };
        let mut found = None;
        let mut empty_level = None;
        for (level, queue) in book.iter_mut() {
            if let Some(pos) = queue.iter().position(|o| o.id == order_id) {
                found = queue.remove(pos);
                if queue.is_empty() {
                    empty_level = Some(*level);
                }
                break;
            }
        }
        if let Some(level) = empty_level {
            book.remove(&level);
        }
        if found.is_some() {
            self.order_count.fetch_sub(1, AtomicOrdering::Relaxed);
        }
        found
    }

    /// Peek the best opposite-side resting order for `side`'s incoming
    /// order, without removing it. `None` if the book is empty on that
    /// side.
    pub fn peek_best_opposite(&self, side: OrderSide) -> Option<OrderEntry> {
        match side {
            OrderSide::Buy => self.asks.read().values().next().and_then(|q| q.front().cloned()),
            OrderSide::Sell => self.bids.read().values().next_back().and_then(|q| q.front().cloned()),
        }
    }

    /// Reduce the resting order's remaining quantity by `quantity`,
    /// removing it entirely once it reaches zero. Must be called only
    /// after the fill that justifies it has committed to the ledger.
    pub fn apply_fill(&self, side: OrderSide, order_id: Uuid, quantity: i64) {
        let opposite_side = match side {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        };
        let mut book = match opposite_side {
            OrderSide::Buy => self.bids.write(),
            OrderSide::Sell => self.asks.write(),
        };
        let mut empty_level = None;
        for (level, queue) in book.iter_mut() {
            if let Some(front) = queue.front_mut() {
                if front.id == order_id {
                    front.remaining_quantity -= quantity;
                    if front.remaining_quantity <= 0 {
                        queue.pop_front();
                        self.order_count.fetch_sub(1, AtomicOrdering::Relaxed);
                        if queue.is_empty() {
                            empty_level = Some(*level);
                        }
                    }
                    break;
                }
            }
        }
        if let Some(level) = empty_level {
            book.remove(&level);
        }
    }

    /// Walks the ask side ascending, accumulating resting quantity until it
    /// covers `quantity`, and returns the price of the level where that
    /// happens -- the worst (highest) ask a market buy of this size would
    /// actually have to pay through. If the book holds less than
    /// `quantity` in total, returns the last (worst) level present instead,
    /// since that is the most a buyer could be charged against the
    /// currently resting liquidity. `None` only when there are no asks at
    /// all.
    pub fn worst_ask_for_quantity(&self, quantity: i64) -> Option<Decimal> {
        let asks = self.asks.read();
        let mut remaining = quantity;
        let mut last_price = None;
        for (level, queue) in asks.iter() {
            let level_qty: i64 = queue.iter().map(|o| o.remaining_quantity).sum();
            last_price = Some(level.to_decimal());
            remaining -= level_qty;
            if remaining <= 0 {
                break;
            }
        }
        last_price
    }

    pub fn snapshot(&self, depth: usize) -> (Vec<(Decimal, i64)>, Vec<(Decimal, i64)>) {
        let bids = self
            .bids
            .read()
            .iter()
            .rev()
            .take(depth)
            .map(|(level, q)| (level.to_decimal(), q.iter().map(|o| o.remaining_quantity).sum()))
            .collect();
        let asks = self
            .asks
            .read()
            .iter()
            .take(depth)
            .map(|(level, q)| (level.to_decimal(), q.iter().map(|o| o.remaining_quantity).sum()))
            .collect();
        (bids, asks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn entry(id: Uuid, side: OrderSide, price: Decimal, qty: i64) -> OrderEntry {
        OrderEntry {
            id,
            user_id: Uuid::new_v4(),
            side,
            price,
            remaining_quantity: qty,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn best_bid_ask_track_price_levels() {
        let book = Orderbook::new(Uuid::new_v4());
        book.insert(entry(Uuid::new_v4(), OrderSide::Buy, dec!(5.00), 10));
        book.insert(entry(Uuid::new_v4(), OrderSide::Buy, dec!(5.50), 5));
        book.insert(entry(Uuid::new_v4(), OrderSide::Sell, dec!(6.00), 10));

        assert_eq!(book.best_bid(), Some(dec!(5.50)));
        assert_eq!(book.best_ask(), Some(dec!(6.00)));
    }

    #[test]
    fn apply_fill_removes_exhausted_resting_order() {
        let book = Orderbook::new(Uuid::new_v4());
        let ask_id = Uuid::new_v4();
        book.insert(entry(ask_id, OrderSide::Sell, dec!(5.00), 10));

        book.apply_fill(OrderSide::Buy, ask_id, 10);
        assert_eq!(book.order_count(), 0);
        assert_eq!(book.best_ask(), None);
    }

    #[test]
    fn worst_ask_for_quantity_walks_levels_deep_enough_to_cover_the_order() {
        let book = Orderbook::new(Uuid::new_v4());
        book.insert(entry(Uuid::new_v4(), OrderSide::Sell, dec!(4.00), 2));
        book.insert(entry(Uuid::new_v4(), OrderSide::Sell, dec!(5.00), 3));

        // Book only holds 5 total; a market buy of 10 is capped at the
        // worst (deepest) level actually resting, $5.00.
        assert_eq!(book.worst_ask_for_quantity(10), Some(dec!(5.00)));
        // A buy that exhausts exactly the first level stops there.
        assert_eq!(book.worst_ask_for_quantity(2), Some(dec!(4.00)));
        assert_eq!(book.worst_ask_for_quantity(3), Some(dec!(5.00)));
    }

    #[test]
    fn worst_ask_for_quantity_is_none_with_an_empty_book() {
        let book = Orderbook::new(Uuid::new_v4());
        assert_eq!(book.worst_ask_for_quantity(10), None);
    }
}
