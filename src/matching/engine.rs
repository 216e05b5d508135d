//! Order-Matching Engine. One in-memory `Orderbook` per
//! player backs price-time-priority matching; every fill commits to the
//! ledger inside its own transaction before the in-memory book is mutated,
//! so a failed fill rolls back without disturbing earlier, already-committed
//! fills of the same incoming order.

use std::sync::Arc;

use dashmap::DashMap;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::ledger;
use crate::locks::LockManager;
use crate::models::{LockReferenceType, Order, OrderSide, OrderStatus, OrderType};
use crate::websocket::messages::{BroadcastMessage, Broadcaster};

use super::orderbook::Orderbook;
use super::types::{MarketFillSummary, MatchingError, OrderEntry};

pub struct MatchingEngine {
    pool: PgPool,
    locks: Arc<LockManager>,
    books: DashMap<Uuid, Arc<Orderbook>>,
    broadcast: Broadcaster,
}

impl MatchingEngine {
    pub fn new(pool: PgPool, locks: Arc<LockManager>, broadcast: Broadcaster) -> Self {
        Self {
            pool,
            locks,
            books: DashMap::new(),
            broadcast,
        }
    }

    fn book_for(&self, player_id: Uuid) -> Arc<Orderbook> {
        self.books
            .entry(player_id)
            .or_insert_with(|| Arc::new(Orderbook::new(player_id)))
            .clone()
    }

    pub fn best_bid_ask(&self, player_id: Uuid) -> (Option<Decimal>, Option<Decimal>) {
        let book = self.book_for(player_id);
        (book.best_bid(), book.best_ask())
    }

    pub fn snapshot(&self, player_id: Uuid, depth: usize) -> (Vec<(Decimal, i64)>, Vec<(Decimal, i64)>) {
        self.book_for(player_id).snapshot(depth)
    }

    /// Rebuilds every per-player book from the orders table's still-open
    /// rows. Run once at startup -- the in-memory book has no other source
    /// of truth.
    pub async fn recover_books(&self, pool: &PgPool) -> Result<(), MatchingError> {
        let open_orders = ledger::orders::list_open_for_recovery(pool).await?;
        for order in open_orders {
            if let Some(limit_price) = order.limit_price {
                let book = self.book_for(order.player_id);
                book.insert(OrderEntry {
                    id: order.id,
                    user_id: order.user_id,
                    side: order.side,
                    price: limit_price,
                    remaining_quantity: order.remaining_quantity(),
                    created_at: order.created_at,
                });
            }
        }
        Ok(())
    }

    fn broadcast(&self, message: BroadcastMessage) {
        let _ = self.broadcast.send(message);
    }

    pub async fn place_limit_order(
        &self,
        user_id: Uuid,
        player_id: Uuid,
        side: OrderSide,
        quantity: i64,
        limit_price: Decimal,
    ) -> Result<Order, MatchingError> {
        if limit_price <= Decimal::ZERO {
            return Err(MatchingError::InvalidPrice("limit price must be positive".into()));
        }
        if quantity <= 0 {
            return Err(MatchingError::InvalidQuantity("quantity must be positive".into()));
        }

        let order_id = Uuid::new_v4();
        match side {
            OrderSide::Buy => {
                self.locks
                    .reserve_cash(user_id, LockReferenceType::Order, order_id, limit_price * Decimal::from(quantity))
                    .await?;
            }
            OrderSide::Sell => {
                self.locks
                    .reserve_shares(user_id, player_id, LockReferenceType::Order, order_id, quantity)
                    .await?;
            }
        }

        let mut tx = self.pool.begin().await?;
        let order = ledger::orders::insert_tx(
            &mut tx,
            order_id,
            user_id,
            player_id,
            side,
            OrderType::Limit,
            quantity,
            Some(limit_price),
        )
        .await?;
        tx.commit().await?;

        let book = self.book_for(player_id);
        book.insert(OrderEntry {
            id: order.id,
            user_id,
            side,
            price: limit_price,
            remaining_quantity: quantity,
            created_at: order.created_at,
        });

        self.run_matching_loop(player_id).await?;

        ledger::orders::get_by_id(&self.pool, order.id)
            .await?
            .ok_or(MatchingError::OrderNotFound(order.id))
    }

    pub async fn place_market_order(
        &self,
        user_id: Uuid,
        player_id: Uuid,
        side: OrderSide,
        quantity: i64,
    ) -> Result<(Order, MarketFillSummary), MatchingError> {
        if quantity <= 0 {
            return Err(MatchingError::InvalidQuantity("quantity must be positive".into()));
        }

        let book = self.book_for(player_id);
        let opposite_best = book.peek_best_opposite(side);
        if opposite_best.is_none() {
            return Err(MatchingError::InsufficientLiquidity);
        }

        if side == OrderSide::Buy {
            let worst_ask = book.worst_ask_for_quantity(quantity).unwrap_or(Decimal::ZERO);
            let upper_bound_cost = worst_ask * Decimal::from(quantity);
            if self.locks.available_balance(user_id).await? < upper_bound_cost {
                return Err(MatchingError::Lock(crate::locks::LockError::InsufficientBalance));
            }
        }

        let mut tx = self.pool.begin().await?;
        let order = ledger::orders::insert_tx(
            &mut tx,
            Uuid::new_v4(),
            user_id,
            player_id,
            side,
            OrderType::Market,
            quantity,
            None,
        )
        .await?;
        tx.commit().await?;

        let (filled, total_cost) = self.walk_book(&book, &order, side, quantity).await?;
        let cancelled = quantity - filled;

        let final_status = if filled == 0 {
            OrderStatus::Cancelled
        } else if cancelled > 0 {
            OrderStatus::Cancelled
        } else {
            OrderStatus::Filled
        };

        let mut tx = self.pool.begin().await?;
        ledger::orders::set_status_tx(&mut tx, order.id, final_status).await?;
        tx.commit().await?;

        let avg_fill_price = if filled > 0 {
            Some(total_cost / Decimal::from(filled))
        } else {
            None
        };

        let updated = ledger::orders::get_by_id(&self.pool, order.id)
            .await?
            .ok_or(MatchingError::OrderNotFound(order.id))?;

        Ok((
            updated,
            MarketFillSummary {
                requested_quantity: quantity,
                filled_quantity: filled,
                cancelled_quantity: cancelled,
                avg_fill_price,
                total_cost,
            },
        ))
    }

    /// Walks the opposite side of the book for a market order, committing
    /// one fill transaction at a time until the incoming quantity is
    /// exhausted or the book runs dry.
    async fn walk_book(
        &self,
        book: &Arc<Orderbook>,
        incoming: &Order,
        side: OrderSide,
        quantity: i64,
    ) -> Result<(i64, Decimal), MatchingError> {
        let mut remaining = quantity;
        let mut filled = 0i64;
        let mut total_cost = Decimal::ZERO;

        while remaining > 0 {
            let Some(resting) = book.peek_best_opposite(side) else {
                break;
            };

            let fill_qty = remaining.min(resting.remaining_quantity);
            self.settle_fill(incoming, &resting, fill_qty, resting.price).await?;
            book.apply_fill(side, resting.id, fill_qty);

            remaining -= fill_qty;
            filled += fill_qty;
            total_cost += resting.price * Decimal::from(fill_qty);
        }

        Ok((filled, total_cost))
    }

    /// Matches the resting side of `player_id`'s book against itself,
    /// repeatedly settling crossing pairs until the book no longer crosses.
    /// Called after a limit order is inserted.
    async fn run_matching_loop(&self, player_id: Uuid) -> Result<(), MatchingError> {
        let book = self.book_for(player_id);

        loop {
            let (bid, ask) = (book.best_bid(), book.best_ask());
            let (Some(bid), Some(ask)) = (bid, ask) else {
                break;
            };
            if bid < ask {
                break;
            }

            let resting_bid = book.peek_best_opposite(OrderSide::Sell);
            let resting_ask = book.peek_best_opposite(OrderSide::Buy);
            let (Some(best_bid_order), Some(best_ask_order)) = (resting_bid, resting_ask) else {
                break;
            };

            let (taker, maker, maker_side) = if best_bid_order.created_at <= best_ask_order.created_at {
                (best_ask_order.clone(), best_bid_order.clone(), OrderSide::Buy)
            } else {
                (best_bid_order.clone(), best_ask_order.clone(), OrderSide::Sell)
            };

            let fill_qty = taker.remaining_quantity.min(maker.remaining_quantity);
            let fill_price = maker.price;

            let taker_order = ledger::orders::get_by_id(&self.pool, taker.id)
                .await?
                .ok_or(MatchingError::OrderNotFound(taker.id))?;

            self.settle_fill(&taker_order, &maker, fill_qty, fill_price).await?;

            let taker_side = match maker_side {
                OrderSide::Buy => OrderSide::Sell,
                OrderSide::Sell => OrderSide::Buy,
            };
            book.apply_fill(taker_side, maker.id, fill_qty);
            book.apply_fill(maker_side, taker.id, fill_qty);

            let remaining_taker = ledger::orders::get_by_id(&self.pool, taker.id)
                .await?
                .map(|o| o.remaining_quantity())
                .unwrap_or(0);
            if remaining_taker <= 0 {
                break;
            }
        }

        Ok(())
    }

    /// Commits one fill atomically: both orders' filled_quantity/status,
    /// the trade row, both sides' holdings and cash, lock adjustments, and
    /// the player's last-trade-price/volume -- all in a single transaction,
    /// so either both sides of a trade commit or neither does.
    async fn settle_fill(
        &self,
        taker: &Order,
        maker: &OrderEntry,
        quantity: i64,
        price: Decimal,
    ) -> Result<(), MatchingError> {
        let (buyer_id, seller_id, buy_order_id, sell_order_id) = match taker.side {
            OrderSide::Buy => (taker.user_id, maker.user_id, taker.id, maker.id),
            OrderSide::Sell => (maker.user_id, taker.user_id, maker.id, taker.id),
        };

        let cost = price * Decimal::from(quantity);

        let mut tx = self.pool.begin().await?;

        ledger::trades::insert_tx(
            &mut tx,
            buyer_id,
            seller_id,
            taker.player_id,
            buy_order_id,
            sell_order_id,
            quantity,
            price,
        )
        .await?;

        ledger::users::debit_balance_tx(&mut tx, buyer_id, cost).await?;
        ledger::users::credit_balance_tx(&mut tx, seller_id, cost).await?;

        ledger::holdings::add_quantity_tx(&mut tx, buyer_id, taker.player_id, quantity, price).await?;
        ledger::holdings::subtract_quantity_tx(&mut tx, seller_id, taker.player_id, quantity).await?;

        ledger::players::record_trade_price_tx(&mut tx, taker.player_id, price, quantity).await?;

        ledger::orders::apply_fill_tx(&mut tx, taker.id, quantity, OrderStatus::Partial).await?;
        ledger::orders::apply_fill_tx(&mut tx, maker.id, quantity, OrderStatus::Partial).await?;

        self.finalize_order_status_tx(&mut tx, taker.id).await?;
        self.finalize_order_status_tx(&mut tx, maker.id).await?;

        match taker.side {
            OrderSide::Buy => self.locks.adjust_lock_amount(&mut tx, taker.id, self.remaining_lock_amount(taker, quantity)).await?,
            OrderSide::Sell => self.locks.adjust_lock_quantity(&mut tx, taker.id, taker.remaining_quantity() - quantity).await?,
        }
        match taker.side {
            OrderSide::Buy => self.locks.adjust_lock_quantity(&mut tx, maker.id, maker.remaining_quantity - quantity).await?,
            OrderSide::Sell => self.locks.adjust_lock_amount(&mut tx, maker.id, maker.price * Decimal::from(maker.remaining_quantity - quantity)).await?,
        }

        tx.commit().await?;

        self.broadcast(BroadcastMessage::Trade {
            player_id: taker.player_id,
            quantity,
            price,
        });
        self.broadcast(BroadcastMessage::OrderBook { player_id: taker.player_id });
        self.broadcast(BroadcastMessage::MarketActivity);

        if let Some(buyer) = ledger::users::get_by_id(&self.pool, buyer_id).await? {
            self.broadcast(BroadcastMessage::Portfolio { user_id: buyer_id, balance: buyer.balance });
        }
        if let Some(seller) = ledger::users::get_by_id(&self.pool, seller_id).await? {
            self.broadcast(BroadcastMessage::Portfolio { user_id: seller_id, balance: seller.balance });
        }

        Ok(())
    }

    fn remaining_lock_amount(&self, order: &Order, just_filled: i64) -> Decimal {
        let remaining_qty = order.remaining_quantity() - just_filled;
        order.limit_price.unwrap_or(Decimal::ZERO) * Decimal::from(remaining_qty.max(0))
    }

    async fn finalize_order_status_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        order_id: Uuid,
    ) -> Result<(), MatchingError> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
            .bind(order_id)
            .fetch_one(&mut **tx)
            .await?;

        let status = if order.remaining_quantity() <= 0 {
            OrderStatus::Filled
        } else {
            OrderStatus::Partial
        };

        ledger::orders::set_status_tx(tx, order_id, status).await?;

        if status == OrderStatus::Filled {
            self.locks.release_cash_by_reference_tx(tx, order_id).await.ok();
            self.locks.release_shares_by_reference_tx(tx, order_id).await.ok();
        }

        Ok(())
    }

    pub async fn cancel_order(&self, order_id: Uuid, user_id: Uuid) -> Result<(), MatchingError> {
        let order = ledger::orders::get_by_id(&self.pool, order_id)
            .await?
            .ok_or(MatchingError::OrderNotFound(order_id))?;

        if order.user_id != user_id {
            return Err(MatchingError::OrderNotFound(order_id));
        }
        if order.status.is_terminal() {
            return Err(MatchingError::NotCancellable);
        }

        let mut tx = self.pool.begin().await?;
        ledger::orders::set_status_tx(&mut tx, order_id, OrderStatus::Cancelled).await?;
        self.locks.release_cash_by_reference_tx(&mut tx, order_id).await?;
        self.locks.release_shares_by_reference_tx(&mut tx, order_id).await?;
        tx.commit().await?;

        let book = self.book_for(order.player_id);
        book.remove(order.side, order_id);

        self.broadcast(BroadcastMessage::OrderBook { player_id: order.player_id });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // Integration tests would require a database connection.
    // Price-time priority and fill bookkeeping are unit tested in orderbook.rs.
}
