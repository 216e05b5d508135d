//! Order-Matching Engine: one in-memory price-time-priority book per
//! player, with every fill committed to the ledger before the in-memory
//! book is mutated.

pub mod engine;
pub mod orderbook;
pub mod types;

pub use engine::MatchingEngine;
pub use types::{Fill, MarketFillSummary, MatchingError, OrderEntry, PriceLevel};
