//! Outbound sports-data ingestion client: season roster, schedule, and
//! daily/per-player gamelogs, gated by a token-bucket-plus-minimum-gap
//! rate limiter.

pub mod client;
pub mod rate_limit;
pub mod types;

pub use client::{GamelogRow, SportsDataClient, SportsDataError};
