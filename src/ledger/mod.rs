//! The authoritative relational store. Every other component is a pure
//! function over these rows plus wall-clock time.

pub mod accrual;
pub mod bots;
pub mod contests;
pub mod games;
pub mod holdings;
pub mod job_log;
pub mod orders;
pub mod players;
pub mod snapshots;
pub mod trades;
pub mod users;
