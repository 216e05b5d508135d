//! API Handlers
//!
//! One module per resource area: dashboard, players, orders,
//! vesting/accrual, contests, leaderboards, and admin.

pub mod admin;
pub mod contests;
pub mod dashboard;
pub mod leaderboards;
pub mod orders;
pub mod players;
pub mod vesting;
