//! Real-time push: one broadcast hub shared by every mutating component,
//! fanned out to connected clients as JSON frames.

pub mod messages;
pub mod routes;
