use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "contest_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContestStatus {
    Open,
    Live,
    Completed,
}

/// A single game-day contest. `game_day` is an America/New_York civil date,
/// not a UTC timestamp, so two contests never straddle a daylight-saving
/// boundary.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Contest {
    pub id: Uuid,
    #[serde(rename = "gameDay")]
    pub game_day: chrono::NaiveDate,
    pub status: ContestStatus,
    #[serde(rename = "startsAt")]
    pub starts_at: DateTime<Utc>,
    #[serde(rename = "endsAt")]
    pub ends_at: DateTime<Utc>,
    #[serde(rename = "entryFee")]
    pub entry_fee: i64,
    #[serde(rename = "entryCount")]
    pub entry_count: i32,
    #[serde(rename = "totalPrizePool")]
    pub total_prize_pool: Decimal,
    #[serde(rename = "totalSharesEntered")]
    pub total_shares_entered: i64,
}

/// A user's entry into a contest. Shares named in its lineup are burned
/// (removed from `Holding`) on entry -- not locked, since
/// contest entries cannot be cancelled once the contest is live. `rank` is
/// only meaningful once the contest has settled; `None` before that.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContestEntry {
    pub id: Uuid,
    #[serde(rename = "contestId")]
    pub contest_id: Uuid,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    #[serde(rename = "totalSharesEntered")]
    pub total_shares_entered: i64,
    #[serde(rename = "totalScore")]
    pub total_score: Decimal,
    pub rank: Option<i32>,
    pub payout: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

/// One row per player in an entry's lineup. `fantasy_points` is the
/// player's total for the contest's game day, copied in at scoring time so
/// the per-row breakdown survives even if the player's rolling stats move
/// on. `earned_score` is this row's share of `fantasy_points`, proportional
/// to `shares_entered` against every entry's shares of the same player.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContestLineup {
    pub entry_id: Uuid,
    pub player_id: Uuid,
    #[serde(rename = "sharesEntered")]
    pub shares_entered: i64,
    #[serde(rename = "fantasyPoints")]
    pub fantasy_points: Option<Decimal>,
    #[serde(rename = "earnedScore")]
    pub earned_score: Option<Decimal>,
}

#[derive(Debug, Deserialize, validator::Validate)]
pub struct EnterContestRequest {
    #[validate(length(min = 1))]
    pub lineup: Vec<LineupSlot>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LineupSlot {
    pub player_id: Uuid,
    #[serde(default, rename = "sharesEntered")]
    pub shares_entered: i64,
}

/// Full entry shape for edit requests -- replaces the entry's lineup
/// wholesale, refunding burned shares from the old lineup before burning the
/// new one.
#[derive(Debug, Deserialize, validator::Validate)]
pub struct EditContestRequest {
    #[validate(length(min = 1))]
    pub lineup: Vec<LineupSlot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContestEntryResponse {
    pub entry: ContestEntry,
    pub lineup: Vec<ContestLineup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardRow {
    pub user_id: Uuid,
    pub username: String,
    pub total_score: Decimal,
    pub payout: Option<Decimal>,
    pub rank: i64,
}
