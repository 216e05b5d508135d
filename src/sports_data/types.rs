use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::models::{BoxScoreLine, GameStatus, GameUpsert, PlayerUpsert};

/// One entry of the provider's season roster feed.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderPlayer {
    pub id: String,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    #[serde(rename = "currentTeam")]
    pub current_team: Option<ProviderTeamRef>,
    #[serde(rename = "primaryPosition")]
    pub primary_position: Option<String>,
    #[serde(rename = "currentRosterStatus")]
    pub current_roster_status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderTeamRef {
    pub abbreviation: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerListResponse {
    pub players: Vec<ProviderPlayerEnvelope>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderPlayerEnvelope {
    pub player: ProviderPlayer,
}

impl From<ProviderPlayer> for PlayerUpsert {
    fn from(p: ProviderPlayer) -> Self {
        let is_active = p
            .current_roster_status
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("ROSTER"))
            .unwrap_or(true);
        Self {
            external_id: p.id,
            name: format!("{} {}", p.first_name, p.last_name),
            team: p.current_team.map(|t| t.abbreviation).unwrap_or_default(),
            position: p.primary_position.unwrap_or_else(|| "N/A".to_string()),
            is_active,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleResponse {
    pub games: Vec<ProviderGameEnvelope>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderGameEnvelope {
    pub schedule: ProviderGame,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderGame {
    pub id: String,
    #[serde(rename = "startTime")]
    pub start_time: DateTime<Utc>,
    #[serde(rename = "homeTeam")]
    pub home_team: ProviderTeamRef,
    #[serde(rename = "awayTeam")]
    pub away_team: ProviderTeamRef,
    #[serde(rename = "playedStatus")]
    pub played_status: String,
}

impl From<ProviderGame> for GameUpsert {
    fn from(g: ProviderGame) -> Self {
        Self {
            external_id: g.id,
            home_team: g.home_team.abbreviation,
            away_team: g.away_team.abbreviation,
            starts_at: g.start_time,
            status: GameStatus::normalize(&g.played_status),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DailyGamelogsResponse {
    pub gamelogs: Vec<ProviderGamelog>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderGamelog {
    pub game: ProviderGamelogGame,
    pub player: ProviderGamelogPlayer,
    pub stats: ProviderGamelogStats,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderGamelogGame {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderGamelogPlayer {
    pub id: String,
}

/// The provider's per-category nesting. Only the categories the fantasy
/// formula consumes are modeled; anything else in the payload is dropped
/// by serde's default field-skipping.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderGamelogStats {
    pub offense: ProviderOffenseStats,
    pub defense: ProviderDefenseStats,
    pub rebounds: ProviderReboundStats,
    #[serde(rename = "fieldGoals")]
    pub field_goals: ProviderFieldGoalStats,
    #[serde(rename = "freeThrows", default)]
    pub free_throws: Option<ProviderFreeThrowStats>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderOffenseStats {
    #[serde(rename = "pts")]
    pub pts: f64,
    #[serde(rename = "astPerGame", default)]
    pub ast: f64,
    #[serde(rename = "tov", default)]
    pub tov: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderDefenseStats {
    #[serde(default)]
    pub stl: f64,
    #[serde(default)]
    pub blk: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderReboundStats {
    #[serde(rename = "reb", default)]
    pub reb: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderFieldGoalStats {
    #[serde(rename = "fg3PtMade", default)]
    pub three_pm: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderFreeThrowStats {
    #[serde(default)]
    pub ftm: f64,
}

impl From<&ProviderGamelogStats> for BoxScoreLine {
    fn from(s: &ProviderGamelogStats) -> Self {
        use rust_decimal::prelude::FromPrimitive;
        use rust_decimal::Decimal;

        Self {
            pts: Decimal::from_f64(s.offense.pts).unwrap_or_default(),
            three_pm: Decimal::from_f64(s.field_goals.three_pm).unwrap_or_default(),
            reb: Decimal::from_f64(s.rebounds.reb).unwrap_or_default(),
            ast: Decimal::from_f64(s.offense.ast).unwrap_or_default(),
            stl: Decimal::from_f64(s.defense.stl).unwrap_or_default(),
            blk: Decimal::from_f64(s.defense.blk).unwrap_or_default(),
            tov: Decimal::from_f64(s.offense.tov).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}
