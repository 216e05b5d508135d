use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Normalized onto a three-way status: `{final,completed}` -> `Completed`,
/// `{live,inprogress,in-progress}` -> `Inprogress`, anything else ->
/// `Scheduled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "game_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Scheduled,
    Inprogress,
    Completed,
}

impl GameStatus {
    pub fn normalize(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "final" | "completed" => GameStatus::Completed,
            "live" | "inprogress" | "in-progress" => GameStatus::Inprogress,
            _ => GameStatus::Scheduled,
        }
    }
}

/// One scheduled or played game. `game_day` is the America/New_York civil
/// date of `starts_at`, stored denormalized so contest and scoring queries
/// never need a timezone conversion at read time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Game {
    pub id: Uuid,
    pub external_id: String,
    pub home_team: String,
    pub away_team: String,
    pub game_day: NaiveDate,
    pub starts_at: DateTime<Utc>,
    pub status: GameStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameUpsert {
    pub external_id: String,
    pub home_team: String,
    pub away_team: String,
    pub starts_at: DateTime<Utc>,
    pub status: GameStatus,
}

/// One player's box score in one game, plus the fantasy points derived
/// from it, computed once at ingestion time and reused by every contest
/// scoring pass that needs it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlayerGameStat {
    pub player_id: Uuid,
    pub game_id: Uuid,
    pub pts: Decimal,
    pub three_pm: Decimal,
    pub reb: Decimal,
    pub ast: Decimal,
    pub stl: Decimal,
    pub blk: Decimal,
    pub tov: Decimal,
    pub fantasy_points: Decimal,
}

/// Raw box-score line normalized from the provider's nested offense/
/// defense/rebounds/fieldGoals/freeThrows blocks down to the seven fields
/// the fantasy formula actually uses.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxScoreLine {
    pub pts: Decimal,
    pub three_pm: Decimal,
    pub reb: Decimal,
    pub ast: Decimal,
    pub stl: Decimal,
    pub blk: Decimal,
    pub tov: Decimal,
}

/// Fantasy-points formula: a weighted sum of the box score plus a
/// non-stacking bonus for a stat-stuffing performance. Pure so the scoring
/// pass and the bot fleet's fair-value model can both call it without a
/// database round trip.
pub fn fantasy_points(line: BoxScoreLine) -> Decimal {
    let base = line.pts
        + line.three_pm * Decimal::new(5, 1)
        + line.reb * Decimal::new(125, 2)
        + line.ast * Decimal::new(15, 1)
        + line.stl * Decimal::from(2)
        + line.blk * Decimal::from(2)
        - line.tov * Decimal::new(5, 1);

    let double_digit_count = [line.pts, line.reb, line.ast, line.stl, line.blk]
        .iter()
        .filter(|v| **v >= Decimal::from(10))
        .count();

    let bonus = if double_digit_count >= 3 {
        Decimal::from(3)
    } else if double_digit_count >= 2 {
        Decimal::new(15, 1)
    } else {
        Decimal::ZERO
    };

    base + bonus
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn triple_double_earns_the_three_point_bonus() {
        let line = BoxScoreLine {
            pts: dec!(25),
            three_pm: dec!(2),
            reb: dec!(11),
            ast: dec!(10),
            stl: dec!(1),
            blk: dec!(0),
            tov: dec!(3),
        };
        // 25 + 1.0 + 13.75 + 15.0 + 2.0 + 0.0 - 1.5 = 55.25, plus +3.0 bonus
        assert_eq!(fantasy_points(line), dec!(58.25));
    }

    #[test]
    fn single_double_digit_category_earns_no_bonus() {
        let line = BoxScoreLine {
            pts: dec!(22),
            three_pm: dec!(0),
            reb: dec!(4),
            ast: dec!(3),
            stl: dec!(1),
            blk: dec!(0),
            tov: dec!(2),
        };
        // 22 + 0 + 5.0 + 4.5 + 2.0 + 0 - 1.0 = 32.5, only one category >= 10, no bonus
        assert_eq!(fantasy_points(line), dec!(32.5));
    }
}
