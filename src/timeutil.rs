//! The only timezone-sensitive reasoning in the system: converting a UTC
//! instant into its America/New_York calendar date, the "game day" that
//! groups games and contests. Every other time computation in this crate
//! stays in UTC.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::America::New_York;

/// The America/New_York civil date a UTC instant falls on.
pub fn game_day(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&New_York).date_naive()
}

/// Current America/New_York wall-clock time, used by daily/hourly scheduler
/// jobs to decide whether today's run is due.
pub fn now_et() -> DateTime<chrono_tz::Tz> {
    Utc::now().with_timezone(&New_York)
}

/// The UTC instant of `hour:minute` America/New_York on the civil date
/// `now_et` falls on. Used by daily jobs to compute their next run time;
/// callers add a day if the result has already passed.
pub fn et_today_at(hour: u32, minute: u32) -> DateTime<Utc> {
    let et_now = now_et();
    let naive_date = et_now.date_naive();
    let naive_time = chrono::NaiveTime::from_hms_opt(hour, minute, 0).expect("valid hms");
    New_York
        .from_local_datetime(&naive_date.and_time(naive_time))
        .single()
        .unwrap_or_else(|| New_York.from_utc_datetime(&naive_date.and_time(naive_time)))
        .with_timezone(&Utc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn game_day_crosses_midnight_utc_before_et() {
        // 2026-01-02 02:00 UTC is still 2026-01-01 21:00 in New York.
        let instant = Utc.with_ymd_and_hms(2026, 1, 2, 2, 0, 0).unwrap();
        assert_eq!(game_day(instant), NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    }

    #[test]
    fn game_day_matches_utc_date_during_et_daytime() {
        let instant = Utc.with_ymd_and_hms(2026, 6, 15, 20, 0, 0).unwrap();
        assert_eq!(game_day(instant), NaiveDate::from_ymd_opt(2026, 6, 15).unwrap());
    }
}
