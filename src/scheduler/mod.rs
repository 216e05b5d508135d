//! Scheduler: periodic jobs driving roster/schedule/stats ingestion,
//! contest state transitions, the bot fleet, and portfolio snapshots.
//! Every run is recorded in `job_log`; a job that errors on
//! some but not all of its records finishes `degraded` rather than
//! `failed`, and a per-job timeout bounds a hung run so it can never block
//! its siblings -- each job ticks on its own `tokio::spawn`ed loop.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::bots::BotFleet;
use crate::contest::ContestEngine;
use crate::ledger;
use crate::models::{ContestStatus, JobStatus};
use crate::sports_data::{GamelogRow, SportsDataClient};
use crate::timeutil;
use crate::websocket::messages::{BroadcastMessage, Broadcaster};

const JOB_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_ENTRY_FEE: i64 = 10;

/// `(records_in_error, detail)`. An empty-error run finishes `success`; a
/// partial-error run finishes `degraded` with `error_count` set.
type JobOutcome = Result<(i32, Option<String>), SchedulerError>;
type JobFuture = Pin<Box<dyn Future<Output = JobOutcome> + Send>>;

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Contest(#[from] crate::contest::ContestError),
    #[error(transparent)]
    Bot(#[from] crate::bots::BotError),
    #[error(transparent)]
    SportsData(#[from] crate::sports_data::SportsDataError),
}

pub struct Scheduler {
    pool: PgPool,
    season: String,
    contests: Arc<ContestEngine>,
    bots: Arc<BotFleet>,
    sports_data: Arc<SportsDataClient>,
    broadcast: Broadcaster,
}

impl Scheduler {
    pub fn new(
        pool: PgPool,
        season: String,
        contests: Arc<ContestEngine>,
        bots: Arc<BotFleet>,
        sports_data: Arc<SportsDataClient>,
        broadcast: Broadcaster,
    ) -> Self {
        Self { pool, season, contests, bots, sports_data, broadcast }
    }

    /// Spawns one background loop per named job, each on its own
    /// `tokio::time::interval` or daily-at-ET-clock-time timer.
    pub fn spawn_all(self: &Arc<Self>, bot_tick_interval: Duration) {
        self.spawn_daily_at(5, 0, "ingest_roster", |s| Box::pin(async move { s.run_ingest_roster().await }));
        self.spawn_every(Duration::from_secs(60), "ingest_schedule", |s| Box::pin(async move { s.run_ingest_schedule().await }));
        self.spawn_every(Duration::from_secs(60), "ingest_stats_live", |s| Box::pin(async move { s.run_ingest_stats_live().await }));
        self.spawn_every(Duration::from_secs(3600), "ingest_stats_historical", |s| Box::pin(async move { s.run_ingest_stats_historical().await }));
        self.spawn_daily_at(6, 0, "ingest_game_logs", |s| Box::pin(async move { s.run_ingest_game_logs().await }));
        self.spawn_every(Duration::from_secs(60), "update_contest_statuses", |s| Box::pin(async move { s.run_update_contest_statuses().await }));
        self.spawn_every(Duration::from_secs(300), "settle_contests", |s| Box::pin(async move { s.run_settle_contests().await }));
        self.spawn_daily_at(0, 0, "create_contests", |s| Box::pin(async move { s.run_create_contests().await }));
        self.spawn_every(bot_tick_interval, "bot_engine", |s| Box::pin(async move { s.run_bot_engine().await }));
        self.spawn_daily_at(23, 55, "portfolio_snapshot", |s| Box::pin(async move { s.run_portfolio_snapshot().await }));
    }

    fn spawn_every<F>(self: &Arc<Self>, period: Duration, job_name: &'static str, job: F)
    where
        F: Fn(Arc<Self>) -> JobFuture + Send + Sync + 'static,
    {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                scheduler.run_recorded(job_name, job(Arc::clone(&scheduler))).await;
            }
        });
    }

    fn spawn_daily_at<F>(self: &Arc<Self>, hour: u32, minute: u32, job_name: &'static str, job: F)
    where
        F: Fn(Arc<Self>) -> JobFuture + Send + Sync + 'static,
    {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                let mut target = timeutil::et_today_at(hour, minute);
                if target <= Utc::now() {
                    target += ChronoDuration::days(1);
                }
                let wait = (target - Utc::now()).to_std().unwrap_or(Duration::from_secs(1));
                tokio::time::sleep(wait).await;
                scheduler.run_recorded(job_name, job(Arc::clone(&scheduler))).await;
            }
        });
    }

    async fn run_recorded(&self, job_name: &'static str, fut: impl Future<Output = JobOutcome>) {
        let log_id = match ledger::job_log::start(&self.pool, job_name).await {
            Ok(id) => id,
            Err(err) => {
                tracing::error!(job = job_name, %err, "failed to write job_log start row");
                return;
            }
        };

        let (status, error_count, detail) = match tokio::time::timeout(JOB_TIMEOUT, fut).await {
            Ok(Ok((0, detail))) => (JobStatus::Success, 0, detail),
            Ok(Ok((errors, detail))) => (JobStatus::Degraded, errors, detail),
            Ok(Err(err)) => (JobStatus::Failed, 0, Some(err.to_string())),
            Err(_) => (JobStatus::Failed, 0, Some("job exceeded its timeout".to_string())),
        };

        let status_label = match status {
            JobStatus::Running => "running",
            JobStatus::Success => "success",
            JobStatus::Degraded => "degraded",
            JobStatus::Failed => "failed",
        };
        crate::metrics::record_scheduler_job_run(job_name, status_label);

        match status {
            JobStatus::Failed => tracing::error!(job = job_name, ?detail, "scheduler job failed"),
            JobStatus::Degraded => tracing::warn!(job = job_name, error_count, "scheduler job degraded"),
            _ => {}
        }

        if let Err(err) = ledger::job_log::finish(&self.pool, log_id, status, error_count, detail).await {
            tracing::error!(job = job_name, %err, "failed to write job_log finish row");
        }
    }

    async fn run_ingest_roster(&self) -> JobOutcome {
        let roster = match self.sports_data.fetch_season_roster(&self.season).await {
            Ok(roster) => roster,
            Err(err) => return Ok((1, Some(err.to_string()))),
        };

        let mut errors = 0;
        for payload in &roster {
            if let Err(err) = ledger::players::upsert(&self.pool, &payload.external_id, payload).await {
                tracing::warn!(player = %payload.external_id, %err, "roster upsert failed");
                errors += 1;
            }
        }
        Ok((errors, None))
    }

    async fn run_ingest_schedule(&self) -> JobOutcome {
        let games = match self.sports_data.fetch_schedule(&self.season).await {
            Ok(games) => games,
            Err(err) => return Ok((1, Some(err.to_string()))),
        };

        let mut errors = 0;
        for payload in &games {
            match ledger::games::upsert_game(&self.pool, payload).await {
                Ok(game) => {
                    self.broadcast.send(BroadcastMessage::LiveStats { game_id: game.id }).ok();
                }
                Err(err) => {
                    tracing::warn!(game = %payload.external_id, %err, "schedule upsert failed");
                    errors += 1;
                }
            }
        }
        Ok((errors, None))
    }

    async fn run_ingest_stats_live(&self) -> JobOutcome {
        let in_progress = ledger::games::list_in_progress(&self.pool).await?;
        if in_progress.is_empty() {
            return Ok((0, None));
        }
        self.ingest_gamelogs_for_day(timeutil::game_day(Utc::now())).await
    }

    /// Covers the last 24h, which never spans more than today's and
    /// yesterday's America/New_York game day.
    async fn run_ingest_stats_historical(&self) -> JobOutcome {
        let today = timeutil::game_day(Utc::now());
        let mut errors = 0;
        for offset in 0..=1 {
            let (day_errors, _) = self.ingest_gamelogs_for_day(today - ChronoDuration::days(offset)).await?;
            errors += day_errors;
        }
        Ok((errors, None))
    }

    async fn run_ingest_game_logs(&self) -> JobOutcome {
        let yesterday = timeutil::game_day(Utc::now()) - ChronoDuration::days(1);
        self.ingest_gamelogs_for_day(yesterday).await
    }

    async fn ingest_gamelogs_for_day(&self, day: NaiveDate) -> JobOutcome {
        let rows = match self.sports_data.fetch_daily_gamelogs(&self.season, day).await {
            Ok(rows) => rows,
            Err(err) => return Ok((1, Some(err.to_string()))),
        };

        let mut errors = 0;
        for row in &rows {
            if let Err(err) = self.upsert_gamelog_row(row).await {
                tracing::warn!(player = %row.player_external_id, %err, "gamelog upsert failed");
                errors += 1;
            }
        }
        Ok((errors, None))
    }

    async fn upsert_gamelog_row(&self, row: &GamelogRow) -> Result<(), sqlx::Error> {
        let player = sqlx::query_scalar::<_, Uuid>("SELECT id FROM players WHERE external_id = $1")
            .bind(&row.player_external_id)
            .fetch_optional(&self.pool)
            .await?;
        let game = sqlx::query_scalar::<_, Uuid>("SELECT id FROM games WHERE external_id = $1")
            .bind(&row.game_external_id)
            .fetch_optional(&self.pool)
            .await?;

        let (Some(player_id), Some(game_id)) = (player, game) else {
            return Ok(());
        };

        ledger::games::upsert_player_stat(&self.pool, player_id, game_id, row.line).await?;
        self.broadcast.send(BroadcastMessage::LiveStats { game_id }).ok();
        Ok(())
    }

    async fn run_update_contest_statuses(&self) -> JobOutcome {
        let open = ledger::contests::list_open(&self.pool).await?;
        let mut errors = 0;
        for contest in &open {
            match self.contests.open_to_live_if_due(contest.id).await {
                Ok(true) => {
                    self.broadcast
                        .send(BroadcastMessage::ContestUpdate { contest_id: Some(contest.id), game_id: None })
                        .ok();
                }
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(contest = %contest.id, %err, "contest status update failed");
                    errors += 1;
                }
            }
        }
        Ok((errors, None))
    }

    async fn run_settle_contests(&self) -> JobOutcome {
        let live = ledger::contests::list_by_status(&self.pool, ContestStatus::Live).await?;
        let mut errors = 0;
        for contest in &live {
            if let Err(err) = self.contests.score(contest.id).await {
                tracing::warn!(contest = %contest.id, %err, "contest scoring failed");
                errors += 1;
                continue;
            }

            match self.contests.ready_to_settle(contest).await {
                Ok(true) => match self.contests.settle(contest.id).await {
                    Ok(()) => {
                        self.broadcast
                            .send(BroadcastMessage::ContestUpdate { contest_id: Some(contest.id), game_id: None })
                            .ok();
                    }
                    Err(err) => {
                        tracing::warn!(contest = %contest.id, %err, "contest settlement failed");
                        errors += 1;
                    }
                },
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(contest = %contest.id, %err, "contest readiness check failed");
                    errors += 1;
                }
            }
        }
        Ok((errors, None))
    }

    async fn run_create_contests(&self) -> JobOutcome {
        let today = timeutil::game_day(Utc::now());
        let mut errors = 0;
        for offset in 0..=7 {
            let day = today + ChronoDuration::days(offset);
            let games = ledger::games::get_games_by_day(&self.pool, day).await?;
            if games.is_empty() {
                continue;
            }
            let starts_at = games.iter().map(|g| g.starts_at).min().expect("non-empty");
            let ends_at = starts_at + ChronoDuration::hours(6);

            if let Err(err) = ledger::contests::create(&self.pool, day, starts_at, ends_at, DEFAULT_ENTRY_FEE).await {
                tracing::warn!(day = %day, %err, "contest creation failed");
                errors += 1;
            }
        }
        Ok((errors, None))
    }

    async fn run_bot_engine(&self) -> JobOutcome {
        let summary = self.bots.run_tick().await?;
        Ok((summary.strategy_errors as i32, None))
    }

    async fn run_portfolio_snapshot(&self) -> JobOutcome {
        let today = timeutil::game_day(Utc::now());
        ledger::snapshots::write_daily(&self.pool, today).await?;
        Ok((0, None))
    }

    /// Runs one named job on demand, recorded in `job_log` exactly like a
    /// scheduled run, for the admin "trigger any job" endpoint.
    pub async fn trigger(&self, job_name: &str) -> Result<(), String> {
        match job_name {
            "ingest_roster" => self.run_recorded("ingest_roster", self.run_ingest_roster()).await,
            "ingest_schedule" => self.run_recorded("ingest_schedule", self.run_ingest_schedule()).await,
            "ingest_stats_live" => self.run_recorded("ingest_stats_live", self.run_ingest_stats_live()).await,
            "ingest_stats_historical" => {
                self.run_recorded("ingest_stats_historical", self.run_ingest_stats_historical()).await
            }
            "ingest_game_logs" => self.run_recorded("ingest_game_logs", self.run_ingest_game_logs()).await,
            "update_contest_statuses" => {
                self.run_recorded("update_contest_statuses", self.run_update_contest_statuses()).await
            }
            "settle_contests" => self.run_recorded("settle_contests", self.run_settle_contests()).await,
            "create_contests" => self.run_recorded("create_contests", self.run_create_contests()).await,
            "bot_engine" => self.run_recorded("bot_engine", self.run_bot_engine()).await,
            "portfolio_snapshot" => self.run_recorded("portfolio_snapshot", self.run_portfolio_snapshot()).await,
            other => return Err(format!("unknown job '{other}'")),
        }
        Ok(())
    }

    /// Backfills every available gamelog for one player regardless of game
    /// day, for the admin date-range backfill endpoint. Returns the number
    /// of rows that failed to upsert.
    pub async fn backfill_player(&self, player_external_id: &str) -> Result<i32, SchedulerError> {
        let rows = self.sports_data.fetch_player_backfill(&self.season, player_external_id).await?;

        let mut errors = 0;
        for row in &rows {
            if self.upsert_gamelog_row(row).await.is_err() {
                errors += 1;
            }
        }
        Ok(errors)
    }
}

#[cfg(test)]
mod tests {
    // Integration tests would require a database connection.
}
