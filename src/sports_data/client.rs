use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use crate::models::{BoxScoreLine, GameUpsert, PlayerUpsert};

use super::rate_limit::RateLimiter;
use super::types::{DailyGamelogsResponse, PlayerListResponse, ScheduleResponse};

const BASE_URL: &str = "https://api.mysportsfeeds.com/v2.1/pull/nba";

#[derive(Debug, thiserror::Error)]
pub enum SportsDataError {
    #[error("rate limited, skipping this cycle")]
    RateLimited,
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("provider returned status {0}")]
    BadStatus(u16),
}

/// One row extracted from the daily gamelogs feed, normalized to the ids
/// and box-score fields the ledger actually stores.
#[derive(Debug, Clone)]
pub struct GamelogRow {
    pub player_external_id: String,
    pub game_external_id: String,
    pub line: BoxScoreLine,
}

pub struct SportsDataClient {
    http: reqwest::Client,
    api_key: String,
    limiter: Arc<RateLimiter>,
}

impl SportsDataClient {
    pub fn new(api_key: String) -> Self {
        let http = reqwest::Client::builder()
            .gzip(true)
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client builds with static config");

        Self { http, api_key, limiter: Arc::new(RateLimiter::new()) }
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, endpoint: &'static str, url: String) -> Result<T, SportsDataError> {
        if !self.limiter.try_acquire(endpoint) {
            return Err(SportsDataError::RateLimited);
        }

        let result = self
            .http
            .get(&url)
            .basic_auth(&self.api_key, Some("MYSPORTSFEEDS"))
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                let body = resp.json::<T>().await?;
                self.limiter.record_success(endpoint);
                Ok(body)
            }
            Ok(resp) => {
                self.limiter.record_error(endpoint);
                Err(SportsDataError::BadStatus(resp.status().as_u16()))
            }
            Err(err) => {
                self.limiter.record_error(endpoint);
                Err(SportsDataError::Request(err))
            }
        }
    }

    pub async fn fetch_season_roster(&self, season: &str) -> Result<Vec<PlayerUpsert>, SportsDataError> {
        let url = format!("{BASE_URL}/{season}/players.json");
        let body: PlayerListResponse = self.get("roster", url).await?;
        Ok(body.players.into_iter().map(|e| e.player.into()).collect())
    }

    pub async fn fetch_schedule(&self, season: &str) -> Result<Vec<GameUpsert>, SportsDataError> {
        let url = format!("{BASE_URL}/{season}/games.json");
        let body: ScheduleResponse = self.get("schedule", url).await?;
        Ok(body.games.into_iter().map(|e| e.schedule.into()).collect())
    }

    pub async fn fetch_daily_gamelogs(&self, season: &str, day: NaiveDate) -> Result<Vec<GamelogRow>, SportsDataError> {
        let url = format!("{BASE_URL}/{season}/date/{}/player_gamelogs.json", day.format("%Y%m%d"));
        let body: DailyGamelogsResponse = self.get("daily_gamelogs", url).await?;
        Ok(body
            .gamelogs
            .into_iter()
            .map(|g| GamelogRow {
                player_external_id: g.player.id,
                game_external_id: g.game.id,
                line: BoxScoreLine::from(&g.stats),
            })
            .collect())
    }

    pub async fn fetch_player_backfill(
        &self,
        season: &str,
        player_external_id: &str,
    ) -> Result<Vec<GamelogRow>, SportsDataError> {
        let url = format!("{BASE_URL}/{season}/player_gamelogs.json?player={player_external_id}");
        let body: DailyGamelogsResponse = self.get("player_backfill", url).await?;
        Ok(body
            .gamelogs
            .into_iter()
            .map(|g| GamelogRow {
                player_external_id: g.player.id,
                game_external_id: g.game.id,
                line: BoxScoreLine::from(&g.stats),
            })
            .collect())
    }
}
