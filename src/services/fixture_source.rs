use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::errors::{AppError, Result};

/// A candidate fixture before it is persisted as a Match entity.
#[derive(Debug, Clone)]
pub struct FixtureData {
    pub match_id: String,
    pub home_team: String,
    pub away_team: String,
    pub kickoff_time: DateTime<Utc>,
}

/// External source of today's candidate fixtures. Transport failures map to
/// UpstreamUnavailable and are contained by the calling task.
#[async_trait]
pub trait FixtureSource: Send + Sync {
    async fn fetch_today(&self) -> Result<Vec<FixtureData>>;
}

const BASE_URL: &str = "https://api.live-score-api.com/api-football";
const COMPETITION: &str = "AFCON_2025";
const TIMEZONE: &str = "Africa/Casablanca";

pub struct LiveScoreFixtureClient {
    api_key: String,
    base_url: String,
    client: Client,
}

impl LiveScoreFixtureClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: BASE_URL.to_string(),
            client: Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TodayResponse {
    #[serde(default)]
    matches: Vec<ApiMatch>,
}

#[derive(Debug, Deserialize)]
struct ApiMatch {
    id: i64,
    home_team: TeamRef,
    away_team: TeamRef,
    kickoff_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct TeamRef {
    name: String,
}

#[async_trait]
impl FixtureSource for LiveScoreFixtureClient {
    async fn fetch_today(&self) -> Result<Vec<FixtureData>> {
        let url = format!("{}/matches/today", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(&[("competition", COMPETITION), ("timezone", TIMEZONE)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::upstream(format!(
                "Fixture API responded with status: {}",
                response.status()
            )));
        }

        let body: TodayResponse = response.json().await?;

        Ok(body
            .matches
            .into_iter()
            .map(|m| FixtureData {
                match_id: format!("AFCON{}", m.id),
                home_team: m.home_team.name,
                away_team: m.away_team.name,
                kickoff_time: m.kickoff_time,
            })
            .collect())
    }
}
