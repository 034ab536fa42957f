use std::collections::HashMap;
use std::sync::Arc;

use validator::Validate;

use crate::database::match_repo::MatchRepository;
use crate::database::prediction_repo::PredictionRepository;
use crate::errors::{AppError, Result};
use crate::models::matches::{CreateMatch, Match, MatchStatus, Outcome};
use crate::models::prediction::{Prediction, ScoreEntry};
use crate::scoring::score;
use crate::services::clock::Clock;

/// Request-path operations: match creation, prediction submission, result
/// recording, leaderboard reads. All guards live here, ahead of storage.
pub struct PredictionService {
    match_repo: Arc<dyn MatchRepository>,
    prediction_repo: Arc<dyn PredictionRepository>,
    clock: Arc<dyn Clock>,
}

impl PredictionService {
    pub fn new(
        match_repo: Arc<dyn MatchRepository>,
        prediction_repo: Arc<dyn PredictionRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            match_repo,
            prediction_repo,
            clock,
        }
    }

    pub async fn create_match(&self, payload: CreateMatch) -> Result<Match> {
        payload
            .validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        if self.match_repo.find_by_id(&payload.match_id).await?.is_some() {
            return Err(AppError::MatchExists(payload.match_id));
        }

        let m = Match::new(
            payload.match_id,
            payload.team_a,
            payload.team_b,
            payload.kickoff_time,
            self.clock.now(),
        );
        self.match_repo.save(&m).await?;
        Ok(m)
    }

    /// Preconditions checked in order, first failure wins:
    /// unknown match, locked match (flag or kickoff passed), duplicate key.
    pub async fn submit_prediction(
        &self,
        user_id: &str,
        match_id: &str,
        group_id: &str,
        choice: Outcome,
    ) -> Result<Prediction> {
        let m = self
            .match_repo
            .find_by_id(match_id)
            .await?
            .ok_or_else(|| AppError::not_found(match_id))?;

        let now = self.clock.now();
        if m.is_locked(now) {
            return Err(AppError::locked(match_id));
        }

        if self
            .prediction_repo
            .find_by_user_and_match(user_id, match_id, group_id)
            .await?
            .is_some()
        {
            return Err(AppError::PredictionExists);
        }

        let prediction = Prediction::new(match_id, user_id, group_id, choice, now);
        self.prediction_repo.save(&prediction).await?;
        Ok(prediction)
    }

    pub async fn submit_result(&self, match_id: &str, result: Outcome) -> Result<Match> {
        let mut m = self
            .match_repo
            .find_by_id(match_id)
            .await?
            .ok_or_else(|| AppError::not_found(match_id))?;

        m.finish(result);
        self.match_repo.save(&m).await?;
        Ok(m)
    }

    /// Folds the group's predictions against every finished match.
    /// Predictions on unfinished or unknown matches contribute nothing.
    pub async fn leaderboard(&self, group_id: &str) -> Result<Vec<ScoreEntry>> {
        let finished = self.match_repo.find_all_finished().await?;
        let predictions = self.prediction_repo.find_by_group(group_id).await?;

        let results: HashMap<&str, Outcome> = finished
            .iter()
            .filter(|m| m.status == MatchStatus::Finished)
            .filter_map(|m| m.result.map(|r| (m.match_id.as_str(), r)))
            .collect();

        let mut totals: HashMap<String, i32> = HashMap::new();
        for p in &predictions {
            if let Some(result) = results.get(p.match_id.as_str()) {
                *totals.entry(p.user_id.clone()).or_insert(0) += score(p.choice, *result);
            }
        }

        let mut entries: Vec<ScoreEntry> = totals
            .into_iter()
            .map(|(user_id, score)| ScoreEntry { user_id, score })
            .collect();
        // Descending by score; ascending userId keeps ties deterministic.
        entries.sort_by(|a, b| b.score.cmp(&a.score).then(a.user_id.cmp(&b.user_id)));
        Ok(entries)
    }

    pub async fn upcoming_matches(&self) -> Result<Vec<Match>> {
        self.match_repo.find_upcoming(self.clock.now()).await
    }

    pub async fn predictions_for(
        &self,
        group_id: &str,
        match_id: Option<&str>,
    ) -> Result<Vec<Prediction>> {
        let mut predictions = self.prediction_repo.find_by_group(group_id).await?;
        if let Some(id) = match_id {
            predictions.retain(|p| p.match_id == id);
        }
        Ok(predictions)
    }
}
