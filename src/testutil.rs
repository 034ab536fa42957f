// Hand-rolled in-memory fakes shared by the unit tests. They mirror the
// semantics of the Mongo adapters, including the conditional lock write
// and the unique prediction key.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::database::match_repo::MatchRepository;
use crate::database::prediction_repo::PredictionRepository;
use crate::errors::{AppError, Result};
use crate::models::matches::{Match, MatchStatus};
use crate::models::prediction::Prediction;
use crate::services::clock::Clock;
use crate::services::fixture_source::{FixtureData, FixtureSource};
use crate::services::whatsapp::Notifier;

pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[derive(Default)]
pub struct InMemoryMatchRepository {
    matches: Mutex<HashMap<String, Match>>,
}

impl InMemoryMatchRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, match_id: &str) -> Option<Match> {
        self.matches.lock().unwrap().get(match_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.matches.lock().unwrap().len()
    }

    fn sorted(&self, mut selected: Vec<Match>) -> Vec<Match> {
        selected.sort_by_key(|m| m.kickoff());
        selected
    }
}

#[async_trait]
impl MatchRepository for InMemoryMatchRepository {
    async fn find_by_id(&self, match_id: &str) -> Result<Option<Match>> {
        Ok(self.get(match_id))
    }

    async fn find_all_finished(&self) -> Result<Vec<Match>> {
        let selected = self
            .matches
            .lock()
            .unwrap()
            .values()
            .filter(|m| m.status == MatchStatus::Finished)
            .cloned()
            .collect();
        Ok(self.sorted(selected))
    }

    async fn find_upcoming(&self, now: DateTime<Utc>) -> Result<Vec<Match>> {
        let selected = self
            .matches
            .lock()
            .unwrap()
            .values()
            .filter(|m| m.kickoff() >= now)
            .cloned()
            .collect();
        Ok(self.sorted(selected))
    }

    async fn find_locking_within(&self, now: DateTime<Utc>, window: Duration) -> Result<Vec<Match>> {
        let selected = self
            .matches
            .lock()
            .unwrap()
            .values()
            .filter(|m| !m.locked && m.kickoff() >= now && m.kickoff() < now + window)
            .cloned()
            .collect();
        Ok(self.sorted(selected))
    }

    async fn find_missing_result(
        &self,
        now: DateTime<Utc>,
        threshold: Duration,
    ) -> Result<Vec<Match>> {
        let selected = self
            .matches
            .lock()
            .unwrap()
            .values()
            .filter(|m| {
                m.kickoff() < now - threshold
                    && m.result.is_none()
                    && m.status != MatchStatus::Scheduled
            })
            .cloned()
            .collect();
        Ok(self.sorted(selected))
    }

    async fn save(&self, m: &Match) -> Result<()> {
        self.matches
            .lock()
            .unwrap()
            .insert(m.match_id.clone(), m.clone());
        Ok(())
    }

    async fn try_lock(&self, match_id: &str, locked_at: DateTime<Utc>) -> Result<bool> {
        let mut matches = self.matches.lock().unwrap();
        match matches.get_mut(match_id) {
            Some(m) if !m.locked => {
                m.mark_locked(locked_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct InMemoryPredictionRepository {
    predictions: Mutex<Vec<Prediction>>,
}

impl InMemoryPredictionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PredictionRepository for InMemoryPredictionRepository {
    async fn find_by_user_and_match(
        &self,
        user_id: &str,
        match_id: &str,
        group_id: &str,
    ) -> Result<Option<Prediction>> {
        Ok(self
            .predictions
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.user_id == user_id && p.match_id == match_id && p.group_id == group_id)
            .cloned())
    }

    async fn find_by_group(&self, group_id: &str) -> Result<Vec<Prediction>> {
        Ok(self
            .predictions
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.group_id == group_id)
            .cloned()
            .collect())
    }

    async fn count_by_match(&self, match_id: &str) -> Result<u64> {
        Ok(self
            .predictions
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.match_id == match_id)
            .count() as u64)
    }

    async fn save(&self, prediction: &Prediction) -> Result<()> {
        let mut predictions = self.predictions.lock().unwrap();
        let duplicate = predictions.iter().any(|p| {
            p.user_id == prediction.user_id
                && p.match_id == prediction.match_id
                && p.group_id == prediction.group_id
        });
        if duplicate {
            return Err(AppError::PredictionExists);
        }
        predictions.push(prediction.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    fail: Mutex<bool>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_all(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_message(&self, to: &str, text: &str) -> Result<Option<String>> {
        if *self.fail.lock().unwrap() {
            return Err(AppError::upstream("notifier down"));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push((to.to_string(), text.to_string()));
        Ok(Some(format!("wamid.test.{}", sent.len())))
    }
}

#[derive(Default)]
pub struct ScriptedFixtureSource {
    fixtures: Mutex<Vec<FixtureData>>,
    fail_next: Mutex<bool>,
}

impl ScriptedFixtureSource {
    pub fn new(fixtures: Vec<FixtureData>) -> Self {
        Self {
            fixtures: Mutex::new(fixtures),
            fail_next: Mutex::new(false),
        }
    }

    pub fn set(&self, fixtures: Vec<FixtureData>) {
        *self.fixtures.lock().unwrap() = fixtures;
    }

    pub fn fail_next(&self) {
        *self.fail_next.lock().unwrap() = true;
    }
}

#[async_trait]
impl FixtureSource for ScriptedFixtureSource {
    async fn fetch_today(&self) -> Result<Vec<FixtureData>> {
        let mut fail = self.fail_next.lock().unwrap();
        if *fail {
            *fail = false;
            return Err(AppError::upstream("fixture API down"));
        }
        Ok(self.fixtures.lock().unwrap().clone())
    }
}
