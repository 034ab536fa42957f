//! Background match lifecycle engine — three independently-timed tasks
//! sharing the persisted match set with the request path:
//! daily fixture ingestion + announcement, per-minute lock transitions,
//! and a half-hourly missing-result nag for the admin.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, FixedOffset, Utc};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::database::match_repo::MatchRepository;
use crate::database::prediction_repo::PredictionRepository;
use crate::errors::{AppError, Result};
use crate::models::matches::Match;
use crate::services::clock::Clock;
use crate::services::fixture_source::{FixtureData, FixtureSource};
use crate::services::messages;
use crate::services::whatsapp::Notifier;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Group chat receiving announcements and lock notifications.
    pub group_id: String,
    /// Recipient of missing-result reminders.
    pub admin_id: String,
    /// Matches kicking off within this window get locked.
    pub lock_window: Duration,
    pub lock_scan_period: StdDuration,
    /// A finished-in-the-real-world match with no recorded result gets
    /// nagged about once kickoff is this far in the past.
    pub stale_threshold: Duration,
    pub reminder_period: StdDuration,
    /// Local hour of the daily fixture fetch.
    pub daily_fetch_hour: u32,
    /// Africa/Casablanca offset.
    pub utc_offset_hours: i32,
    /// Bound on every external call so a hung upstream cannot wedge a task.
    pub external_timeout: StdDuration,
}

impl SchedulerConfig {
    pub fn new(group_id: String, admin_id: String) -> Self {
        Self {
            group_id,
            admin_id,
            lock_window: Duration::minutes(15),
            lock_scan_period: StdDuration::from_secs(60),
            stale_threshold: Duration::hours(2),
            reminder_period: StdDuration::from_secs(30 * 60),
            daily_fetch_hour: 8,
            utc_offset_hours: 1,
            external_timeout: StdDuration::from_secs(10),
        }
    }
}

/// The engine object: owns nothing global, holds its collaborators, so
/// tests can stand up as many isolated instances as they like.
pub struct MatchScheduler {
    match_repo: Arc<dyn MatchRepository>,
    prediction_repo: Arc<dyn PredictionRepository>,
    fixture_source: Arc<dyn FixtureSource>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    cfg: SchedulerConfig,
}

impl MatchScheduler {
    pub fn new(
        match_repo: Arc<dyn MatchRepository>,
        prediction_repo: Arc<dyn PredictionRepository>,
        fixture_source: Arc<dyn FixtureSource>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        cfg: SchedulerConfig,
    ) -> Self {
        Self {
            match_repo,
            prediction_repo,
            fixture_source,
            notifier,
            clock,
            cfg,
        }
    }

    /// Spawns the three task loops. Each loop awaits its own run before the
    /// next tick, so successive invocations of the same task never overlap;
    /// failures are contained per invocation and the next tick retries.
    pub fn spawn(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        info!(
            "✅ Match scheduler started ({}h daily fetch + lock checks every {:?} + result nags every {:?})",
            self.cfg.daily_fetch_hour, self.cfg.lock_scan_period, self.cfg.reminder_period
        );
        vec![
            tokio::spawn(self.clone().run_daily_fetch()),
            tokio::spawn(self.clone().run_lock_scan()),
            tokio::spawn(self.clone().run_result_reminders()),
        ]
    }

    async fn run_daily_fetch(self: Arc<Self>) {
        loop {
            let wait = self.until_next_fetch();
            debug!("next fixture fetch in {:?}", wait);
            time::sleep(wait).await;
            if let Err(e) = self.fetch_and_announce().await {
                warn!("fixture ingestion cycle failed: {e}");
            }
        }
    }

    async fn run_lock_scan(self: Arc<Self>) {
        let mut ticker = time::interval(self.cfg.lock_scan_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = self.lock_closing_matches().await {
                warn!("lock scan failed: {e}");
            }
        }
    }

    async fn run_result_reminders(self: Arc<Self>) {
        let mut ticker = time::interval(self.cfg.reminder_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = self.remind_missing_results().await {
                warn!("result reminder scan failed: {e}");
            }
        }
    }

    fn until_next_fetch(&self) -> StdDuration {
        let offset = FixedOffset::east_opt(self.cfg.utc_offset_hours * 3600)
            .expect("valid utc offset");
        let now_local = self.clock.now().with_timezone(&offset);
        let today_run = now_local
            .date_naive()
            .and_hms_opt(self.cfg.daily_fetch_hour, 0, 0)
            .expect("valid fetch hour");
        let next = if now_local.naive_local() < today_run {
            today_run
        } else {
            today_run + Duration::days(1)
        };
        (next - now_local.naive_local())
            .to_std()
            .unwrap_or(StdDuration::from_secs(60))
    }

    /// Task A. Pulls today's fixtures, persists the new ones, announces the
    /// batch once. The duplicate probe inspects only the FIRST fixture of
    /// the batch: if that one is known the whole batch is treated as
    /// already ingested. Coarse on purpose; partially-overlapping batches
    /// are a known limitation of the design.
    pub async fn fetch_and_announce(&self) -> Result<usize> {
        let fixtures = self.fetch_bounded().await?;

        if fixtures.is_empty() {
            info!("no fixtures today");
            return Ok(0);
        }

        if self
            .match_repo
            .find_by_id(&fixtures[0].match_id)
            .await?
            .is_some()
        {
            info!("today's batch already ingested, skipping");
            return Ok(0);
        }

        let now = self.clock.now();
        for f in &fixtures {
            let m = Match::new(
                f.match_id.clone(),
                f.home_team.clone(),
                f.away_team.clone(),
                f.kickoff_time,
                now,
            );
            self.match_repo.save(&m).await?;
        }

        let text = self.announcement_text(&fixtures);
        if let Err(e) = self.send_bounded(&self.cfg.group_id, &text).await {
            warn!("announcement delivery failed: {e}");
        }

        info!("✅ announced {} new fixtures to group", fixtures.len());
        Ok(fixtures.len())
    }

    fn announcement_text(&self, fixtures: &[FixtureData]) -> String {
        let offset = FixedOffset::east_opt(self.cfg.utc_offset_hours * 3600)
            .expect("valid utc offset");
        let list = fixtures
            .iter()
            .enumerate()
            .map(|(i, f)| {
                format!(
                    "{}. {} 🆚 {} - {}",
                    i + 1,
                    f.home_team,
                    f.away_team,
                    f.kickoff_time.with_timezone(&offset).format("%H:%M")
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "{}\n\n{}\n\n⚽️ Dir prediction dyalek daba!",
            messages::random(messages::MATCH_ANNOUNCEMENT),
            list
        )
    }

    /// Task B. Locks every match entering the closing window, notifying the
    /// group once per match. The repository's `locked = false` scan
    /// condition is the sole de-duplication: a locked match is never
    /// selected again. One match's failure never stops the rest.
    pub async fn lock_closing_matches(&self) -> Result<usize> {
        let now = self.clock.now();
        let candidates = self
            .match_repo
            .find_locking_within(now, self.cfg.lock_window)
            .await?;

        let mut locked = 0;
        for m in &candidates {
            match self.lock_one(m, now).await {
                Ok(true) => locked += 1,
                Ok(false) => debug!("{} was locked by a concurrent writer", m.match_id),
                Err(e) => warn!("lock transition failed for {}: {e}", m.match_id),
            }
        }

        if locked > 0 {
            info!("🔒 locked {locked} matches");
        }
        Ok(locked)
    }

    async fn lock_one(&self, m: &Match, now: DateTime<Utc>) -> Result<bool> {
        let minutes_left = (m.kickoff() - now).num_minutes().max(0);
        let count = self.prediction_repo.count_by_match(&m.match_id).await?;

        let text = format!(
            "{}\n{} 🆚 {} kayebda f {} min!\n📊 {} predictions dakhlin.",
            messages::random(messages::LOCK),
            m.team_a,
            m.team_b,
            minutes_left,
            count
        );
        if let Err(e) = self.send_bounded(&self.cfg.group_id, &text).await {
            warn!("lock notification failed for {}: {e}", m.match_id);
        }

        self.match_repo.try_lock(&m.match_id, now).await
    }

    /// Task C. Nags the admin about every match that kicked off long ago
    /// and still has no result. Deliberately NOT idempotent across ticks:
    /// the same match is re-reminded every cycle until a result lands.
    pub async fn remind_missing_results(&self) -> Result<usize> {
        let now = self.clock.now();
        let stale = self
            .match_repo
            .find_missing_result(now, self.cfg.stale_threshold)
            .await?;

        for m in &stale {
            let text = format!(
                "{}\n{} 🆚 {} sala men {} - sift:\n/result {} 1|X|2",
                messages::random(messages::NO_RESULT),
                m.team_a,
                m.team_b,
                m.kickoff().format("%H:%M"),
                m.match_id
            );
            if let Err(e) = self.send_bounded(&self.cfg.admin_id, &text).await {
                warn!("result reminder failed for {}: {e}", m.match_id);
            }
        }

        Ok(stale.len())
    }

    async fn fetch_bounded(&self) -> Result<Vec<FixtureData>> {
        time::timeout(self.cfg.external_timeout, self.fixture_source.fetch_today())
            .await
            .map_err(|_| AppError::upstream("fixture fetch timed out"))?
    }

    async fn send_bounded(&self, to: &str, text: &str) -> Result<Option<String>> {
        time::timeout(self.cfg.external_timeout, self.notifier.send_message(to, text))
            .await
            .map_err(|_| AppError::upstream("notification send timed out"))?
    }
}
