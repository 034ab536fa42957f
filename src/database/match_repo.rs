use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use futures_util::TryStreamExt;
use mongodb::bson::{doc, DateTime as BsonDateTime};
use mongodb::{Collection, Database};

use crate::errors::Result;
use crate::models::matches::Match;

/// Persistence contract for matches. The scheduling engine and the request
/// path both go through this trait; orchestration code never touches the
/// underlying collection handle.
#[async_trait]
pub trait MatchRepository: Send + Sync {
    async fn find_by_id(&self, match_id: &str) -> Result<Option<Match>>;

    async fn find_all_finished(&self) -> Result<Vec<Match>>;

    /// Matches with kickoff at or after `now`, ascending by kickoff.
    async fn find_upcoming(&self, now: DateTime<Utc>) -> Result<Vec<Match>>;

    /// Matches entering the closing window: kickoff in [now, now + window)
    /// and not yet locked. Ascending by kickoff. The `locked = false`
    /// condition is the lock task's sole de-duplication mechanism.
    async fn find_locking_within(&self, now: DateTime<Utc>, window: Duration) -> Result<Vec<Match>>;

    /// Matches whose kickoff passed more than `threshold` ago, carry no
    /// result, and have progressed past SCHEDULED. Ascending by kickoff.
    async fn find_missing_result(
        &self,
        now: DateTime<Utc>,
        threshold: Duration,
    ) -> Result<Vec<Match>>;

    /// Upsert by the natural `matchId` key.
    async fn save(&self, m: &Match) -> Result<()>;

    /// Atomic conditional lock: flips `locked`/`lockedAt` only when the
    /// match is still unlocked, then advances status SCHEDULED -> LOCKED.
    /// Returns whether this caller won the flip.
    async fn try_lock(&self, match_id: &str, locked_at: DateTime<Utc>) -> Result<bool>;
}

pub struct MongoMatchRepository {
    collection: Collection<Match>,
}

impl MongoMatchRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("matches"),
        }
    }
}

#[async_trait]
impl MatchRepository for MongoMatchRepository {
    async fn find_by_id(&self, match_id: &str) -> Result<Option<Match>> {
        Ok(self
            .collection
            .find_one(doc! { "matchId": match_id })
            .await?)
    }

    async fn find_all_finished(&self) -> Result<Vec<Match>> {
        let cursor = self.collection.find(doc! { "status": "FINISHED" }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_upcoming(&self, now: DateTime<Utc>) -> Result<Vec<Match>> {
        let filter = doc! { "kickoffTime": { "$gte": BsonDateTime::from_chrono(now) } };
        let cursor = self
            .collection
            .find(filter)
            .sort(doc! { "kickoffTime": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_locking_within(&self, now: DateTime<Utc>, window: Duration) -> Result<Vec<Match>> {
        let filter = doc! {
            "locked": false,
            "kickoffTime": {
                "$gte": BsonDateTime::from_chrono(now),
                "$lt": BsonDateTime::from_chrono(now + window),
            },
        };
        let cursor = self
            .collection
            .find(filter)
            .sort(doc! { "kickoffTime": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_missing_result(
        &self,
        now: DateTime<Utc>,
        threshold: Duration,
    ) -> Result<Vec<Match>> {
        // "result": null matches both absent and explicit-null fields.
        let filter = doc! {
            "kickoffTime": { "$lt": BsonDateTime::from_chrono(now - threshold) },
            "result": null,
            "status": { "$ne": "SCHEDULED" },
        };
        let cursor = self
            .collection
            .find(filter)
            .sort(doc! { "kickoffTime": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn save(&self, m: &Match) -> Result<()> {
        self.collection
            .replace_one(doc! { "matchId": &m.match_id }, m)
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn try_lock(&self, match_id: &str, locked_at: DateTime<Utc>) -> Result<bool> {
        let updated = self
            .collection
            .update_one(
                doc! { "matchId": match_id, "locked": false },
                doc! { "$set": {
                    "locked": true,
                    "lockedAt": BsonDateTime::from_chrono(locked_at),
                }},
            )
            .await?;

        if updated.modified_count == 0 {
            return Ok(false);
        }

        // Separate conditional write so an early-finished match is never
        // regressed off FINISHED.
        self.collection
            .update_one(
                doc! { "matchId": match_id, "status": "SCHEDULED" },
                doc! { "$set": { "status": "LOCKED" } },
            )
            .await?;

        Ok(true)
    }
}
