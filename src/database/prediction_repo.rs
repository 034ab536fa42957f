use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::doc;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::{Collection, Database};

use crate::errors::{AppError, Result};
use crate::models::prediction::Prediction;

#[async_trait]
pub trait PredictionRepository: Send + Sync {
    async fn find_by_user_and_match(
        &self,
        user_id: &str,
        match_id: &str,
        group_id: &str,
    ) -> Result<Option<Prediction>>;

    async fn find_by_group(&self, group_id: &str) -> Result<Vec<Prediction>>;

    /// How many predictions exist for a match across all groups. Feeds the
    /// "locking soon" notification.
    async fn count_by_match(&self, match_id: &str) -> Result<u64>;

    /// Insert-only. A duplicate composite key surfaces as PredictionExists;
    /// the use-case layer is expected to have rejected it already.
    async fn save(&self, prediction: &Prediction) -> Result<()>;
}

pub struct MongoPredictionRepository {
    collection: Collection<Prediction>,
}

impl MongoPredictionRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("predictions"),
        }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_err)) => write_err.code == 11000,
        _ => false,
    }
}

#[async_trait]
impl PredictionRepository for MongoPredictionRepository {
    async fn find_by_user_and_match(
        &self,
        user_id: &str,
        match_id: &str,
        group_id: &str,
    ) -> Result<Option<Prediction>> {
        let filter = doc! {
            "userId": user_id,
            "matchId": match_id,
            "groupId": group_id,
        };
        Ok(self.collection.find_one(filter).await?)
    }

    async fn find_by_group(&self, group_id: &str) -> Result<Vec<Prediction>> {
        let cursor = self.collection.find(doc! { "groupId": group_id }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count_by_match(&self, match_id: &str) -> Result<u64> {
        Ok(self
            .collection
            .count_documents(doc! { "matchId": match_id })
            .await?)
    }

    async fn save(&self, prediction: &Prediction) -> Result<()> {
        match self.collection.insert_one(prediction).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(AppError::PredictionExists),
            Err(e) => Err(e.into()),
        }
    }
}
