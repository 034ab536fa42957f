use chrono::{DateTime, Utc};
use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

use super::matches::Outcome;

// One participant's guess for one match within one group.
// Composite key (matchId, userId, groupId); immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    #[serde(rename = "matchId")]
    pub match_id: String,

    #[serde(rename = "userId")]
    pub user_id: String,

    #[serde(rename = "groupId")]
    pub group_id: String,

    #[serde(rename = "choice")]
    pub choice: Outcome,

    #[serde(rename = "createdAt")]
    pub created_at: BsonDateTime,
}

impl Prediction {
    pub fn new(
        match_id: impl Into<String>,
        user_id: impl Into<String>,
        group_id: impl Into<String>,
        choice: Outcome,
        created_at: DateTime<Utc>,
    ) -> Self {
        Prediction {
            id: None,
            match_id: match_id.into(),
            user_id: user_id.into(),
            group_id: group_id.into(),
            choice,
            created_at: BsonDateTime::from_chrono(created_at),
        }
    }
}

// Derived on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreEntry {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub score: i32,
}
