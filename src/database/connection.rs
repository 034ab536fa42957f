use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};

use crate::errors::Result;
use crate::models::matches::Match;
use crate::models::prediction::Prediction;

pub async fn get_db_client(database_url: &str) -> Database {
    let client = Client::with_uri_str(database_url)
        .await
        .expect("Failed to connect to MongoDB");

    let db_name = "takhmin";
    let db = client.database(db_name);

    // Verify database exists by listing collections
    match db.list_collection_names().await {
        Ok(collections) => {
            tracing::info!("✅ Connected to database: {}", db_name);
            tracing::info!("📂 Collections found: {:?}", collections);

            if !collections.contains(&"matches".to_string()) {
                tracing::warn!("⚠️ 'matches' collection not found, it will be created on first save");
            }
        }
        Err(e) => {
            tracing::error!("❌ Database '{}' may not exist or is inaccessible: {}", db_name, e);
        }
    }

    db
}

/// Unique index on the natural match key, plus the compound prediction key.
/// The prediction index is defense-in-depth: duplicates are rejected at the
/// use-case layer before they ever reach storage.
pub async fn ensure_indexes(db: &Database) -> Result<()> {
    let matches: Collection<Match> = db.collection("matches");
    matches
        .create_index(
            IndexModel::builder()
                .keys(doc! { "matchId": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        )
        .await?;

    let predictions: Collection<Prediction> = db.collection("predictions");
    predictions
        .create_index(
            IndexModel::builder()
                .keys(doc! { "matchId": 1, "userId": 1, "groupId": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        )
        .await?;

    Ok(())
}
