use std::sync::Arc;

use mongodb::Database;

use crate::config::AppConfig;
use crate::database::match_repo::MatchRepository;
use crate::services::clock::Clock;
use crate::services::predictions::PredictionService;
use crate::services::whatsapp::Notifier;

#[derive(Clone)]
pub struct AppState {
    /// None only in tests, where no Mongo deployment backs the handlers.
    pub db: Option<Database>,
    pub config: Arc<AppConfig>,
    pub predictions: Arc<PredictionService>,
    pub match_repo: Arc<dyn MatchRepository>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        db: Database,
        config: Arc<AppConfig>,
        predictions: Arc<PredictionService>,
        match_repo: Arc<dyn MatchRepository>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        AppState {
            db: Some(db),
            config,
            predictions,
            match_repo,
            notifier,
            clock,
        }
    }
}
