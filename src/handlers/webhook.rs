use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use serde::Deserialize;

use crate::commands::{self, Command};
use crate::database::match_repo::MatchRepository;
use crate::errors::AppError;
use crate::models::matches::{CreateMatch, Match};
use crate::services::clock::Clock;
use crate::services::messages;
use crate::state::AppState;

// WhatsApp webhook verification handshake
#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

pub async fn verify_webhook(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> Response {
    let subscribed = params.mode.as_deref() == Some("subscribe");
    let token_matches = params.verify_token.as_deref() == Some(state.config.verify_token.as_str());

    if subscribed && token_matches {
        (StatusCode::OK, params.challenge.unwrap_or_default()).into_response()
    } else {
        StatusCode::FORBIDDEN.into_response()
    }
}

// Inbound WhatsApp payload, trimmed to the fields we read
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub object: String,
    #[serde(default)]
    pub entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub changes: Vec<Change>,
}

#[derive(Debug, Deserialize)]
pub struct Change {
    pub value: ChangeValue,
}

#[derive(Debug, Deserialize)]
pub struct ChangeValue {
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub messages: Vec<InboundMessage>,
}

#[derive(Debug, Deserialize)]
pub struct Metadata {
    pub display_phone_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InboundMessage {
    pub from: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub text: Option<TextBody>,
}

#[derive(Debug, Deserialize)]
pub struct TextBody {
    pub body: String,
}

pub async fn receive_webhook(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> StatusCode {
    if payload.object != "whatsapp_business_account" {
        return StatusCode::NOT_FOUND;
    }

    let Some(value) = payload
        .entry
        .into_iter()
        .next()
        .and_then(|e| e.changes.into_iter().next())
        .map(|c| c.value)
    else {
        return StatusCode::OK;
    };

    let group_id = value
        .metadata
        .as_ref()
        .and_then(|m| m.display_phone_number.clone())
        .unwrap_or_else(|| "default_group".to_string());

    let Some(message) = value.messages.into_iter().next() else {
        return StatusCode::OK;
    };
    if message.kind != "text" {
        return StatusCode::OK;
    }
    let Some(text) = message.text else {
        return StatusCode::OK;
    };

    tracing::debug!("📨 message from {}: {}", message.from, text.body);

    let reply = dispatch(&state, &message.from, &group_id, &text.body).await;
    if let Err(e) = state.notifier.send_message(&message.from, &reply).await {
        tracing::warn!("reply delivery to {} failed: {e}", message.from);
    }

    StatusCode::OK
}

/// Routes one parsed command through the use-case layer and renders the
/// chat reply. Rejections come back as user-visible Darija, never retried.
pub async fn dispatch(state: &AppState, from: &str, group_id: &str, text: &str) -> String {
    match commands::parse(text) {
        Command::Start => messages::WELCOME.to_string(),
        Command::Menu => messages::MENU.to_string(),
        Command::Matches => match state.predictions.upcoming_matches().await {
            Ok(matches) if matches.is_empty() => messages::no_matches_today().to_string(),
            Ok(matches) => render_match_list(&matches),
            Err(e) => messages::error_reply(&e),
        },
        Command::CreateMatch {
            id,
            team_a,
            team_b,
            time,
        } => {
            let Some(kickoff) = parse_kickoff(&time, state.clock.now()) else {
                return messages::error_reply(&AppError::invalid_data(format!(
                    "wa9t machi mafhoum: {}",
                    time
                )));
            };
            match state
                .predictions
                .create_match(CreateMatch {
                    match_id: id,
                    team_a: team_a.clone(),
                    team_b: team_b.clone(),
                    kickoff_time: kickoff,
                })
                .await
            {
                Ok(_) => messages::match_created(&team_a, &team_b),
                Err(e) => messages::error_reply(&e),
            }
        }
        Command::Predict { match_id, choice } => {
            let Some(choice) = choice else {
                return messages::invalid_choice().to_string();
            };
            match state
                .predictions
                .submit_prediction(from, &match_id, group_id, choice)
                .await
            {
                Ok(_) => messages::prediction_saved().to_string(),
                Err(e) => messages::error_reply(&e),
            }
        }
        Command::Result { match_id, result } => {
            let Some(result) = result else {
                return messages::error_reply(&AppError::invalid_data(
                    "result khass ykoun 1, X wla 2",
                ));
            };
            match state.predictions.submit_result(&match_id, result).await {
                Ok(_) => messages::result_saved(&match_id, result),
                Err(e) => messages::error_reply(&e),
            }
        }
        Command::Score => match state.predictions.leaderboard(group_id).await {
            Ok(entries) if entries.is_empty() => {
                messages::leaderboard(messages::empty_leaderboard())
            }
            Ok(entries) => {
                let ranking = entries
                    .iter()
                    .enumerate()
                    .map(|(i, e)| format!("{}. {}: {} pts", i + 1, short_user(&e.user_id), e.score))
                    .collect::<Vec<_>>()
                    .join("\n");
                messages::leaderboard(&ranking)
            }
            Err(e) => messages::error_reply(&e),
        },
        Command::Predictions { match_id } => {
            match state
                .predictions
                .predictions_for(group_id, match_id.as_deref())
                .await
            {
                Ok(predictions) if predictions.is_empty() => {
                    "Ma kayna 7ta prediction 😴".to_string()
                }
                Ok(predictions) => predictions
                    .iter()
                    .map(|p| format!("{} → {} ({})", short_user(&p.user_id), p.choice, p.match_id))
                    .collect::<Vec<_>>()
                    .join("\n"),
                Err(e) => messages::error_reply(&e),
            }
        }
        Command::Poll { match_id } => {
            let Some(match_id) = match_id else {
                return "Usage: /poll <matchId>".to_string();
            };
            match send_poll(state, group_id, &match_id).await {
                Ok(()) => format!("📊 Poll dyal {} tsifet l group!", match_id),
                Err(e) => messages::error_reply(&e),
            }
        }
        Command::Unknown => messages::invalid_command().to_string(),
    }
}

/// Sends the poll message to the group and records the provider handle on
/// the match for later cleanup.
async fn send_poll(state: &AppState, group_id: &str, match_id: &str) -> crate::errors::Result<()> {
    let mut m: Match = state
        .match_repo
        .find_by_id(match_id)
        .await?
        .ok_or_else(|| AppError::not_found(match_id))?;

    let text = format!(
        "📊 {} 🆚 {}\n1️⃣ {}\n❌ Draw\n2️⃣ {}\n\nJaweb b: /predict {} <1|2|3>",
        m.team_a, m.team_b, m.team_a, m.team_b, m.match_id
    );
    let message_id = state.notifier.send_message(group_id, &text).await?;

    if let Some(id) = message_id {
        m.poll_message_id = Some(id);
        state.match_repo.save(&m).await?;
    }
    Ok(())
}

fn render_match_list(matches: &[Match]) -> String {
    let list = matches
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let lock = if m.locked { " 🔒" } else { "" };
            format!(
                "{}. {} 🆚 {} - {} ({}){}",
                i + 1,
                m.team_a,
                m.team_b,
                m.kickoff().format("%H:%M"),
                m.match_id,
                lock
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("⚽ Matchat jayin:\n{}", list)
}

fn short_user(user_id: &str) -> &str {
    let len = user_id.len();
    if len <= 4 {
        user_id
    } else {
        &user_id[len - 4..]
    }
}

/// Accepts an RFC 3339 instant or a bare HH:MM, which lands on today's
/// date in UTC.
fn parse_kickoff(input: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(input) {
        return Some(instant.with_timezone(&Utc));
    }
    let time = NaiveTime::parse_from_str(input, "%H:%M").ok()?;
    Utc.from_local_datetime(&now.date_naive().and_time(time))
        .single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::services::predictions::PredictionService;
    use crate::testutil::{
        FixedClock, InMemoryMatchRepository, InMemoryPredictionRepository, RecordingNotifier,
    };
    use chrono::Duration;
    use std::sync::Arc;

    fn base_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 10, 18, 0, 0).unwrap()
    }

    fn state() -> (AppState, Arc<RecordingNotifier>, Arc<FixedClock>) {
        let match_repo = Arc::new(InMemoryMatchRepository::new());
        let prediction_repo = Arc::new(InMemoryPredictionRepository::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let clock = Arc::new(FixedClock::new(base_now()));
        let predictions = Arc::new(PredictionService::new(
            match_repo.clone(),
            prediction_repo,
            clock.clone(),
        ));
        let state = AppState {
            db: None,
            config: Arc::new(AppConfig::for_tests()),
            predictions,
            match_repo,
            notifier: notifier.clone(),
            clock: clock.clone(),
        };
        (state, notifier, clock)
    }

    #[tokio::test]
    async fn verification_handshake_echoes_the_challenge() {
        let (state, _, _) = state();
        let ok = verify_webhook(
            State(state.clone()),
            Query(VerifyParams {
                mode: Some("subscribe".to_string()),
                verify_token: Some("takhmin_secret".to_string()),
                challenge: Some("challenge-42".to_string()),
            }),
        )
        .await;
        assert_eq!(ok.status(), StatusCode::OK);

        let bad = verify_webhook(
            State(state),
            Query(VerifyParams {
                mode: Some("subscribe".to_string()),
                verify_token: Some("wrong".to_string()),
                challenge: Some("challenge-42".to_string()),
            }),
        )
        .await;
        assert_eq!(bad.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn full_predict_flow_over_dispatch() {
        let (state, _, _) = state();
        let created = dispatch(&state, "u1", "g1", "/match M1 Raja Wydad 20:00").await;
        assert!(created.contains("Raja"));

        let saved = dispatch(&state, "u1", "g1", "/predict M1 1").await;
        assert_eq!(saved, messages::prediction_saved());

        let duplicate = dispatch(&state, "u1", "g1", "/predict M1 3").await;
        assert!(duplicate.contains("Deja"));
    }

    #[tokio::test]
    async fn score_renders_the_ranking() {
        let (state, _, _) = state();
        dispatch(&state, "admin", "g1", "/match M2 Raja Wydad 20:00").await;
        dispatch(&state, "2126611112222", "g1", "/predict M2 1").await;
        dispatch(&state, "2126633334444", "g1", "/predict M2 3").await;
        dispatch(&state, "admin", "g1", "/result M2 1").await;

        let board = dispatch(&state, "admin", "g1", "/score").await;
        assert!(board.contains("1. 2222: 1 pts"));
        assert!(board.contains("2. 4444: -1 pts"));
    }

    #[tokio::test]
    async fn poll_records_the_message_handle() {
        let (state, _notifier, _) = state();
        dispatch(&state, "admin", "g1", "/match M1 Raja Wydad 20:00").await;
        let reply = dispatch(&state, "admin", "g1", "/poll M1").await;
        assert!(reply.contains("Poll"));

        let m = state.match_repo.find_by_id("M1").await.unwrap().unwrap();
        assert!(m.poll_message_id.is_some());
    }

    #[tokio::test]
    async fn unknown_text_gets_the_fallback_reply() {
        let (state, _, _) = state();
        let reply = dispatch(&state, "u1", "g1", "chno hada").await;
        assert_eq!(reply, messages::invalid_command());
    }

    #[tokio::test]
    async fn predict_after_lock_replies_with_lock_message() {
        let (state, _, clock) = state();
        dispatch(&state, "admin", "g1", "/match M1 Raja Wydad 20:00").await;
        clock.set(base_now() + Duration::hours(6));
        let reply = dispatch(&state, "u1", "g1", "/predict M1 1").await;
        assert!(reply.contains("M1"));
    }
}
