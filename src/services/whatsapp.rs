use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::errors::{AppError, Result};

/// Outbound message delivery. Best-effort, at-most-once: callers log
/// failures and move on, never treat them as fatal. The returned provider
/// message id feeds the poll path's `pollMessageId` tracking.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_message(&self, to: &str, text: &str) -> Result<Option<String>>;
}

pub struct WhatsAppNotifier {
    access_token: String,
    phone_number_id: String,
    client: Client,
}

impl WhatsAppNotifier {
    pub fn new(access_token: String, phone_number_id: String) -> Self {
        Self {
            access_token,
            phone_number_id,
            client: Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    messages: Vec<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

#[async_trait]
impl Notifier for WhatsAppNotifier {
    async fn send_message(&self, to: &str, text: &str) -> Result<Option<String>> {
        let url = format!(
            "https://graph.facebook.com/v17.0/{}/messages",
            self.phone_number_id
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&json!({
                "messaging_product": "whatsapp",
                "to": to,
                "type": "text",
                "text": { "body": text },
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::upstream(format!(
                "WhatsApp API responded with status: {}",
                response.status()
            )));
        }

        let body: SendResponse = response.json().await?;
        Ok(body.messages.into_iter().next().map(|m| m.id))
    }
}
