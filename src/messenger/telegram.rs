//! Telegram Bot API transport.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use serde_json::json;
use wreq::Client;

use super::Messenger;
use super::error::SendError;

/// How long the server holds a `getUpdates` long poll open.
const LONG_POLL_SECS: u64 = 30;

/// A `/start` or `/stop` message received from a chat.
#[derive(Debug, Clone)]
pub struct ChatUpdate {
    pub update_id: i64,
    pub chat_id: i64,
    pub username: Option<String>,
    pub text: String,
}

pub struct TelegramMessenger {
    api_url: String,
    client: Client,
}

impl TelegramMessenger {
    pub fn new(token: &str) -> anyhow::Result<Self> {
        Self::with_api_url(&format!("https://api.telegram.org/bot{token}"))
    }

    /// Points the client at an alternative API endpoint. Used by tests.
    pub fn with_api_url(api_url: &str) -> anyhow::Result<Self> {
        // Client timeout must outlast the long poll
        let client = Client::builder()
            .timeout(Duration::from_secs(LONG_POLL_SECS + 30))
            .build()?;
        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Long-polls for new chat messages starting at `offset`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<ChatUpdate>, SendError> {
        let response = self
            .client
            .get(format!("{}/getUpdates", self.api_url))
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", LONG_POLL_SECS.to_string()),
                ("allowed_updates", "[\"message\"]".to_string()),
            ])
            .send()
            .await
            .map_err(|e| SendError::Transient {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SendError::Transient {
                message: format!("getUpdates returned status {status}"),
            });
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| SendError::Transient {
                message: e.to_string(),
            })?;

        let results = body
            .get("result")
            .and_then(Value::as_array)
            .ok_or_else(|| SendError::Transient {
                message: "getUpdates response has no `result` array".to_string(),
            })?;

        let updates = results.iter().filter_map(parse_update).collect();
        Ok(updates)
    }
}

fn parse_update(update: &Value) -> Option<ChatUpdate> {
    let update_id = update.get("update_id")?.as_i64()?;
    let message = update.get("message")?;
    let chat_id = message.get("chat")?.get("id")?.as_i64()?;
    let username = message
        .get("from")
        .and_then(|f| f.get("username"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let text = message.get("text")?.as_str()?.to_string();

    Some(ChatUpdate {
        update_id,
        chat_id,
        username,
        text,
    })
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send(&self, chat_id: i64, text: &str) -> Result<(), SendError> {
        let payload = json!({
            "chat_id": chat_id,
            "text": text,
        });

        let response = self
            .client
            .post(format!("{}/sendMessage", self.api_url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| SendError::Transient {
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            debug!("Delivered message to chat {chat_id}.");
            return Ok(());
        }

        // 403 means the recipient blocked the bot; everything else is
        // worth another attempt (429 and 5xx in practice).
        if status.as_u16() == 403 {
            return Err(SendError::Unreachable { chat_id });
        }
        Err(SendError::Transient {
            message: format!("sendMessage to {chat_id} returned status {status}"),
        })
    }
}
