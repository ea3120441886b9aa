use async_trait::async_trait;

pub mod error;
pub mod telegram;

pub use error::SendError;
pub use telegram::TelegramMessenger;

/// Delivers one text message to one recipient.
///
/// The dispatcher's retry, backoff and deactivation policy is built
/// entirely around the three-way outcome: success, [`SendError::Transient`]
/// or [`SendError::Unreachable`].
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, chat_id: i64, text: &str) -> Result<(), SendError>;
}
