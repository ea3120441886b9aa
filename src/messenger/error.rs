#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// Network hiccup or server busy. Worth retrying.
    #[error("Transient delivery failure: {message}")]
    Transient { message: String },

    /// The recipient has blocked delivery. Never retried.
    #[error("Recipient {chat_id} is permanently unreachable")]
    Unreachable { chat_id: i64 },
}
