use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;
use sqlx::FromRow;

/// A page announcement that has been seen and recorded.
///
/// Immutable after insert except for `reminders_sent`.
#[derive(FromRow, Debug, Clone, Serialize)]
pub struct AnnouncementModel {
    pub id: i64,
    pub fingerprint: String, // 64 hex chars, unique
    pub title: String,
    pub body: String,
    pub event_at: Option<DateTime<Utc>>,
    pub first_seen_at: DateTime<Utc>,
    pub reminders_sent: bool,
}

impl Default for AnnouncementModel {
    fn default() -> Self {
        Self {
            id: 0,
            fingerprint: String::new(),
            title: String::new(),
            body: String::new(),
            event_at: None,
            first_seen_at: DateTime::<Utc>::MIN_UTC,
            reminders_sent: false,
        }
    }
}

#[derive(FromRow, Debug, Clone, Serialize)]
pub struct SubscriberModel {
    pub chat_id: i64,
    pub username: Option<String>,
    pub is_active: bool,
    pub subscribed_at: DateTime<Utc>,
}

impl Default for SubscriberModel {
    fn default() -> Self {
        Self {
            chat_id: 0,
            username: None,
            is_active: true,
            subscribed_at: DateTime::<Utc>::MIN_UTC,
        }
    }
}

/// A deferred delivery waiting for its fire time.
///
/// Rows are kept after firing (`delivered = true`) for audit and
/// idempotence.
#[derive(FromRow, Debug, Clone, Serialize)]
pub struct PendingReminderModel {
    pub id: i64,
    pub fingerprint: String, // references announcements.fingerprint
    pub fire_at: DateTime<Utc>,
    pub delivered: bool,
    pub created_at: DateTime<Utc>,
}

impl Default for PendingReminderModel {
    fn default() -> Self {
        Self {
            id: 0,
            fingerprint: String::new(),
            fire_at: DateTime::<Utc>::MIN_UTC,
            delivered: false,
            created_at: DateTime::<Utc>::MIN_UTC,
        }
    }
}
