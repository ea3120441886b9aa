//! Subscriber registry: who receives notifications.

use std::sync::Arc;

use chrono::Utc;
use log::info;
use log::warn;

use crate::database::Database;
use crate::database::model::SubscriberModel;
use crate::database::table::Table;
use crate::service::error::ServiceError;

pub struct SubscriberService {
    db: Arc<Database>,
}

impl SubscriberService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert-or-reactivate. Idempotent.
    ///
    /// Returns `true` when the call changed anything (new subscriber or
    /// reactivation), `false` when the chat was already subscribed.
    /// `subscribed_at` is never touched for an existing row.
    pub async fn subscribe(
        &self,
        chat_id: i64,
        username: Option<&str>,
    ) -> Result<bool, ServiceError> {
        match self.db.subscriber_table.select(&chat_id).await? {
            Some(existing) => {
                if existing.is_active {
                    info!("Chat {chat_id} is already subscribed.");
                    return Ok(false);
                }
                self.db.subscriber_table.set_active(chat_id, true).await?;
                info!("Reactivated subscriber {chat_id}.");
                Ok(true)
            }
            None => {
                let model = SubscriberModel {
                    chat_id,
                    username: username.map(str::to_string),
                    is_active: true,
                    subscribed_at: Utc::now(),
                };
                self.db.subscriber_table.insert(&model).await?;
                info!("Added new subscriber {chat_id}.");
                Ok(true)
            }
        }
    }

    /// Sets the chat inactive. A no-op for unknown chat ids.
    pub async fn unsubscribe(&self, chat_id: i64) -> Result<(), ServiceError> {
        let changed = self.db.subscriber_table.set_active(chat_id, false).await?;
        if changed {
            info!("Unsubscribed chat {chat_id}.");
        }
        Ok(())
    }

    /// Same state effect as [`Self::unsubscribe`], invoked by the
    /// dispatcher on a permanent delivery failure. The reason is only
    /// part of the audit trail.
    pub async fn deactivate(&self, chat_id: i64, reason: &str) -> Result<(), ServiceError> {
        let changed = self.db.subscriber_table.set_active(chat_id, false).await?;
        if changed {
            warn!("Deactivated subscriber {chat_id}: {reason}.");
        }
        Ok(())
    }

    /// Snapshot of active subscribers at call time. Entries may go
    /// inactive between the snapshot and use; delivering to such a
    /// subscriber is tolerated.
    pub async fn list_active(&self) -> Result<Vec<SubscriberModel>, ServiceError> {
        Ok(self.db.subscriber_table.select_all_active().await?)
    }
}
