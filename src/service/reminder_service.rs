//! Persistence operations for deferred reminder deliveries.

use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;

use crate::database::Database;
use crate::database::model::PendingReminderModel;
use crate::database::table::Table;
use crate::service::error::ServiceError;

pub struct ReminderService {
    db: Arc<Database>,
}

impl ReminderService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn schedule(
        &self,
        fingerprint: &str,
        fire_at: DateTime<Utc>,
    ) -> Result<i64, ServiceError> {
        let model = PendingReminderModel {
            fingerprint: fingerprint.to_string(),
            fire_at,
            delivered: false,
            created_at: Utc::now(),
            ..Default::default()
        };
        Ok(self.db.reminder_table.insert(&model).await?)
    }

    /// Undelivered reminders whose fire time has passed, oldest first.
    ///
    /// Reminders are held in the store, not in memory, so a restarted
    /// process picks up in-flight reminders on its first call here.
    pub async fn due(&self, now: DateTime<Utc>) -> Result<Vec<PendingReminderModel>, ServiceError> {
        Ok(self.db.reminder_table.select_due(now).await?)
    }

    /// All reminders still waiting for their fire time.
    pub async fn undelivered(&self) -> Result<Vec<PendingReminderModel>, ServiceError> {
        Ok(self.db.reminder_table.select_undelivered().await?)
    }

    pub async fn mark_delivered(&self, id: i64) -> Result<(), ServiceError> {
        Ok(self.db.reminder_table.set_delivered(id).await?)
    }
}
