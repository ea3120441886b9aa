//! Persistence-backed record of previously seen announcements.

use std::sync::Arc;

use sqlx::error::ErrorKind;

use crate::database::Database;
use crate::database::error::DatabaseError;
use crate::database::model::AnnouncementModel;
use crate::database::table::Table;
use crate::service::error::ServiceError;

pub struct AnnouncementService {
    db: Arc<Database>,
}

impl AnnouncementService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn exists(&self, fingerprint: &str) -> Result<bool, ServiceError> {
        Ok(self
            .db
            .announcement_table
            .exists_by_fingerprint(fingerprint)
            .await?)
    }

    /// Records a new announcement.
    ///
    /// Fingerprint uniqueness is enforced by the storage layer: a second
    /// insert of the same fingerprint yields [`ServiceError::Conflict`]
    /// even when two poll cycles race past the `exists` check. Callers
    /// treat Conflict as "already handled by another writer".
    pub async fn insert(&self, announcement: &AnnouncementModel) -> Result<i64, ServiceError> {
        match self.db.announcement_table.insert(announcement).await {
            Ok(id) => Ok(id),
            Err(err) => {
                if let DatabaseError::BackendError(sqlx_err) = &err
                    && let Some(db_err) = sqlx_err.as_database_error()
                    && matches!(db_err.kind(), ErrorKind::UniqueViolation)
                {
                    Err(ServiceError::Conflict {
                        fingerprint: announcement.fingerprint.clone(),
                    })
                } else {
                    Err(err.into())
                }
            }
        }
    }

    pub async fn get(&self, fingerprint: &str) -> Result<AnnouncementModel, ServiceError> {
        self.db
            .announcement_table
            .select_by_fingerprint(fingerprint)
            .await?
            .ok_or_else(|| ServiceError::AnnouncementNotFound {
                fingerprint: fingerprint.to_string(),
            })
    }

    pub async fn mark_reminders_sent(&self, fingerprint: &str) -> Result<(), ServiceError> {
        Ok(self
            .db
            .announcement_table
            .set_reminders_sent(fingerprint)
            .await?)
    }
}
