use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::SqlitePool;

use super::BaseTable;
use super::Table;
use crate::database::error::DatabaseError;
use crate::database::model::PendingReminderModel;

const COLUMNS: &str = "id, fingerprint, fire_at, delivered, created_at";

pub struct ReminderTable {
    base: BaseTable,
}

impl ReminderTable {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            base: BaseTable::new(pool),
        }
    }

    /// Undelivered reminders whose fire time has passed, oldest first.
    pub async fn select_due(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<PendingReminderModel>, DatabaseError> {
        let ret = sqlx::query_as::<_, PendingReminderModel>(&format!(
            "SELECT {COLUMNS} FROM pending_reminders WHERE delivered = 0 AND fire_at <= ? ORDER BY fire_at"
        ))
        .bind(now)
        .fetch_all(&self.base.pool)
        .await?;
        Ok(ret)
    }

    pub async fn select_undelivered(&self) -> Result<Vec<PendingReminderModel>, DatabaseError> {
        let ret = sqlx::query_as::<_, PendingReminderModel>(&format!(
            "SELECT {COLUMNS} FROM pending_reminders WHERE delivered = 0 ORDER BY fire_at"
        ))
        .fetch_all(&self.base.pool)
        .await?;
        Ok(ret)
    }

    pub async fn set_delivered(&self, id: i64) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE pending_reminders SET delivered = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.base.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Table<PendingReminderModel, i64> for ReminderTable {
    async fn create_table(&self) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pending_reminders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                fingerprint TEXT NOT NULL,
                fire_at TIMESTAMP NOT NULL,
                delivered BOOLEAN NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL,
                FOREIGN KEY (fingerprint) REFERENCES announcements(fingerprint)
                    ON DELETE CASCADE
                    ON UPDATE CASCADE
            )
            "#,
        )
        .execute(&self.base.pool)
        .await?;
        Ok(())
    }

    async fn drop_table(&self) -> Result<(), DatabaseError> {
        sqlx::query("DROP TABLE IF EXISTS pending_reminders")
            .execute(&self.base.pool)
            .await?;
        Ok(())
    }

    async fn select_all(&self) -> Result<Vec<PendingReminderModel>, DatabaseError> {
        let ret = sqlx::query_as::<_, PendingReminderModel>(&format!(
            "SELECT {COLUMNS} FROM pending_reminders"
        ))
        .fetch_all(&self.base.pool)
        .await?;
        Ok(ret)
    }

    async fn delete_all(&self) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM pending_reminders")
            .execute(&self.base.pool)
            .await?;
        Ok(())
    }

    async fn insert(&self, model: &PendingReminderModel) -> Result<i64, DatabaseError> {
        let res = sqlx::query(
            "INSERT INTO pending_reminders (fingerprint, fire_at, delivered, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&model.fingerprint)
        .bind(model.fire_at)
        .bind(model.delivered)
        .bind(model.created_at)
        .execute(&self.base.pool)
        .await?;
        Ok(res.last_insert_rowid())
    }

    async fn select(&self, id: &i64) -> Result<Option<PendingReminderModel>, DatabaseError> {
        let model = sqlx::query_as::<_, PendingReminderModel>(&format!(
            "SELECT {COLUMNS} FROM pending_reminders WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.base.pool)
        .await?;
        Ok(model)
    }

    async fn update(&self, model: &PendingReminderModel) -> Result<(), DatabaseError> {
        sqlx::query(
            "UPDATE pending_reminders SET fingerprint = ?, fire_at = ?, delivered = ?, created_at = ? WHERE id = ?",
        )
        .bind(&model.fingerprint)
        .bind(model.fire_at)
        .bind(model.delivered)
        .bind(model.created_at)
        .bind(model.id)
        .execute(&self.base.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, id: &i64) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM pending_reminders WHERE id = ?")
            .bind(id)
            .execute(&self.base.pool)
            .await?;
        Ok(())
    }
}
