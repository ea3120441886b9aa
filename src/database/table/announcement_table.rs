use async_trait::async_trait;
use sqlx::SqlitePool;

use super::BaseTable;
use super::Table;
use crate::database::error::DatabaseError;
use crate::database::model::AnnouncementModel;

const COLUMNS: &str = "id, fingerprint, title, body, event_at, first_seen_at, reminders_sent";

pub struct AnnouncementTable {
    base: BaseTable,
}

impl AnnouncementTable {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            base: BaseTable::new(pool),
        }
    }

    pub async fn exists_by_fingerprint(&self, fingerprint: &str) -> Result<bool, DatabaseError> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM announcements WHERE fingerprint = ?")
                .bind(fingerprint)
                .fetch_optional(&self.base.pool)
                .await?;
        Ok(row.is_some())
    }

    pub async fn select_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<AnnouncementModel>, DatabaseError> {
        let model = sqlx::query_as::<_, AnnouncementModel>(&format!(
            "SELECT {COLUMNS} FROM announcements WHERE fingerprint = ?"
        ))
        .bind(fingerprint)
        .fetch_optional(&self.base.pool)
        .await?;
        Ok(model)
    }

    pub async fn set_reminders_sent(&self, fingerprint: &str) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE announcements SET reminders_sent = 1 WHERE fingerprint = ?")
            .bind(fingerprint)
            .execute(&self.base.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Table<AnnouncementModel, i64> for AnnouncementTable {
    async fn create_table(&self) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS announcements (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                fingerprint TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                event_at TIMESTAMP,
                first_seen_at TIMESTAMP NOT NULL,
                reminders_sent BOOLEAN NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.base.pool)
        .await?;
        Ok(())
    }

    async fn drop_table(&self) -> Result<(), DatabaseError> {
        sqlx::query("DROP TABLE IF EXISTS announcements")
            .execute(&self.base.pool)
            .await?;
        Ok(())
    }

    async fn select_all(&self) -> Result<Vec<AnnouncementModel>, DatabaseError> {
        let ret = sqlx::query_as::<_, AnnouncementModel>(&format!(
            "SELECT {COLUMNS} FROM announcements"
        ))
        .fetch_all(&self.base.pool)
        .await?;
        Ok(ret)
    }

    async fn delete_all(&self) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM announcements")
            .execute(&self.base.pool)
            .await?;
        Ok(())
    }

    async fn insert(&self, model: &AnnouncementModel) -> Result<i64, DatabaseError> {
        let res = sqlx::query(
            r#"
            INSERT INTO announcements (fingerprint, title, body, event_at, first_seen_at, reminders_sent)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&model.fingerprint)
        .bind(&model.title)
        .bind(&model.body)
        .bind(model.event_at)
        .bind(model.first_seen_at)
        .bind(model.reminders_sent)
        .execute(&self.base.pool)
        .await?;
        Ok(res.last_insert_rowid())
    }

    async fn select(&self, id: &i64) -> Result<Option<AnnouncementModel>, DatabaseError> {
        let model = sqlx::query_as::<_, AnnouncementModel>(&format!(
            "SELECT {COLUMNS} FROM announcements WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.base.pool)
        .await?;
        Ok(model)
    }

    async fn update(&self, model: &AnnouncementModel) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            UPDATE announcements
            SET fingerprint = ?, title = ?, body = ?, event_at = ?, first_seen_at = ?, reminders_sent = ?
            WHERE id = ?
            "#,
        )
        .bind(&model.fingerprint)
        .bind(&model.title)
        .bind(&model.body)
        .bind(model.event_at)
        .bind(model.first_seen_at)
        .bind(model.reminders_sent)
        .bind(model.id)
        .execute(&self.base.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, id: &i64) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM announcements WHERE id = ?")
            .bind(id)
            .execute(&self.base.pool)
            .await?;
        Ok(())
    }
}
