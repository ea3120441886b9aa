use async_trait::async_trait;
use sqlx::SqlitePool;

use super::BaseTable;
use super::Table;
use crate::database::error::DatabaseError;
use crate::database::model::SubscriberModel;

const COLUMNS: &str = "chat_id, username, is_active, subscribed_at";

pub struct SubscriberTable {
    base: BaseTable,
}

impl SubscriberTable {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            base: BaseTable::new(pool),
        }
    }

    pub async fn select_all_active(&self) -> Result<Vec<SubscriberModel>, DatabaseError> {
        let ret = sqlx::query_as::<_, SubscriberModel>(&format!(
            "SELECT {COLUMNS} FROM subscribers WHERE is_active = 1"
        ))
        .fetch_all(&self.base.pool)
        .await?;
        Ok(ret)
    }

    /// Flips the active flag. Returns whether a row was touched.
    pub async fn set_active(&self, chat_id: i64, active: bool) -> Result<bool, DatabaseError> {
        let res = sqlx::query("UPDATE subscribers SET is_active = ? WHERE chat_id = ?")
            .bind(active)
            .bind(chat_id)
            .execute(&self.base.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

#[async_trait]
impl Table<SubscriberModel, i64> for SubscriberTable {
    async fn create_table(&self) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS subscribers (
                chat_id INTEGER PRIMARY KEY,
                username TEXT,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                subscribed_at TIMESTAMP NOT NULL
            )
            "#,
        )
        .execute(&self.base.pool)
        .await?;
        Ok(())
    }

    async fn drop_table(&self) -> Result<(), DatabaseError> {
        sqlx::query("DROP TABLE IF EXISTS subscribers")
            .execute(&self.base.pool)
            .await?;
        Ok(())
    }

    async fn select_all(&self) -> Result<Vec<SubscriberModel>, DatabaseError> {
        let ret = sqlx::query_as::<_, SubscriberModel>(&format!(
            "SELECT {COLUMNS} FROM subscribers"
        ))
        .fetch_all(&self.base.pool)
        .await?;
        Ok(ret)
    }

    async fn delete_all(&self) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM subscribers")
            .execute(&self.base.pool)
            .await?;
        Ok(())
    }

    async fn insert(&self, model: &SubscriberModel) -> Result<i64, DatabaseError> {
        sqlx::query(
            "INSERT INTO subscribers (chat_id, username, is_active, subscribed_at) VALUES (?, ?, ?, ?)",
        )
        .bind(model.chat_id)
        .bind(&model.username)
        .bind(model.is_active)
        .bind(model.subscribed_at)
        .execute(&self.base.pool)
        .await?;
        Ok(model.chat_id)
    }

    async fn select(&self, id: &i64) -> Result<Option<SubscriberModel>, DatabaseError> {
        let model = sqlx::query_as::<_, SubscriberModel>(&format!(
            "SELECT {COLUMNS} FROM subscribers WHERE chat_id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.base.pool)
        .await?;
        Ok(model)
    }

    async fn update(&self, model: &SubscriberModel) -> Result<(), DatabaseError> {
        sqlx::query(
            "UPDATE subscribers SET username = ?, is_active = ?, subscribed_at = ? WHERE chat_id = ?",
        )
        .bind(&model.username)
        .bind(model.is_active)
        .bind(model.subscribed_at)
        .bind(model.chat_id)
        .execute(&self.base.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, id: &i64) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM subscribers WHERE chat_id = ?")
            .bind(id)
            .execute(&self.base.pool)
            .await?;
        Ok(())
    }
}
