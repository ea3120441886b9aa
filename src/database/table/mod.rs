pub mod announcement_table;
pub mod reminder_table;
pub mod subscriber_table;

use async_trait::async_trait;
use sqlx::SqlitePool;

pub use announcement_table::AnnouncementTable;
pub use reminder_table::ReminderTable;
pub use subscriber_table::SubscriberTable;

use crate::database::error::DatabaseError;

pub struct BaseTable {
    pub pool: SqlitePool,
}

impl BaseTable {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
pub trait Table<T, ID> {
    async fn create_table(&self) -> Result<(), DatabaseError>;
    async fn drop_table(&self) -> Result<(), DatabaseError>;
    async fn select_all(&self) -> Result<Vec<T>, DatabaseError>;
    async fn delete_all(&self) -> Result<(), DatabaseError>;
    async fn insert(&self, model: &T) -> Result<ID, DatabaseError>;
    async fn select(&self, id: &ID) -> Result<Option<T>, DatabaseError>;
    async fn update(&self, model: &T) -> Result<(), DatabaseError>;
    async fn delete(&self, id: &ID) -> Result<(), DatabaseError>;
}
