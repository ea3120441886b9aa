use std::str::FromStr;

use log::debug;
use log::info;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;

use crate::database::table::AnnouncementTable;
use crate::database::table::ReminderTable;
use crate::database::table::SubscriberTable;
use crate::database::table::Table;

pub mod error;
pub mod model;
pub mod table;

pub struct Database {
    pub pool: SqlitePool,
    pub announcement_table: AnnouncementTable,
    pub subscriber_table: SubscriberTable,
    pub reminder_table: ReminderTable,
}

impl Database {
    pub async fn new(db_url: &str, db_path: &str) -> anyhow::Result<Self> {
        let path = std::path::Path::new(db_path);
        if !path.exists() {
            debug!("Database path {db_path} does not exist. Creating...");
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, "")?;
            info!("Created {db_path}");
        }

        debug!("Connecting to db...");
        let opts = SqliteConnectOptions::from_str(db_url)?.foreign_keys(true);
        let pool = SqlitePool::connect_with(opts).await?;
        info!("Connected to db.");

        let announcement_table = AnnouncementTable::new(pool.clone());
        let subscriber_table = SubscriberTable::new(pool.clone());
        let reminder_table = ReminderTable::new(pool.clone());

        Ok(Self {
            pool,
            announcement_table,
            subscriber_table,
            reminder_table,
        })
    }

    pub async fn create_all_tables(&self) -> anyhow::Result<()> {
        self.announcement_table.create_table().await?;
        self.subscriber_table.create_table().await?;
        self.reminder_table.create_table().await?;
        Ok(())
    }

    pub async fn drop_all_tables(&self) -> anyhow::Result<()> {
        self.reminder_table.drop_table().await?;
        self.announcement_table.drop_table().await?;
        self.subscriber_table.drop_table().await?;
        Ok(())
    }

    pub async fn delete_all_tables(&self) -> anyhow::Result<()> {
        self.reminder_table.delete_all().await?;
        self.announcement_table.delete_all().await?;
        self.subscriber_table.delete_all().await?;
        Ok(())
    }
}
