use std::sync::Arc;

use crate::database::Database;

pub mod announcement_service;
pub mod error;
pub mod reminder_service;
pub mod subscriber_service;

pub use announcement_service::AnnouncementService;
pub use reminder_service::ReminderService;
pub use subscriber_service::SubscriberService;

pub struct Services {
    pub announcements: Arc<AnnouncementService>,
    pub subscribers: Arc<SubscriberService>,
    pub reminders: Arc<ReminderService>,
}

impl Services {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            announcements: Arc::new(AnnouncementService::new(db.clone())),
            subscribers: Arc::new(SubscriberService::new(db.clone())),
            reminders: Arc::new(ReminderService::new(db)),
        }
    }
}
