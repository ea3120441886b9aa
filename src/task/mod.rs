pub mod command_listener;
pub mod page_watcher;
pub mod reminder_scheduler;

pub use command_listener::CommandListener;
pub use page_watcher::PageWatcher;
pub use reminder_scheduler::ReminderScheduler;
