//! Background task firing deferred reminders at their wall-clock time.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use chrono::Utc;
use log::error;
use log::info;
use log::warn;

use crate::config::Config;
use crate::dispatch::DeliveryDispatcher;
use crate::service::Services;

/// Task that checks for due reminders on a short fixed interval.
///
/// Fire times are absolute wall-clock instants held in the store, so
/// restarts and clock adjustments need no special handling: the first
/// tick after startup sees whatever became due in the meantime. A
/// reminder that overshot its fire time by more than the grace period
/// is marked delivered without sending.
pub struct ReminderScheduler {
    services: Arc<Services>,
    dispatcher: Arc<DeliveryDispatcher>,
    check_interval: Duration,
    grace: Duration,
    running: AtomicBool,
}

impl ReminderScheduler {
    pub fn new(
        services: Arc<Services>,
        dispatcher: Arc<DeliveryDispatcher>,
        config: &Config,
    ) -> Arc<Self> {
        info!(
            "Initializing ReminderScheduler with check interval {:?}",
            config.reminder_check_interval
        );
        Arc::new(Self {
            services,
            dispatcher,
            check_interval: config.reminder_check_interval,
            grace: config.reminder_grace,
            running: AtomicBool::new(false),
        })
    }

    pub fn start(self: Arc<Self>) -> anyhow::Result<()> {
        if !self.running.load(Ordering::SeqCst) {
            self.running.store(true, Ordering::SeqCst);
            info!("Starting ReminderScheduler check loop.");
            self.spawn_check_loop();
        }
        Ok(())
    }

    pub fn stop(self: Arc<Self>) -> anyhow::Result<()> {
        info!("Stopping ReminderScheduler check loop.");
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn spawn_check_loop(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.check_interval);
        tokio::spawn(async move {
            match self.services.reminders.undelivered().await {
                Ok(pending) if !pending.is_empty() => {
                    info!("Resuming {} pending reminder(s) from the store.", pending.len());
                }
                Ok(_) => {}
                Err(e) => error!("Failed to load pending reminders: {e:?}"),
            }
            loop {
                interval.tick().await;
                if !self.running.load(Ordering::SeqCst) {
                    info!("Stopping check loop.");
                    break;
                }
                if let Err(e) = self.fire_due_reminders().await {
                    error!("Error firing reminders: {e:?}");
                }
            }
        });
    }

    pub async fn fire_due_reminders(&self) -> anyhow::Result<()> {
        let now = Utc::now();
        let grace = chrono::Duration::from_std(self.grace)?;

        for reminder in self.services.reminders.due(now).await? {
            if now - reminder.fire_at > grace {
                warn!(
                    "Reminder {} for `{}` missed its window (due {}), marking delivered without sending.",
                    reminder.id, reminder.fingerprint, reminder.fire_at
                );
                self.services.reminders.mark_delivered(reminder.id).await?;
                continue;
            }

            info!(
                "Firing reminder {} for `{}` (due {}).",
                reminder.id, reminder.fingerprint, reminder.fire_at
            );
            if let Err(e) = self.dispatcher.send_reminder(&reminder.fingerprint).await {
                // Left undelivered; the next tick retries until the
                // grace period expires.
                error!("Failed to deliver reminder {}: {e:?}", reminder.id);
                continue;
            }
            self.services.reminders.mark_delivered(reminder.id).await?;
        }
        Ok(())
    }
}
