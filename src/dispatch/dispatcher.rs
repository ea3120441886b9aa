//! Fan-out delivery of notifications to subscribers.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use governor::Quota;
use governor::RateLimiter;
use governor::clock::QuantaClock;
use governor::state::InMemoryState;
use governor::state::direct::NotKeyed;
use log::error;
use log::info;
use log::warn;
use tokio::time::sleep;

use crate::config::Config;
use crate::database::model::AnnouncementModel;
use crate::messenger::Messenger;
use crate::messenger::SendError;
use crate::service::Services;

const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(500);

pub struct DeliveryDispatcher {
    services: Arc<Services>,
    messenger: Arc<dyn Messenger>,
    // One token bucket for immediate and reminder sends alike, so a
    // reminder burst can never push the aggregate rate past the ceiling.
    limiter: RateLimiter<NotKeyed, InMemoryState, QuantaClock>,
    send_concurrency: usize,
    send_max_attempts: u32,
    min_lead: Duration,
    max_horizon: Duration,
}

impl DeliveryDispatcher {
    pub fn new(services: Arc<Services>, messenger: Arc<dyn Messenger>, config: &Config) -> Self {
        let per_second = NonZeroU32::new(config.rate_limit_per_sec.max(1))
            .expect("rate limit is clamped to at least 1");
        let limiter = RateLimiter::direct(Quota::per_second(per_second));

        Self {
            services,
            messenger,
            limiter,
            send_concurrency: config.send_concurrency.max(1),
            send_max_attempts: config.send_max_attempts.max(1),
            min_lead: config.min_lead,
            max_horizon: config.max_horizon,
        }
    }

    /// Immediate notification plus, when the event time allows it, a
    /// deferred reminder. Called by the watcher within the detecting
    /// poll cycle.
    pub async fn handle_new_announcement(
        &self,
        announcement: &AnnouncementModel,
    ) -> anyhow::Result<()> {
        self.send_immediate(announcement).await?;
        self.schedule_reminder(announcement).await?;
        Ok(())
    }

    pub async fn send_immediate(&self, announcement: &AnnouncementModel) -> anyhow::Result<()> {
        let text = format!(
            "🌵 Nová Kaktus akce!\n\n{}\n\n{}",
            announcement.title, announcement.body
        );
        self.fan_out(&text).await
    }

    /// Registers a deferred reminder when the event start lies inside
    /// the schedulable window. Out-of-window or missing event times are
    /// logged and skipped, never treated as errors.
    pub async fn schedule_reminder(&self, announcement: &AnnouncementModel) -> anyhow::Result<()> {
        let Some(event_at) = announcement.event_at else {
            info!(
                "No event time for '{}', notification is immediate-only.",
                announcement.title
            );
            return Ok(());
        };

        let now = Utc::now();
        let min_lead = chrono::Duration::from_std(self.min_lead)?;
        let max_horizon = chrono::Duration::from_std(self.max_horizon)?;

        if event_at < now + min_lead || event_at > now + max_horizon {
            info!(
                "Event time {} for '{}' is outside the schedulable window, notification is immediate-only.",
                event_at, announcement.title
            );
            return Ok(());
        }

        self.services
            .reminders
            .schedule(&announcement.fingerprint, event_at)
            .await?;
        info!(
            "Scheduled reminder for '{}' at {}.",
            announcement.title, event_at
        );
        Ok(())
    }

    /// Fires the deferred reminder for `fingerprint`. Invoked by the
    /// reminder scheduler at fire time.
    pub async fn send_reminder(&self, fingerprint: &str) -> anyhow::Result<()> {
        let announcement = self.services.announcements.get(fingerprint).await?;
        let text = format!(
            "⏰ Připomínka: Kaktus akce začíná nyní!\n\n{}",
            announcement.title
        );
        self.fan_out(&text).await?;
        self.services
            .announcements
            .mark_reminders_sent(fingerprint)
            .await?;
        Ok(())
    }

    async fn fan_out(&self, text: &str) -> anyhow::Result<()> {
        let subscribers = self.services.subscribers.list_active().await?;
        if subscribers.is_empty() {
            info!("No active subscribers to notify.");
            return Ok(());
        }

        let total = subscribers.len();
        let delivered = AtomicUsize::new(0);

        futures::stream::iter(subscribers)
            .for_each_concurrent(self.send_concurrency, |subscriber| {
                let delivered = &delivered;
                async move {
                    if self.deliver_to(subscriber.chat_id, text).await {
                        delivered.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
            .await;

        info!(
            "Delivered message to {}/{} active subscribers.",
            delivered.load(Ordering::Relaxed),
            total
        );
        Ok(())
    }

    /// One recipient, full retry policy. Failures here never propagate;
    /// the fan-out to the remaining recipients is independent.
    async fn deliver_to(&self, chat_id: i64, text: &str) -> bool {
        let mut delay = INITIAL_RETRY_DELAY;

        for attempt in 1..=self.send_max_attempts {
            self.limiter.until_ready().await;

            match self.messenger.send(chat_id, text).await {
                Ok(()) => return true,
                Err(SendError::Unreachable { .. }) => {
                    warn!("Recipient {chat_id} is unreachable, deactivating.");
                    if let Err(e) = self
                        .services
                        .subscribers
                        .deactivate(chat_id, "unreachable")
                        .await
                    {
                        error!("Failed to deactivate subscriber {chat_id}: {e}");
                    }
                    return false;
                }
                Err(SendError::Transient { message }) => {
                    if attempt < self.send_max_attempts {
                        warn!(
                            "Send to {chat_id} failed (attempt {attempt}): {message}. Retrying in {delay:?}."
                        );
                        sleep(delay).await;
                        delay *= 2;
                    } else {
                        warn!(
                            "Dropping message for {chat_id} after {attempt} attempts: {message}"
                        );
                    }
                }
            }
        }
        false
    }
}
