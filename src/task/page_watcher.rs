//! Background task polling the watched page for new announcements.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use chrono::Utc;
use chrono_tz::Tz;
use log::debug;
use log::error;
use log::info;
use log::warn;
use tokio::time::sleep;

use crate::config::Config;
use crate::database::model::AnnouncementModel;
use crate::dispatch::DeliveryDispatcher;
use crate::event_time::parse_event_time;
use crate::fingerprint::fingerprint;
use crate::scrape::PageSource;
use crate::scrape::ScrapeError;
use crate::scrape::extract_announcement;
use crate::service::Services;
use crate::service::error::ServiceError;

const INITIAL_FETCH_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Task that periodically checks the page for a new announcement.
///
/// One cycle is in flight at a time; a tick never starts while the
/// previous cycle's fetch, extraction or dispatch is still running.
pub struct PageWatcher {
    source: Arc<dyn PageSource>,
    services: Arc<Services>,
    dispatcher: Arc<DeliveryDispatcher>,
    timezone: Tz,
    poll_interval: Duration,
    fetch_max_attempts: u32,
    running: AtomicBool,
}

impl PageWatcher {
    pub fn new(
        source: Arc<dyn PageSource>,
        services: Arc<Services>,
        dispatcher: Arc<DeliveryDispatcher>,
        config: &Config,
    ) -> Arc<Self> {
        info!(
            "Initializing PageWatcher with poll interval {:?}",
            config.poll_interval
        );
        Arc::new(Self {
            source,
            services,
            dispatcher,
            timezone: config.timezone,
            poll_interval: config.poll_interval,
            fetch_max_attempts: config.fetch_max_attempts.max(1),
            running: AtomicBool::new(false),
        })
    }

    pub fn start(self: Arc<Self>) -> anyhow::Result<()> {
        if !self.running.load(Ordering::SeqCst) {
            self.running.store(true, Ordering::SeqCst);
            info!("Starting PageWatcher check loop.");
            self.spawn_check_loop();
        }
        Ok(())
    }

    pub fn stop(self: Arc<Self>) -> anyhow::Result<()> {
        info!("Stopping PageWatcher check loop.");
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn spawn_check_loop(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.poll_interval);
        tokio::spawn(async move {
            loop {
                interval.tick().await;
                if !self.running.load(Ordering::SeqCst) {
                    info!("Stopping check loop.");
                    break;
                }
                if let Err(e) = self.check_page().await {
                    error!("Error checking page: {e:?}");
                }
            }
        });
    }

    /// One poll cycle. Every failure path here is recoverable: the
    /// cycle ends, the loop stays alive, the next tick starts fresh.
    pub async fn check_page(&self) -> anyhow::Result<()> {
        let html = match self.fetch_with_retry().await {
            Ok(html) => html,
            Err(e) => {
                warn!("Fetch failed, skipping this cycle: {e}");
                return Ok(());
            }
        };

        let Some(page) = extract_announcement(&html) else {
            warn!("Page structure did not match expectations, skipping this cycle.");
            return Ok(());
        };

        let fingerprint = fingerprint(&page.title, &page.body);
        if self.services.announcements.exists(&fingerprint).await? {
            debug!("Announcement already processed, skipping.");
            return Ok(());
        }

        let event_at = parse_event_time(&page.title, self.timezone)
            .or_else(|| parse_event_time(&page.body, self.timezone));

        let announcement = AnnouncementModel {
            fingerprint,
            title: page.title,
            body: page.body,
            event_at,
            first_seen_at: Utc::now(),
            reminders_sent: false,
            ..Default::default()
        };

        // The announcement is recorded as seen before any delivery; a
        // crash between insert and dispatch misses that one cycle's
        // notification instead of ever re-delivering.
        match self.services.announcements.insert(&announcement).await {
            Ok(_) => {}
            Err(ServiceError::Conflict { .. }) => {
                info!("Announcement was recorded by a concurrent cycle, skipping.");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }

        info!("New announcement detected: {}", announcement.title);
        self.dispatcher.handle_new_announcement(&announcement).await
    }

    /// Fetches with an in-cycle retry budget. The budget resets every
    /// tick, so transient outages never compound across cycles.
    async fn fetch_with_retry(&self) -> Result<String, ScrapeError> {
        let mut delay = INITIAL_FETCH_RETRY_DELAY;
        let mut attempt = 1;

        loop {
            match self.source.fetch().await {
                Ok(html) => return Ok(html),
                Err(e) if attempt < self.fetch_max_attempts => {
                    warn!("Fetch attempt {attempt} failed: {e}. Retrying in {delay:?}.");
                    sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
