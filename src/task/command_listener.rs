//! Background task handling `/start` and `/stop` chat commands.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use log::error;
use log::info;
use log::warn;
use tokio::time::sleep;

use crate::messenger::Messenger;
use crate::messenger::TelegramMessenger;
use crate::messenger::telegram::ChatUpdate;
use crate::service::Services;

const POLL_ERROR_DELAY: Duration = Duration::from_secs(5);

const WELCOME_NEW: &str = "🌵 Vítejte u Kaktus notifikačního botu!\n\n\
    Budete dostávat oznámení o nových akcích na T-Mobile Kaktus.\n\
    Pro ukončení odběru použijte /stop";
const WELCOME_BACK: &str = "🌵 Jste již přihlášeni k odběru oznámení!\n\n\
    Pro ukončení odběru použijte /stop";
const GOODBYE: &str = "👋 Odběr oznámení byl ukončen.\n\n\
    Pro obnovení odběru použijte /start";

/// Long-polls the chat provider and keeps the subscriber registry in
/// sync with `/start` and `/stop` commands.
pub struct CommandListener {
    telegram: Arc<TelegramMessenger>,
    services: Arc<Services>,
    running: AtomicBool,
}

impl CommandListener {
    pub fn new(telegram: Arc<TelegramMessenger>, services: Arc<Services>) -> Arc<Self> {
        info!("Initializing CommandListener.");
        Arc::new(Self {
            telegram,
            services,
            running: AtomicBool::new(false),
        })
    }

    pub fn start(self: Arc<Self>) -> anyhow::Result<()> {
        if !self.running.load(Ordering::SeqCst) {
            self.running.store(true, Ordering::SeqCst);
            info!("Starting CommandListener poll loop.");
            self.spawn_poll_loop();
        }
        Ok(())
    }

    pub fn stop(self: Arc<Self>) -> anyhow::Result<()> {
        info!("Stopping CommandListener poll loop.");
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn spawn_poll_loop(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut offset = 0i64;
            loop {
                if !self.running.load(Ordering::SeqCst) {
                    info!("Stopping poll loop.");
                    break;
                }
                match self.telegram.get_updates(offset).await {
                    Ok(updates) => {
                        for update in updates {
                            offset = offset.max(update.update_id + 1);
                            self.handle_update(update).await;
                        }
                    }
                    Err(e) => {
                        warn!("Polling chat updates failed: {e}. Retrying shortly.");
                        sleep(POLL_ERROR_DELAY).await;
                    }
                }
            }
        });
    }

    async fn handle_update(&self, update: ChatUpdate) {
        match update.text.trim() {
            "/start" => self.handle_start(&update).await,
            "/stop" => self.handle_stop(&update).await,
            _ => {}
        }
    }

    async fn handle_start(&self, update: &ChatUpdate) {
        let reply = match self
            .services
            .subscribers
            .subscribe(update.chat_id, update.username.as_deref())
            .await
        {
            Ok(true) => WELCOME_NEW,
            Ok(false) => WELCOME_BACK,
            Err(e) => {
                error!("Failed to subscribe chat {}: {e}", update.chat_id);
                return;
            }
        };
        self.reply(update.chat_id, reply).await;
    }

    async fn handle_stop(&self, update: &ChatUpdate) {
        if let Err(e) = self.services.subscribers.unsubscribe(update.chat_id).await {
            error!("Failed to unsubscribe chat {}: {e}", update.chat_id);
            return;
        }
        self.reply(update.chat_id, GOODBYE).await;
    }

    async fn reply(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.telegram.send(chat_id, text).await {
            warn!("Failed to send command reply to {chat_id}: {e}");
        }
    }
}
