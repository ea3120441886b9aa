use std::collections::HashMap;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono_tz::Europe::Prague;
use dobi_bot::config::Config;
use dobi_bot::database::Database;
use dobi_bot::messenger::Messenger;
use dobi_bot::messenger::SendError;
use dobi_bot::scrape::PageSource;
use dobi_bot::scrape::ScrapeError;
use uuid::Uuid;

pub async fn setup_db() -> (Arc<Database>, PathBuf) {
    let uuid = Uuid::new_v4();
    let db_path = std::env::temp_dir().join(format!("dobi-bot-test-{}.db", uuid));
    let db_url = format!("sqlite://{}", db_path.to_str().unwrap());

    let db = Database::new(&db_url, db_path.to_str().unwrap())
        .await
        .expect("Failed to create database");

    db.create_all_tables()
        .await
        .expect("Failed to create tables");

    (Arc::new(db), db_path)
}

pub async fn teardown_db(db_path: PathBuf) {
    if db_path.exists() {
        let _ = std::fs::remove_file(db_path);
    }
}

#[allow(dead_code)]
pub fn test_config() -> Config {
    Config {
        poll_interval: Duration::from_millis(100),
        reminder_check_interval: Duration::from_millis(100),
        min_lead: Duration::from_secs(10),
        max_horizon: Duration::from_secs(365 * 24 * 3600),
        reminder_grace: Duration::from_secs(3600),
        rate_limit_per_sec: 1000,
        send_concurrency: 4,
        send_max_attempts: 3,
        fetch_timeout: Duration::from_secs(5),
        fetch_max_attempts: 2,
        timezone: Prague,
        scrape_url: String::new(),
        db_url: String::new(),
        db_path: String::new(),
        telegram_token: "test-token".to_string(),
        logs_path: PathBuf::from("logs"),
    }
}

// MOCK MESSENGER

#[derive(Default)]
pub struct MockMessengerState {
    pub sent: Vec<(i64, String)>,
    pub attempts: HashMap<i64, u32>,
    pub unreachable: HashSet<i64>,
    pub transient_failures: HashMap<i64, u32>,
}

/// Scripted [`Messenger`]: records every delivery and fails on demand.
#[derive(Clone, Default)]
pub struct MockMessenger {
    pub state: Arc<RwLock<MockMessengerState>>,
}

#[allow(dead_code)]
impl MockMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unreachable(&self, chat_id: i64) {
        self.state.write().unwrap().unreachable.insert(chat_id);
    }

    /// The next `count` sends to `chat_id` fail transiently, then succeed.
    pub fn set_transient_failures(&self, chat_id: i64, count: u32) {
        self.state
            .write()
            .unwrap()
            .transient_failures
            .insert(chat_id, count);
    }

    pub fn sent_to(&self, chat_id: i64) -> Vec<String> {
        self.state
            .read()
            .unwrap()
            .sent
            .iter()
            .filter(|(id, _)| *id == chat_id)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn total_sent(&self) -> usize {
        self.state.read().unwrap().sent.len()
    }

    pub fn attempts(&self, chat_id: i64) -> u32 {
        self.state
            .read()
            .unwrap()
            .attempts
            .get(&chat_id)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send(&self, chat_id: i64, text: &str) -> Result<(), SendError> {
        let mut state = self.state.write().unwrap();
        *state.attempts.entry(chat_id).or_insert(0) += 1;

        if state.unreachable.contains(&chat_id) {
            return Err(SendError::Unreachable { chat_id });
        }
        if let Some(remaining) = state.transient_failures.get_mut(&chat_id)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(SendError::Transient {
                message: "scripted failure".to_string(),
            });
        }

        state.sent.push((chat_id, text.to_string()));
        Ok(())
    }
}

// MOCK PAGE SOURCE

#[derive(Default)]
pub struct MockPageState {
    pub html: Option<String>,
    pub fail: bool,
    pub fetches: u32,
}

/// Scripted [`PageSource`] serving canned markup.
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct MockPage {
    pub state: Arc<RwLock<MockPageState>>,
}

#[allow(dead_code)]
impl MockPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_html(&self, html: &str) {
        let mut state = self.state.write().unwrap();
        state.html = Some(html.to_string());
        state.fail = false;
    }

    pub fn set_failing(&self) {
        self.state.write().unwrap().fail = true;
    }

    pub fn fetches(&self) -> u32 {
        self.state.read().unwrap().fetches
    }
}

#[async_trait]
impl PageSource for MockPage {
    async fn fetch(&self) -> Result<String, ScrapeError> {
        let mut state = self.state.write().unwrap();
        state.fetches += 1;
        if state.fail {
            return Err(ScrapeError::BadStatus { status: 503 });
        }
        state
            .html
            .clone()
            .ok_or(ScrapeError::BadStatus { status: 404 })
    }
}
