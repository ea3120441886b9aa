use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;

use crate::error::AppError;

const DEFAULT_SCRAPE_URL: &str = "https://www.mujkaktus.cz/chces-pridat";

#[derive(Clone)]
pub struct Config {
    pub poll_interval: Duration,
    pub reminder_check_interval: Duration,
    pub min_lead: Duration,
    pub max_horizon: Duration,
    pub reminder_grace: Duration,
    pub rate_limit_per_sec: u32,
    pub send_concurrency: usize,
    pub send_max_attempts: u32,
    pub fetch_timeout: Duration,
    pub fetch_max_attempts: u32,
    pub timezone: Tz,
    pub scrape_url: String,
    pub db_url: String,
    pub db_path: String,
    pub telegram_token: String,
    pub logs_path: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        Ok(Self {
            poll_interval: duration_secs("POLL_INTERVAL", 300),
            reminder_check_interval: duration_secs("REMINDER_CHECK_INTERVAL", 5),
            min_lead: duration_secs("MIN_LEAD_SECS", 10),
            max_horizon: Duration::from_secs(
                parsed_var("MAX_HORIZON_DAYS", 365u64) * 24 * 3600,
            ),
            reminder_grace: duration_secs("REMINDER_GRACE_SECS", 3600),
            rate_limit_per_sec: parsed_var("RATE_LIMIT", 30),
            send_concurrency: parsed_var("SEND_CONCURRENCY", 8),
            send_max_attempts: parsed_var("SEND_MAX_ATTEMPTS", 3),
            fetch_timeout: duration_secs("FETCH_TIMEOUT", 30),
            fetch_max_attempts: parsed_var("FETCH_MAX_ATTEMPTS", 3),
            timezone: load_timezone()?,
            scrape_url: std::env::var("SCRAPE_URL").unwrap_or(DEFAULT_SCRAPE_URL.to_string()),
            db_url: std::env::var("DB_URL").unwrap_or("sqlite://data.db".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or("data.db".to_string()),
            telegram_token: std::env::var("TELEGRAM_BOT_TOKEN").map_err(|_| {
                AppError::MissingConfig {
                    key: "TELEGRAM_BOT_TOKEN".to_string(),
                }
            })?,
            logs_path: PathBuf::from(std::env::var("LOGS_PATH").unwrap_or("logs".to_string())),
        })
    }
}

fn load_timezone() -> Result<Tz, AppError> {
    let name = std::env::var("TIMEZONE").unwrap_or("Europe/Prague".to_string());
    name.parse::<Tz>().map_err(|_| AppError::ConfigurationError {
        msg: format!("Unknown timezone '{name}'"),
    })
}

fn duration_secs(key: &str, default: u64) -> Duration {
    Duration::from_secs(parsed_var(key, default))
}

fn parsed_var<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
