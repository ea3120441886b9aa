//! dobi-bot - a Telegram notification bot for Kaktus promo events.
//!
//! This crate watches the Kaktus "Dobíječka" promo page and provides:
//! - Detection and deduplication of newly published event announcements
//! - Immediate notifications to subscribed Telegram chats
//! - Restart-durable reminders delivered at the event's start time
//! - Subscription management via `/start` and `/stop` commands

pub mod config;
pub mod database;
pub mod dispatch;
pub mod error;
pub mod event_time;
pub mod fingerprint;
pub mod logging;
pub mod messenger;
pub mod scrape;
pub mod service;
pub mod task;
