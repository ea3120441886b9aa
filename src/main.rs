//! Application entry point for dobi-bot.
//!
//! Initializes all components and starts the watch, reminder and
//! command loops.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use dobi_bot::config::Config;
use dobi_bot::database::Database;
use dobi_bot::dispatch::DeliveryDispatcher;
use dobi_bot::logging::setup_logging;
use dobi_bot::messenger::Messenger;
use dobi_bot::messenger::TelegramMessenger;
use dobi_bot::scrape::KaktusPage;
use dobi_bot::service::Services;
use dobi_bot::task::CommandListener;
use dobi_bot::task::PageWatcher;
use dobi_bot::task::ReminderScheduler;
use dotenv::dotenv;
use log::debug;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let init_start = Instant::now();
    let config = load_config()?;

    let db = setup_database(&config, init_start).await?;
    let services = Arc::new(Services::new(db));

    let messenger = Arc::new(TelegramMessenger::new(&config.telegram_token)?);
    let dispatcher = Arc::new(DeliveryDispatcher::new(
        services.clone(),
        messenger.clone() as Arc<dyn Messenger>,
        &config,
    ));

    let watcher = setup_watcher(&config, services.clone(), dispatcher.clone(), init_start)?;
    let scheduler = ReminderScheduler::new(services.clone(), dispatcher, &config);
    scheduler.clone().start()?;
    let listener = CommandListener::new(messenger, services);
    listener.clone().start()?;

    run(init_start).await?;

    watcher.stop()?;
    scheduler.stop()?;
    listener.stop()?;
    Ok(())
}

fn load_config() -> Result<Config> {
    debug!("Loading configuration...");
    let config = Config::load()?;
    setup_logging(&config)?;
    info!("Starting dobi-bot...");
    Ok(config)
}

async fn setup_database(config: &Config, init_start: Instant) -> Result<Arc<Database>> {
    debug!("Setting up Database...");
    // Startup is the only fatal path: no store, no process.
    let db = Arc::new(Database::new(&config.db_url, &config.db_path).await?);
    db.create_all_tables().await?;
    info!(
        "Database setup complete ({:.2}s).",
        init_start.elapsed().as_secs_f64()
    );
    Ok(db)
}

fn setup_watcher(
    config: &Config,
    services: Arc<Services>,
    dispatcher: Arc<DeliveryDispatcher>,
    init_start: Instant,
) -> Result<Arc<PageWatcher>> {
    debug!("Setting up PageWatcher...");
    let page = Arc::new(KaktusPage::new(&config.scrape_url, config.fetch_timeout)?);
    let watcher = PageWatcher::new(page, services, dispatcher, config);
    watcher.clone().start()?;
    info!(
        "Watcher setup complete ({:.2}s).",
        init_start.elapsed().as_secs_f64()
    );
    Ok(watcher)
}

async fn run(init_start: Instant) -> Result<()> {
    info!(
        "dobi-bot is up in {:.2}s. Press Ctrl+C to stop.",
        init_start.elapsed().as_secs_f64()
    );

    tokio::signal::ctrl_c().await?;
    info!("Ctrl+C received, shutting down.");

    Ok(())
}
