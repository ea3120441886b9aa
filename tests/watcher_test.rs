//! End-to-end flow: page detection through reminder delivery.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use chrono::Timelike;
use chrono::Utc;
use chrono_tz::Europe::Prague;
use dobi_bot::database::table::Table;
use dobi_bot::dispatch::DeliveryDispatcher;
use dobi_bot::scrape::KaktusPage;
use dobi_bot::service::Services;
use dobi_bot::task::PageWatcher;
use dobi_bot::task::ReminderScheduler;
use httpmock::Method::GET;
use httpmock::MockServer;

mod common;

fn promo_page(event_line: &str) -> String {
    format!(
        r#"
        <html><body>
          <main>
            <h2>Chceš přidat?</h2>
            <p>Dobíječka se koná {event_line}.</p>
            <p>Dobij si alespoň 200 Kč a získej dvojnásobný kredit navíc.</p>
          </main>
        </body></html>
        "#
    )
}

#[tokio::test]
async fn detects_notifies_and_reminds_end_to_end() {
    let (db, db_path) = common::setup_db().await;
    let services = Arc::new(Services::new(db.clone()));
    let messenger = Arc::new(common::MockMessenger::new());
    let config = common::test_config();
    let dispatcher = Arc::new(DeliveryDispatcher::new(
        services.clone(),
        messenger.clone(),
        &config,
    ));

    for chat_id in [1, 2] {
        services.subscribers.subscribe(chat_id, None).await.unwrap();
    }

    // Event two hours out, written the way the page renders it. The
    // page carries minute precision only, so truncate up front.
    let event_start = (Utc::now() + Duration::hours(2))
        .with_timezone(&Prague)
        .with_second(0)
        .unwrap()
        .with_nanosecond(0)
        .unwrap();
    let event_line = format!(
        "{} - {}",
        event_start.format("%-d.%-m.%Y %H:%M"),
        (event_start + Duration::hours(3)).format("%H:%M")
    );

    let server = MockServer::start();
    let page_mock = server.mock(|when, then| {
        when.method(GET).path("/chces-pridat");
        then.status(200)
            .header("content-type", "text/html")
            .body(promo_page(&event_line));
    });

    let page = Arc::new(
        KaktusPage::new(&server.url("/chces-pridat"), StdDuration::from_secs(5)).unwrap(),
    );
    let watcher = PageWatcher::new(page, services.clone(), dispatcher.clone(), &config);

    // First cycle: novel announcement
    watcher.check_page().await.unwrap();
    page_mock.assert();

    let announcements = db.announcement_table.select_all().await.unwrap();
    assert_eq!(announcements.len(), 1);
    assert!(announcements[0].title.starts_with("Dobíječka"));

    assert_eq!(messenger.sent_to(1).len(), 1);
    assert_eq!(messenger.sent_to(2).len(), 1);
    assert!(messenger.sent_to(1)[0].contains("Nová Kaktus akce"));

    let reminders = db.reminder_table.select_all().await.unwrap();
    assert_eq!(reminders.len(), 1);
    assert_eq!(
        reminders[0].fire_at.timestamp(),
        event_start.with_timezone(&Utc).timestamp()
    );

    // Second cycle: same page content is a duplicate, nothing happens
    watcher.check_page().await.unwrap();
    assert_eq!(db.announcement_table.select_all().await.unwrap().len(), 1);
    assert_eq!(messenger.total_sent(), 2);
    assert_eq!(db.reminder_table.select_all().await.unwrap().len(), 1);

    // Wind the reminder's fire time into the past and let it fire
    let mut reminder = reminders.into_iter().next().unwrap();
    reminder.fire_at = Utc::now() - Duration::seconds(30);
    db.reminder_table.update(&reminder).await.unwrap();

    let scheduler = ReminderScheduler::new(services.clone(), dispatcher, &config);
    scheduler.fire_due_reminders().await.unwrap();

    assert_eq!(messenger.sent_to(1).len(), 2);
    assert_eq!(messenger.sent_to(2).len(), 2);
    assert!(messenger.sent_to(1)[1].contains("Připomínka"));

    let announcement = services
        .announcements
        .get(&announcements[0].fingerprint)
        .await
        .unwrap();
    assert!(announcement.reminders_sent);
    assert!(db.reminder_table.select_all().await.unwrap()[0].delivered);

    common::teardown_db(db_path).await;
}

#[tokio::test]
async fn changed_page_structure_skips_cycle_without_crashing() {
    let (db, db_path) = common::setup_db().await;
    let services = Arc::new(Services::new(db.clone()));
    let messenger = Arc::new(common::MockMessenger::new());
    let config = common::test_config();
    let dispatcher = Arc::new(DeliveryDispatcher::new(
        services.clone(),
        messenger.clone(),
        &config,
    ));

    services.subscribers.subscribe(1, None).await.unwrap();

    let page = Arc::new(common::MockPage::new());
    page.set_html("<html><body><p>Completely different site now.</p></body></html>");
    let watcher = PageWatcher::new(page, services, dispatcher, &config);

    watcher.check_page().await.unwrap();

    assert!(db.announcement_table.select_all().await.unwrap().is_empty());
    assert_eq!(messenger.total_sent(), 0);

    common::teardown_db(db_path).await;
}

#[tokio::test]
async fn fetch_failure_retries_within_cycle_then_gives_up() {
    let (db, db_path) = common::setup_db().await;
    let services = Arc::new(Services::new(db.clone()));
    let messenger = Arc::new(common::MockMessenger::new());
    let config = common::test_config();
    let dispatcher = Arc::new(DeliveryDispatcher::new(
        services.clone(),
        messenger.clone(),
        &config,
    ));

    let page = Arc::new(common::MockPage::new());
    page.set_failing();
    let watcher = PageWatcher::new(page.clone(), services, dispatcher, &config);

    // The cycle consumes its whole retry budget, then ends cleanly
    watcher.check_page().await.unwrap();
    assert_eq!(page.fetches(), config.fetch_max_attempts);
    assert!(db.announcement_table.select_all().await.unwrap().is_empty());

    // A fresh cycle starts with a fresh budget
    watcher.check_page().await.unwrap();
    assert_eq!(page.fetches(), config.fetch_max_attempts * 2);

    common::teardown_db(db_path).await;
}
