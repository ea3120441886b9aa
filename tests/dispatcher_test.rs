//! Tests for subscriber bookkeeping and fan-out delivery policy.

use std::sync::Arc;

use chrono::Duration;
use chrono::Utc;
use dobi_bot::database::model::AnnouncementModel;
use dobi_bot::database::table::Table;
use dobi_bot::dispatch::DeliveryDispatcher;
use dobi_bot::service::Services;
use dobi_bot::service::error::ServiceError;

mod common;

fn announcement(fingerprint: &str, event_at: Option<chrono::DateTime<Utc>>) -> AnnouncementModel {
    AnnouncementModel {
        fingerprint: fingerprint.to_string(),
        title: "Dobíječka 9.9.2025 15:00 - 18:00".to_string(),
        body: "Dvojnásobný kredit za dobití".to_string(),
        event_at,
        first_seen_at: Utc::now(),
        ..Default::default()
    }
}

#[tokio::test]
async fn duplicate_insert_yields_conflict() {
    let (db, db_path) = common::setup_db().await;
    let services = Services::new(db.clone());

    let first = announcement(&"a".repeat(64), None);
    services.announcements.insert(&first).await.unwrap();

    let second = announcement(&"a".repeat(64), None);
    match services.announcements.insert(&second).await {
        Err(ServiceError::Conflict { fingerprint }) => {
            assert_eq!(fingerprint, "a".repeat(64));
        }
        other => panic!("Expected Conflict, got {other:?}"),
    }

    common::teardown_db(db_path).await;
}

#[tokio::test]
async fn resubscribe_is_idempotent_and_keeps_subscribed_at() {
    let (db, db_path) = common::setup_db().await;
    let services = Services::new(db.clone());

    assert!(services.subscribers.subscribe(7, Some("karel")).await.unwrap());
    let original = db
        .subscriber_table
        .select(&7)
        .await
        .unwrap()
        .unwrap()
        .subscribed_at;

    // Subscribing again changes nothing
    assert!(!services.subscribers.subscribe(7, Some("karel")).await.unwrap());

    // Unsubscribe then resubscribe reactivates without a new timestamp
    services.subscribers.unsubscribe(7).await.unwrap();
    assert!(services.subscribers.subscribe(7, None).await.unwrap());

    let after = db.subscriber_table.select(&7).await.unwrap().unwrap();
    assert!(after.is_active);
    assert_eq!(after.subscribed_at, original);

    common::teardown_db(db_path).await;
}

#[tokio::test]
async fn unsubscribe_unknown_chat_is_a_noop() {
    let (db, db_path) = common::setup_db().await;
    let services = Services::new(db);

    services.subscribers.unsubscribe(424242).await.unwrap();

    common::teardown_db(db_path).await;
}

#[tokio::test]
async fn reminder_below_min_lead_is_not_scheduled() {
    let (db, db_path) = common::setup_db().await;
    let services = Arc::new(Services::new(db.clone()));
    let messenger = Arc::new(common::MockMessenger::new());
    let dispatcher = DeliveryDispatcher::new(services, messenger, &common::test_config());

    let short_notice = announcement(&"b".repeat(64), Some(Utc::now() + Duration::seconds(5)));
    dispatcher.schedule_reminder(&short_notice).await.unwrap();

    use dobi_bot::database::table::Table;
    assert!(db.reminder_table.select_all().await.unwrap().is_empty());

    common::teardown_db(db_path).await;
}

#[tokio::test]
async fn reminder_past_max_horizon_is_not_scheduled() {
    let (db, db_path) = common::setup_db().await;
    let services = Arc::new(Services::new(db.clone()));
    let messenger = Arc::new(common::MockMessenger::new());
    let dispatcher = DeliveryDispatcher::new(services, messenger, &common::test_config());

    let far_future = announcement(&"c".repeat(64), Some(Utc::now() + Duration::days(400)));
    dispatcher.schedule_reminder(&far_future).await.unwrap();

    use dobi_bot::database::table::Table;
    assert!(db.reminder_table.select_all().await.unwrap().is_empty());

    common::teardown_db(db_path).await;
}

#[tokio::test]
async fn reminder_inside_window_is_scheduled() {
    let (db, db_path) = common::setup_db().await;
    let services = Arc::new(Services::new(db.clone()));
    let messenger = Arc::new(common::MockMessenger::new());
    let dispatcher = DeliveryDispatcher::new(services.clone(), messenger, &common::test_config());

    let event_at = Utc::now() + Duration::hours(1);
    let in_range = announcement(&"d".repeat(64), Some(event_at));
    services.announcements.insert(&in_range).await.unwrap();
    dispatcher.schedule_reminder(&in_range).await.unwrap();

    use dobi_bot::database::table::Table;
    let reminders = db.reminder_table.select_all().await.unwrap();
    assert_eq!(reminders.len(), 1);
    assert_eq!(reminders[0].fingerprint, "d".repeat(64));
    assert_eq!(reminders[0].fire_at.timestamp(), event_at.timestamp());
    assert!(!reminders[0].delivered);

    common::teardown_db(db_path).await;
}

#[tokio::test]
async fn unreachable_recipient_is_deactivated_and_others_still_delivered() {
    let (db, db_path) = common::setup_db().await;
    let services = Arc::new(Services::new(db.clone()));
    let messenger = Arc::new(common::MockMessenger::new());
    let dispatcher =
        DeliveryDispatcher::new(services.clone(), messenger.clone(), &common::test_config());

    for chat_id in [1, 2, 3] {
        services.subscribers.subscribe(chat_id, None).await.unwrap();
    }
    messenger.set_unreachable(2);

    let first = announcement(&"e".repeat(64), None);
    dispatcher.send_immediate(&first).await.unwrap();

    assert_eq!(messenger.sent_to(1).len(), 1);
    assert_eq!(messenger.sent_to(2).len(), 0);
    assert_eq!(messenger.sent_to(3).len(), 1);

    let blocked = db.subscriber_table.select(&2).await.unwrap().unwrap();
    assert!(!blocked.is_active);

    // The next dispatch cycle no longer attempts chat 2 at all
    let attempts_before = messenger.attempts(2);
    let second = announcement(&"f".repeat(64), None);
    dispatcher.send_immediate(&second).await.unwrap();

    assert_eq!(messenger.attempts(2), attempts_before);
    assert_eq!(messenger.sent_to(1).len(), 2);
    assert_eq!(messenger.sent_to(3).len(), 2);

    common::teardown_db(db_path).await;
}

#[tokio::test]
async fn transient_failure_is_retried_until_success() {
    let (db, db_path) = common::setup_db().await;
    let services = Arc::new(Services::new(db.clone()));
    let messenger = Arc::new(common::MockMessenger::new());
    let dispatcher =
        DeliveryDispatcher::new(services.clone(), messenger.clone(), &common::test_config());

    services.subscribers.subscribe(5, None).await.unwrap();
    messenger.set_transient_failures(5, 1);

    let flaky = announcement(&"1".repeat(64), None);
    dispatcher.send_immediate(&flaky).await.unwrap();

    assert_eq!(messenger.sent_to(5).len(), 1);
    assert_eq!(messenger.attempts(5), 2);

    // The recipient stays active after a recovered transient failure
    assert!(db.subscriber_table.select(&5).await.unwrap().unwrap().is_active);

    common::teardown_db(db_path).await;
}

#[tokio::test]
async fn transient_failures_exhaust_attempts_and_drop_recipient_message() {
    let (db, db_path) = common::setup_db().await;
    let services = Arc::new(Services::new(db.clone()));
    let messenger = Arc::new(common::MockMessenger::new());
    let dispatcher =
        DeliveryDispatcher::new(services.clone(), messenger.clone(), &common::test_config());

    services.subscribers.subscribe(6, None).await.unwrap();
    services.subscribers.subscribe(7, None).await.unwrap();
    messenger.set_transient_failures(6, 99);

    let unlucky = announcement(&"2".repeat(64), None);
    dispatcher.send_immediate(&unlucky).await.unwrap();

    // Bounded attempts for the failing chat, delivery for the healthy one
    assert_eq!(messenger.attempts(6), common::test_config().send_max_attempts);
    assert_eq!(messenger.sent_to(6).len(), 0);
    assert_eq!(messenger.sent_to(7).len(), 1);

    // Dropped after retries, but not deactivated
    assert!(db.subscriber_table.select(&6).await.unwrap().unwrap().is_active);

    common::teardown_db(db_path).await;
}
