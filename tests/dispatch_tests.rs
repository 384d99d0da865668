//! Functional tests for reminder dispatch.
//!
//! These exercise the full dispatch path against the in-memory repository
//! with a mock push sender, validating the gating rules, addressing modes,
//! and send/failure counting.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use planner_rust::api::{SubscriptionKeys, UserId, WebPushSubscription};
use planner_rust::db::repositories::LocalRepository;
use planner_rust::push::{
    run_dispatch, DispatchMode, DispatchOutcome, PushError, PushSender, SkipReason,
};
use planner_rust::reminder::NotificationContent;
use planner_rust::services::{planner, subscriptions};

/// Sender that records endpoints and fails those containing "broken".
struct MockSender {
    calls: AtomicUsize,
    endpoints: Mutex<Vec<String>>,
}

impl MockSender {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            endpoints: Mutex::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PushSender for MockSender {
    async fn send(
        &self,
        subscription: &WebPushSubscription,
        _content: &NotificationContent,
    ) -> Result<(), PushError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.endpoints.lock().push(subscription.endpoint.clone());
        if subscription.endpoint.contains("broken") {
            Err(PushError::Delivery("simulated endpoint failure".into()))
        } else {
            Ok(())
        }
    }
}

fn subscription(endpoint: &str) -> WebPushSubscription {
    WebPushSubscription {
        endpoint: endpoint.to_string(),
        keys: SubscriptionKeys {
            p256dh: "BPk".to_string(),
            auth: "a2s".to_string(),
        },
    }
}

/// A local wall-clock moment that fires: on the grid, outside quiet hours.
fn firing_now() -> DateTime<Local> {
    Local.with_ymd_and_hms(2025, 9, 3, 10, 15, 0).unwrap()
}

fn today(now: DateTime<Local>) -> NaiveDate {
    now.date_naive()
}

async fn subscribed_active_user(
    repo: &LocalRepository,
    endpoint: &str,
    date: NaiveDate,
) -> UserId {
    let uid = UserId::new(Uuid::new_v4());
    planner::start_day(repo, uid, date, Utc::now()).await.unwrap();
    subscriptions::subscribe(repo, uid, subscription(endpoint), Utc::now())
        .await
        .unwrap();
    uid
}

#[tokio::test]
async fn counts_sends_and_failures_independently() {
    let repo = LocalRepository::new();
    let sender = MockSender::new();
    let now = firing_now();

    subscribed_active_user(&repo, "https://push.example/ok-1", today(now)).await;
    subscribed_active_user(&repo, "https://push.example/ok-2", today(now)).await;
    subscribed_active_user(&repo, "https://push.example/broken", today(now)).await;

    let outcome = run_dispatch(&repo, &sender, DispatchMode::ActiveOnly, now)
        .await
        .unwrap();

    match outcome {
        DispatchOutcome::Sent { sent, failed, .. } => {
            assert_eq!(sent, 2);
            assert_eq!(failed, 1);
        }
        other => panic!("expected Sent outcome, got {:?}", other),
    }
    assert_eq!(sender.call_count(), 3);
}

#[tokio::test]
async fn nobody_active_means_zero_sends_without_sender_calls() {
    let repo = LocalRepository::new();
    let sender = MockSender::new();
    let now = firing_now();

    // Subscribed but never started a day.
    let uid = UserId::new(Uuid::new_v4());
    subscriptions::subscribe(&repo, uid, subscription("https://push.example/idle"), Utc::now())
        .await
        .unwrap();

    let outcome = run_dispatch(&repo, &sender, DispatchMode::ActiveOnly, now)
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        DispatchOutcome::Sent { sent: 0, failed: 0, .. }
    ));
    assert_eq!(sender.call_count(), 0);
}

#[tokio::test]
async fn ended_day_is_not_paged() {
    let repo = LocalRepository::new();
    let sender = MockSender::new();
    let now = firing_now();

    let uid = subscribed_active_user(&repo, "https://push.example/done", today(now)).await;
    planner::end_day(&repo, uid, today(now), Utc::now())
        .await
        .unwrap();

    let outcome = run_dispatch(&repo, &sender, DispatchMode::ActiveOnly, now)
        .await
        .unwrap();

    assert_eq!(outcome.sent_count(), 0);
    assert_eq!(sender.call_count(), 0);
}

#[tokio::test]
async fn broadcast_pages_every_subscriber() {
    let repo = LocalRepository::new();
    let sender = MockSender::new();
    let now = firing_now();

    // One active, one idle; broadcast ignores session state.
    subscribed_active_user(&repo, "https://push.example/active", today(now)).await;
    let idle = UserId::new(Uuid::new_v4());
    subscriptions::subscribe(&repo, idle, subscription("https://push.example/idle"), Utc::now())
        .await
        .unwrap();

    let outcome = run_dispatch(&repo, &sender, DispatchMode::Broadcast, now)
        .await
        .unwrap();

    assert_eq!(outcome.sent_count(), 2);
    assert_eq!(sender.call_count(), 2);
}

#[tokio::test]
async fn off_grid_trigger_is_skipped() {
    let repo = LocalRepository::new();
    let sender = MockSender::new();
    let now = Local.with_ymd_and_hms(2025, 9, 3, 10, 17, 0).unwrap();

    subscribed_active_user(&repo, "https://push.example/ok", today(now)).await;

    let outcome = run_dispatch(&repo, &sender, DispatchMode::ActiveOnly, now)
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        DispatchOutcome::Skipped {
            reason: SkipReason::NotGridAligned,
            ..
        }
    ));
    assert_eq!(sender.call_count(), 0);
}

#[tokio::test]
async fn quiet_hours_trigger_is_skipped() {
    let repo = LocalRepository::new();
    let sender = MockSender::new();

    for (hour, minute) in [(23, 0), (23, 45), (0, 30), (5, 45)] {
        let now = Local.with_ymd_and_hms(2025, 9, 3, hour, minute, 0).unwrap();
        let outcome = run_dispatch(&repo, &sender, DispatchMode::Broadcast, now)
            .await
            .unwrap();

        assert!(
            matches!(
                outcome,
                DispatchOutcome::Skipped {
                    reason: SkipReason::QuietHours,
                    ..
                }
            ),
            "{:02}:{:02} should be quiet",
            hour,
            minute
        );
    }
    assert_eq!(sender.call_count(), 0);
}

#[tokio::test]
async fn quiet_hours_end_at_six() {
    let repo = LocalRepository::new();
    let sender = MockSender::new();
    let now = Local.with_ymd_and_hms(2025, 9, 3, 6, 0, 0).unwrap();

    subscribed_active_user(&repo, "https://push.example/morning", today(now)).await;

    let outcome = run_dispatch(&repo, &sender, DispatchMode::ActiveOnly, now)
        .await
        .unwrap();

    assert_eq!(outcome.sent_count(), 1);
}
