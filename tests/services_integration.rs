//! Integration tests for the service layer against the in-memory repository.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use planner_rust::api::{ConditionScore, SubscriptionKeys, UserId, WebPushSubscription};
use planner_rust::db::repositories::LocalRepository;
use planner_rust::db::repository::{FullRepository, SubscriptionRepository};
use planner_rust::services::{analytics, planner, subscriptions};

fn user() -> UserId {
    UserId::new(Uuid::new_v4())
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

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

#[tokio::test]
async fn health_check() {
    let repo = LocalRepository::new();
    assert!(repo.health_check().await.unwrap());
}

#[tokio::test]
async fn resubscribe_replaces_previous_endpoint() {
    let repo = LocalRepository::new();
    let uid = user();

    subscriptions::subscribe(&repo, uid, subscription("https://push.example/old"), Utc::now())
        .await
        .unwrap();
    subscriptions::subscribe(&repo, uid, subscription("https://push.example/new"), Utc::now())
        .await
        .unwrap();

    let record = subscriptions::find_subscription(&repo, uid)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.subscription.endpoint, "https://push.example/new");

    // Still exactly one record for the user.
    assert_eq!(repo.list_subscriptions().await.unwrap().len(), 1);
}

#[tokio::test]
async fn unsubscribe_is_noop_when_absent() {
    let repo = LocalRepository::new();
    let uid = user();

    assert!(!subscriptions::unsubscribe(&repo, uid).await.unwrap());

    subscriptions::subscribe(&repo, uid, subscription("https://push.example/a"), Utc::now())
        .await
        .unwrap();
    assert!(subscriptions::unsubscribe(&repo, uid).await.unwrap());
    assert!(subscriptions::find_subscription(&repo, uid)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn subscription_lookup_filters_by_user_set() {
    let repo = LocalRepository::new();
    let (a, b, c) = (user(), user(), user());

    for (uid, endpoint) in [(a, "https://p/1"), (b, "https://p/2"), (c, "https://p/3")] {
        subscriptions::subscribe(&repo, uid, subscription(endpoint), Utc::now())
            .await
            .unwrap();
    }

    let found = repo.find_subscriptions_for_users(&[a, c]).await.unwrap();
    let endpoints: Vec<_> = found.iter().map(|r| r.subscription.endpoint.clone()).collect();

    assert_eq!(found.len(), 2);
    assert!(endpoints.contains(&"https://p/1".to_string()));
    assert!(endpoints.contains(&"https://p/3".to_string()));
}

#[tokio::test]
async fn full_day_round_trip() {
    let repo = LocalRepository::new();
    let uid = user();
    let date = NaiveDate::from_ymd_opt(2025, 9, 3).unwrap();

    let session = planner::start_day(&repo, uid, date, at(2025, 9, 3, 8, 0))
        .await
        .unwrap();

    planner::save_slot(
        &repo,
        session.id,
        at(2025, 9, 3, 9, 0),
        Some("writing".to_string()),
        Some(ConditionScore::new(5).unwrap()),
    )
    .await
    .unwrap();
    planner::save_slot(
        &repo,
        session.id,
        at(2025, 9, 3, 9, 15),
        Some("writing".to_string()),
        Some(ConditionScore::new(6).unwrap()),
    )
    .await
    .unwrap();

    planner::end_day(&repo, uid, date, at(2025, 9, 3, 16, 0))
        .await
        .unwrap();

    let overview = planner::get_day(&repo, uid, date).await.unwrap().unwrap();
    assert!(!overview.session.is_active());
    assert_eq!(overview.slots.len(), 2);

    let summary = analytics::analytics_summary(&repo, uid, date).await.unwrap();
    assert_eq!(summary.days_tracked, 1);
    assert!((summary.total_hours - 8.0).abs() < 1e-9);
    assert_eq!(summary.average_condition, Some(5.5));
    assert_eq!(summary.top_activities[0].activity, "writing");
    assert_eq!(summary.top_activities[0].count, 2);
}

#[tokio::test]
async fn analytics_window_excludes_old_days() {
    let repo = LocalRepository::new();
    let uid = user();
    let today = NaiveDate::from_ymd_opt(2025, 9, 3).unwrap();
    let old_date = today - Duration::days(45);

    // A session well outside the 30-day window.
    let old_start = DateTime::<Utc>::from_naive_utc_and_offset(
        old_date.and_hms_opt(8, 0, 0).unwrap(),
        Utc,
    );
    planner::start_day(&repo, uid, old_date, old_start)
        .await
        .unwrap();

    // And one inside it.
    planner::start_day(&repo, uid, today, at(2025, 9, 3, 8, 0))
        .await
        .unwrap();

    let summary = analytics::analytics_summary(&repo, uid, today).await.unwrap();
    assert_eq!(summary.days_tracked, 1);
}

#[tokio::test]
async fn csv_export_covers_sessions_without_slots() {
    let repo = LocalRepository::new();
    let uid = user();
    let date = NaiveDate::from_ymd_opt(2025, 9, 3).unwrap();

    planner::start_day(&repo, uid, date, at(2025, 9, 3, 8, 0))
        .await
        .unwrap();

    let csv = analytics::export_csv(&repo, uid, date).await.unwrap();
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines[0], "date,start,end,slot_time,activity,condition");
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("2025-09-03,"));
}
