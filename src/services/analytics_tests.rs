use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use crate::api::{ConditionScore, DailySession, SessionId, TimeSlot, UserId};
use crate::db::repositories::LocalRepository;
use crate::services::analytics::{analytics_summary, export_csv, render_csv, summarize};
use crate::services::planner::{end_day, save_slot, start_day};

fn user() -> UserId {
    UserId::new(Uuid::new_v4())
}

fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, day, hour, minute, 0).unwrap()
}

fn session(uid: UserId, day: u32, start: Option<(u32, u32)>, end: Option<(u32, u32)>) -> DailySession {
    DailySession {
        id: SessionId::random(),
        user_id: uid,
        date: NaiveDate::from_ymd_opt(2025, 9, day).unwrap(),
        start_time: start.map(|(h, m)| at(day, h, m)),
        end_time: end.map(|(h, m)| at(day, h, m)),
    }
}

fn slot(
    s: &DailySession,
    day: u32,
    hour: u32,
    minute: u32,
    activity: &str,
    score: Option<u8>,
) -> TimeSlot {
    TimeSlot {
        user_id: s.user_id,
        session_id: s.id,
        slot_time: at(day, hour, minute),
        activity: Some(activity.to_string()),
        condition_score: score.map(|v| ConditionScore::new(v).unwrap()),
    }
}

#[test]
fn summarize_empty_window() {
    let summary = summarize(&[], &[]);

    assert_eq!(summary.days_tracked, 0);
    assert_eq!(summary.total_hours, 0.0);
    assert!(summary.average_condition.is_none());
    assert!(summary.top_activities.is_empty());
    assert!(summary.daily_condition.is_empty());
}

#[test]
fn summarize_counts_started_days_and_hours() {
    let uid = user();
    let sessions = vec![
        session(uid, 1, Some((8, 0)), Some((16, 0))), // 8h
        session(uid, 2, Some((9, 0)), None),          // started, no end
        session(uid, 3, None, None),                  // never started
    ];

    let summary = summarize(&sessions, &[]);

    assert_eq!(summary.days_tracked, 2);
    assert!((summary.total_hours - 8.0).abs() < 1e-9);
}

#[test]
fn summarize_ranks_activities_by_count() {
    let uid = user();
    let s = session(uid, 1, Some((8, 0)), None);
    let slots = vec![
        slot(&s, 1, 9, 0, "writing", None),
        slot(&s, 1, 9, 15, "writing", None),
        slot(&s, 1, 9, 30, "email", None),
    ];

    let summary = summarize(&[s], &slots);

    assert_eq!(summary.top_activities.len(), 2);
    assert_eq!(summary.top_activities[0].activity, "writing");
    assert_eq!(summary.top_activities[0].count, 2);
    assert_eq!(summary.top_activities[1].activity, "email");
}

#[test]
fn summarize_averages_condition_per_day() {
    let uid = user();
    let s1 = session(uid, 1, Some((8, 0)), None);
    let s2 = session(uid, 2, Some((8, 0)), None);
    let slots = vec![
        slot(&s1, 1, 9, 0, "a", Some(4)),
        slot(&s1, 1, 9, 15, "b", Some(6)),
        slot(&s2, 2, 10, 0, "c", Some(7)),
    ];

    let summary = summarize(&[s1, s2], &slots);

    assert_eq!(summary.average_condition, Some(17.0 / 3.0));
    assert_eq!(summary.daily_condition.len(), 2);
    assert_eq!(summary.daily_condition[0].average_score, 5.0);
    assert_eq!(summary.daily_condition[0].slot_count, 2);
    assert_eq!(summary.daily_condition[1].average_score, 7.0);
}

#[test]
fn unscored_slots_count_activities_but_not_condition() {
    let uid = user();
    let s = session(uid, 1, Some((8, 0)), None);
    let slots = vec![slot(&s, 1, 9, 0, "reading", None)];

    let summary = summarize(&[s], &slots);

    assert!(summary.average_condition.is_none());
    assert!(summary.daily_condition.is_empty());
    assert_eq!(summary.top_activities[0].activity, "reading");
}

#[test]
fn csv_has_session_row_when_day_has_no_slots() {
    let uid = user();
    let s = session(uid, 1, Some((8, 0)), Some((16, 0)));

    let csv = render_csv(&[s.clone()], &[]);
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines[0], "date,start,end,slot_time,activity,condition");
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("2025-09-01,"));
    assert!(lines[1].ends_with(",,,"));
}

#[test]
fn csv_escapes_commas_in_activity() {
    let uid = user();
    let s = session(uid, 1, Some((8, 0)), None);
    let slots = vec![slot(&s, 1, 9, 0, "email, then calls", Some(5))];

    let csv = render_csv(&[s], &slots);

    assert!(csv.contains("\"email, then calls\""));
    assert!(csv.trim_end().ends_with(",5"));
}

#[tokio::test]
async fn summary_over_repository_window() {
    let repo = LocalRepository::new();
    let uid = user();
    let today = NaiveDate::from_ymd_opt(2025, 9, 3).unwrap();

    let s = start_day(&repo, uid, today, at(3, 8, 0)).await.unwrap();
    save_slot(
        &repo,
        s.id,
        at(3, 9, 0),
        Some("writing".to_string()),
        Some(ConditionScore::new(5).unwrap()),
    )
    .await
    .unwrap();
    end_day(&repo, uid, today, at(3, 16, 0)).await.unwrap();

    let summary = analytics_summary(&repo, uid, today).await.unwrap();

    assert_eq!(summary.days_tracked, 1);
    assert!((summary.total_hours - 8.0).abs() < 1e-9);
    assert_eq!(summary.average_condition, Some(5.0));

    let csv = export_csv(&repo, uid, today).await.unwrap();
    assert!(csv.contains("writing"));
    assert_eq!(csv.lines().count(), 2);
}
