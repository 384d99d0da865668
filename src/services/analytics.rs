//! Trailing-window analytics over sessions and slots.
//!
//! All aggregation happens over the last [`ANALYTICS_WINDOW_DAYS`] days
//! including `today`. Sessions without a start are ignored; slots without
//! a score contribute to activity counts but not to condition averages.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::api::{ActivityCount, AnalyticsSummary, DailyCondition, DailySession, TimeSlot, UserId};
use crate::db::repository::{FullRepository, RepositoryResult};

/// Size of the analytics window, in days (today inclusive).
pub const ANALYTICS_WINDOW_DAYS: i64 = 30;

/// How many of the most frequent activities the summary reports.
const TOP_ACTIVITIES: usize = 5;

fn window_start(today: NaiveDate) -> NaiveDate {
    today - Duration::days(ANALYTICS_WINDOW_DAYS - 1)
}

/// Compute the summary statistics for a user's trailing 30-day window.
pub async fn analytics_summary(
    repo: &dyn FullRepository,
    user_id: UserId,
    today: NaiveDate,
) -> RepositoryResult<AnalyticsSummary> {
    let from = window_start(today);
    let sessions = repo.list_sessions_in_range(user_id, from, today).await?;
    let since = DateTime::<Utc>::from_naive_utc_and_offset(
        from.and_time(NaiveTime::MIN),
        Utc,
    );
    let slots = repo.list_slots_for_user_since(user_id, since).await?;

    Ok(summarize(&sessions, &slots))
}

/// Pure aggregation over already-loaded sessions and slots.
pub(crate) fn summarize(sessions: &[DailySession], slots: &[TimeSlot]) -> AnalyticsSummary {
    let days_tracked = sessions.iter().filter(|s| s.start_time.is_some()).count();

    let total_hours: f64 = sessions
        .iter()
        .filter_map(|s| match (s.start_time, s.end_time) {
            (Some(start), Some(end)) if end > start => {
                Some((end - start).num_seconds() as f64 / 3600.0)
            }
            _ => None,
        })
        .sum();

    let mut activity_counts: HashMap<&str, usize> = HashMap::new();
    for slot in slots {
        if let Some(activity) = slot.activity.as_deref() {
            let trimmed = activity.trim();
            if !trimmed.is_empty() {
                *activity_counts.entry(trimmed).or_default() += 1;
            }
        }
    }
    let mut top_activities: Vec<ActivityCount> = activity_counts
        .into_iter()
        .map(|(activity, count)| ActivityCount {
            activity: activity.to_string(),
            count,
        })
        .collect();
    // Ties break alphabetically so the ordering is deterministic.
    top_activities.sort_by(|a, b| b.count.cmp(&a.count).then(a.activity.cmp(&b.activity)));
    top_activities.truncate(TOP_ACTIVITIES);

    let scored: Vec<(NaiveDate, u8)> = slots
        .iter()
        .filter_map(|s| {
            s.condition_score
                .map(|score| (s.slot_time.date_naive(), score.value()))
        })
        .collect();

    let average_condition = if scored.is_empty() {
        None
    } else {
        Some(scored.iter().map(|(_, v)| *v as f64).sum::<f64>() / scored.len() as f64)
    };

    let mut per_day: HashMap<NaiveDate, (f64, usize)> = HashMap::new();
    for (date, value) in &scored {
        let entry = per_day.entry(*date).or_insert((0.0, 0));
        entry.0 += *value as f64;
        entry.1 += 1;
    }
    let mut daily_condition: Vec<DailyCondition> = per_day
        .into_iter()
        .map(|(date, (sum, count))| DailyCondition {
            date,
            average_score: sum / count as f64,
            slot_count: count,
        })
        .collect();
    daily_condition.sort_by_key(|d| d.date);

    AnalyticsSummary {
        days_tracked,
        total_hours,
        average_condition,
        top_activities,
        daily_condition,
    }
}

/// Export the window's raw data as CSV.
///
/// One row per slot, preceded by a session-only row for days that have a
/// session but no recorded slots. Timestamps are RFC 3339 in UTC; fields
/// that may contain commas or quotes are escaped per RFC 4180.
pub async fn export_csv(
    repo: &dyn FullRepository,
    user_id: UserId,
    today: NaiveDate,
) -> RepositoryResult<String> {
    let from = window_start(today);
    let sessions = repo.list_sessions_in_range(user_id, from, today).await?;
    let since = DateTime::<Utc>::from_naive_utc_and_offset(from.and_time(NaiveTime::MIN), Utc);
    let slots = repo.list_slots_for_user_since(user_id, since).await?;

    Ok(render_csv(&sessions, &slots))
}

pub(crate) fn render_csv(sessions: &[DailySession], slots: &[TimeSlot]) -> String {
    let mut out = String::from("date,start,end,slot_time,activity,condition\n");

    for session in sessions {
        let start = session
            .start_time
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();
        let end = session.end_time.map(|t| t.to_rfc3339()).unwrap_or_default();

        let session_slots: Vec<&TimeSlot> = slots
            .iter()
            .filter(|s| s.session_id == session.id)
            .collect();

        if session_slots.is_empty() {
            out.push_str(&format!("{},{},{},,,\n", session.date, start, end));
            continue;
        }

        for slot in session_slots {
            let activity = csv_escape(slot.activity.as_deref().unwrap_or(""));
            let condition = slot
                .condition_score
                .map(|s| s.value().to_string())
                .unwrap_or_default();
            out.push_str(&format!(
                "{},{},{},{},{},{}\n",
                session.date,
                start,
                end,
                slot.slot_time.to_rfc3339(),
                activity,
                condition
            ));
        }
    }

    out
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
