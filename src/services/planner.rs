//! Daily session and time slot operations.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::{
    is_grid_aligned, ConditionScore, DailySession, SessionId, TimeSlot, UserId,
};
use crate::db::repository::{ErrorContext, FullRepository, RepositoryError, RepositoryResult};

/// A session together with its recorded slots, as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayOverview {
    pub session: DailySession,
    pub slots: Vec<TimeSlot>,
}

/// Start (or restart) the user's session for `date`.
///
/// If a session already exists for that day its start is moved to `now`
/// and any previous end is cleared, so a user who ended their day early
/// can pick it back up. Otherwise a fresh session is created.
pub async fn start_day(
    repo: &dyn FullRepository,
    user_id: UserId,
    date: NaiveDate,
    now: DateTime<Utc>,
) -> RepositoryResult<DailySession> {
    let session = match repo.find_session(user_id, date).await? {
        Some(mut existing) => {
            existing.start_time = Some(now);
            existing.end_time = None;
            existing
        }
        None => DailySession {
            id: SessionId::random(),
            user_id,
            date,
            start_time: Some(now),
            end_time: None,
        },
    };

    let stored = repo.upsert_session(&session).await?;
    info!(user_id = %user_id, date = %date, "day started");
    Ok(stored)
}

/// End the user's session for `date`.
///
/// Fails with a not-found error if no session exists, and with a
/// validation error if the session was never started.
pub async fn end_day(
    repo: &dyn FullRepository,
    user_id: UserId,
    date: NaiveDate,
    now: DateTime<Utc>,
) -> RepositoryResult<DailySession> {
    let mut session = repo.find_session(user_id, date).await?.ok_or_else(|| {
        RepositoryError::not_found_with_context(
            format!("No session for user {} on {}", user_id, date),
            ErrorContext::new("end_day")
                .with_entity("daily_session")
                .with_entity_id(user_id),
        )
    })?;

    if session.start_time.is_none() {
        return Err(RepositoryError::validation_with_context(
            "Cannot end a day that was never started",
            ErrorContext::new("end_day")
                .with_entity("daily_session")
                .with_entity_id(session.id),
        ));
    }

    session.end_time = Some(now);
    let stored = repo.upsert_session(&session).await?;
    info!(user_id = %user_id, date = %date, "day ended");
    Ok(stored)
}

/// Fetch the user's session for `date` with its slots, if one exists.
pub async fn get_day(
    repo: &dyn FullRepository,
    user_id: UserId,
    date: NaiveDate,
) -> RepositoryResult<Option<DayOverview>> {
    let session = match repo.find_session(user_id, date).await? {
        Some(s) => s,
        None => return Ok(None),
    };

    let slots = repo.list_slots(session.id).await?;
    Ok(Some(DayOverview { session, slots }))
}

/// Save (insert or overwrite) the slot at `slot_time` for a session.
///
/// The slot time must sit exactly on the 15-minute grid and the session
/// must exist; the slot inherits the session's user.
pub async fn save_slot(
    repo: &dyn FullRepository,
    session_id: SessionId,
    slot_time: DateTime<Utc>,
    activity: Option<String>,
    condition_score: Option<ConditionScore>,
) -> RepositoryResult<TimeSlot> {
    if !is_grid_aligned(slot_time) {
        return Err(RepositoryError::validation_with_context(
            format!("Slot time {} is not aligned to the 15-minute grid", slot_time),
            ErrorContext::new("save_slot")
                .with_entity("time_slot")
                .with_entity_id(session_id),
        ));
    }

    let session = repo.find_session_by_id(session_id).await?.ok_or_else(|| {
        RepositoryError::not_found_with_context(
            format!("Session {} not found", session_id),
            ErrorContext::new("save_slot")
                .with_entity("daily_session")
                .with_entity_id(session_id),
        )
    })?;

    let slot = TimeSlot {
        user_id: session.user_id,
        session_id,
        slot_time,
        activity,
        condition_score,
    };

    repo.upsert_slot(&slot).await
}

/// Delete the slot at `slot_time`. Returns false if no such slot existed.
pub async fn delete_slot(
    repo: &dyn FullRepository,
    session_id: SessionId,
    slot_time: DateTime<Utc>,
) -> RepositoryResult<bool> {
    repo.delete_slot(session_id, slot_time).await
}

/// List all slots of a session, ordered by slot time.
pub async fn list_slots(
    repo: &dyn FullRepository,
    session_id: SessionId,
) -> RepositoryResult<Vec<TimeSlot>> {
    repo.list_slots(session_id).await
}
