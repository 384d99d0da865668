//! Session repository trait for daily-session operations.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::error::RepositoryResult;
use crate::api::{DailySession, SessionId, UserId};

/// Repository trait for daily sessions.
///
/// A session identifies one user's working day; at most one exists per
/// (user, date) and implementations must enforce that uniqueness on upsert.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert or replace the session for its (user, date) pair.
    ///
    /// Returns the stored session (the id of a pre-existing row is kept).
    async fn upsert_session(&self, session: &DailySession) -> RepositoryResult<DailySession>;

    /// Fetch the session for a user on a given date, if any.
    async fn find_session(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> RepositoryResult<Option<DailySession>>;

    /// Fetch a session by primary key.
    async fn find_session_by_id(&self, id: SessionId) -> RepositoryResult<Option<DailySession>>;

    /// Sessions on `date` with a start time and no end time — the set of
    /// users currently eligible for server-side reminders.
    async fn list_active_sessions(&self, date: NaiveDate) -> RepositoryResult<Vec<DailySession>>;

    /// A user's sessions with `from <= date <= to`, ascending by date.
    async fn list_sessions_in_range(
        &self,
        user_id: UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<DailySession>>;
}
