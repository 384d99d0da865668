//! Slot repository trait for 15-minute slot entries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::RepositoryResult;
use crate::api::{SessionId, TimeSlot, UserId};

/// Repository trait for time slots.
///
/// Slot timestamps are unique per session; saving an existing (session,
/// slot_time) pair replaces the previous entry. Score validation happens in
/// the domain type — a [`crate::api::TimeSlot`] can only hold a valid score —
/// so implementations persist what they are given.
#[async_trait]
pub trait SlotRepository: Send + Sync {
    /// Insert or replace the entry for (session, slot_time).
    async fn upsert_slot(&self, slot: &TimeSlot) -> RepositoryResult<TimeSlot>;

    /// Delete the entry for (session, slot_time).
    ///
    /// Returns `false` when there was nothing to delete; that is not an
    /// error.
    async fn delete_slot(
        &self,
        session_id: SessionId,
        slot_time: DateTime<Utc>,
    ) -> RepositoryResult<bool>;

    /// All slots of a session, ascending by slot time.
    async fn list_slots(&self, session_id: SessionId) -> RepositoryResult<Vec<TimeSlot>>;

    /// A user's slots with `slot_time >= since`, ascending by slot time.
    /// Used by the 30-day analytics window.
    async fn list_slots_for_user_since(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> RepositoryResult<Vec<TimeSlot>>;
}
