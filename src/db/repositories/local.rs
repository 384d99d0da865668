//! In-memory repository implementation.
//!
//! Backs unit tests and local development. State lives in plain maps behind
//! `parking_lot` locks; guards are never held across an await point.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;

use crate::api::{DailySession, SessionId, SubscriptionRecord, TimeSlot, UserId};
use crate::db::repository::{
    FullRepository, RepositoryResult, SessionRepository, SlotRepository, SubscriptionRepository,
};

/// In-memory repository for unit testing and local development.
#[derive(Default)]
pub struct LocalRepository {
    sessions: RwLock<HashMap<SessionId, DailySession>>,
    slots: RwLock<HashMap<(SessionId, DateTime<Utc>), TimeSlot>>,
    subscriptions: RwLock<HashMap<UserId, SubscriptionRecord>>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for LocalRepository {
    async fn upsert_session(&self, session: &DailySession) -> RepositoryResult<DailySession> {
        let mut sessions = self.sessions.write();

        // One session per (user, date): a pre-existing row keeps its id.
        let existing_id = sessions
            .values()
            .find(|s| s.user_id == session.user_id && s.date == session.date)
            .map(|s| s.id);

        let stored = DailySession {
            id: existing_id.unwrap_or(session.id),
            ..session.clone()
        };
        sessions.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_session(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> RepositoryResult<Option<DailySession>> {
        Ok(self
            .sessions
            .read()
            .values()
            .find(|s| s.user_id == user_id && s.date == date)
            .cloned())
    }

    async fn find_session_by_id(&self, id: SessionId) -> RepositoryResult<Option<DailySession>> {
        Ok(self.sessions.read().get(&id).cloned())
    }

    async fn list_active_sessions(&self, date: NaiveDate) -> RepositoryResult<Vec<DailySession>> {
        Ok(self
            .sessions
            .read()
            .values()
            .filter(|s| s.date == date && s.is_active())
            .cloned()
            .collect())
    }

    async fn list_sessions_in_range(
        &self,
        user_id: UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<DailySession>> {
        let mut sessions: Vec<_> = self
            .sessions
            .read()
            .values()
            .filter(|s| s.user_id == user_id && s.date >= from && s.date <= to)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.date);
        Ok(sessions)
    }
}

#[async_trait]
impl SlotRepository for LocalRepository {
    async fn upsert_slot(&self, slot: &TimeSlot) -> RepositoryResult<TimeSlot> {
        self.slots
            .write()
            .insert((slot.session_id, slot.slot_time), slot.clone());
        Ok(slot.clone())
    }

    async fn delete_slot(
        &self,
        session_id: SessionId,
        slot_time: DateTime<Utc>,
    ) -> RepositoryResult<bool> {
        Ok(self.slots.write().remove(&(session_id, slot_time)).is_some())
    }

    async fn list_slots(&self, session_id: SessionId) -> RepositoryResult<Vec<TimeSlot>> {
        let mut slots: Vec<_> = self
            .slots
            .read()
            .values()
            .filter(|s| s.session_id == session_id)
            .cloned()
            .collect();
        slots.sort_by_key(|s| s.slot_time);
        Ok(slots)
    }

    async fn list_slots_for_user_since(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> RepositoryResult<Vec<TimeSlot>> {
        let mut slots: Vec<_> = self
            .slots
            .read()
            .values()
            .filter(|s| s.user_id == user_id && s.slot_time >= since)
            .cloned()
            .collect();
        slots.sort_by_key(|s| s.slot_time);
        Ok(slots)
    }
}

#[async_trait]
impl SubscriptionRepository for LocalRepository {
    async fn upsert_subscription(&self, record: &SubscriptionRecord) -> RepositoryResult<()> {
        self.subscriptions
            .write()
            .insert(record.user_id, record.clone());
        Ok(())
    }

    async fn delete_subscription(&self, user_id: UserId) -> RepositoryResult<bool> {
        Ok(self.subscriptions.write().remove(&user_id).is_some())
    }

    async fn find_subscription(
        &self,
        user_id: UserId,
    ) -> RepositoryResult<Option<SubscriptionRecord>> {
        Ok(self.subscriptions.read().get(&user_id).cloned())
    }

    async fn find_subscriptions_for_users(
        &self,
        user_ids: &[UserId],
    ) -> RepositoryResult<Vec<SubscriptionRecord>> {
        let subscriptions = self.subscriptions.read();
        Ok(user_ids
            .iter()
            .filter_map(|id| subscriptions.get(id).cloned())
            .collect())
    }

    async fn list_subscriptions(&self) -> RepositoryResult<Vec<SubscriptionRecord>> {
        Ok(self.subscriptions.read().values().cloned().collect())
    }
}

#[async_trait]
impl FullRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }
}
