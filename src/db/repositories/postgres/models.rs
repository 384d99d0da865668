//! Diesel row types and conversions to/from domain types.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{daily_sessions, push_subscriptions, time_slots};
use crate::api::{
    ConditionScore, DailySession, SessionId, SubscriptionRecord, TimeSlot, UserId,
    WebPushSubscription,
};
use crate::db::repository::{ErrorContext, RepositoryError};

#[derive(Debug, Clone, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = daily_sessions)]
pub struct SessionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl From<&DailySession> for SessionRow {
    fn from(session: &DailySession) -> Self {
        Self {
            id: session.id.value(),
            user_id: session.user_id.value(),
            date: session.date,
            start_time: session.start_time,
            end_time: session.end_time,
        }
    }
}

impl From<SessionRow> for DailySession {
    fn from(row: SessionRow) -> Self {
        Self {
            id: SessionId::new(row.id),
            user_id: UserId::new(row.user_id),
            date: row.date,
            start_time: row.start_time,
            end_time: row.end_time,
        }
    }
}

#[derive(Debug, Clone, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = time_slots)]
pub struct SlotRow {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub slot_time: DateTime<Utc>,
    pub activity: Option<String>,
    pub condition_score: Option<i16>,
}

impl From<&TimeSlot> for SlotRow {
    fn from(slot: &TimeSlot) -> Self {
        Self {
            session_id: slot.session_id.value(),
            user_id: slot.user_id.value(),
            slot_time: slot.slot_time,
            activity: slot.activity.clone(),
            condition_score: slot.condition_score.map(|s| s.value() as i16),
        }
    }
}

impl TryFrom<SlotRow> for TimeSlot {
    type Error = RepositoryError;

    fn try_from(row: SlotRow) -> Result<Self, Self::Error> {
        // The CHECK constraint keeps stored scores in range; a violation here
        // means the row was written outside this application.
        let condition_score = row
            .condition_score
            .map(|v| ConditionScore::new(v.clamp(0, 255) as u8))
            .transpose()?;

        Ok(Self {
            session_id: SessionId::new(row.session_id),
            user_id: UserId::new(row.user_id),
            slot_time: row.slot_time,
            activity: row.activity,
            condition_score,
        })
    }
}

#[derive(Debug, Clone, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = push_subscriptions)]
pub struct SubscriptionRow {
    pub user_id: Uuid,
    pub subscription: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<&SubscriptionRecord> for SubscriptionRow {
    type Error = RepositoryError;

    fn try_from(record: &SubscriptionRecord) -> Result<Self, Self::Error> {
        let subscription = serde_json::to_value(&record.subscription).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("subscription serialization: {}", e),
                ErrorContext::new("upsert_subscription").with_entity("subscription"),
            )
        })?;

        Ok(Self {
            user_id: record.user_id.value(),
            subscription,
            updated_at: record.updated_at,
        })
    }
}

impl TryFrom<SubscriptionRow> for SubscriptionRecord {
    type Error = RepositoryError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let subscription: WebPushSubscription = serde_json::from_value(row.subscription)
            .map_err(|e| {
                RepositoryError::internal_with_context(
                    format!("subscription deserialization: {}", e),
                    ErrorContext::new("load_subscription")
                        .with_entity("subscription")
                        .with_entity_id(row.user_id),
                )
            })?;

        Ok(Self {
            user_id: UserId::new(row.user_id),
            subscription,
            updated_at: row.updated_at,
        })
    }
}
