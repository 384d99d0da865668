//! Data Transfer Objects for the HTTP API.
//!
//! Request bodies use camelCase field names, matching the JSON the web
//! client produces. Domain types that are already serializable are
//! re-exported instead of duplicated.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// Re-export domain types that serve directly as response bodies.
pub use crate::api::{
    ActivityCount, AnalyticsSummary, DailyCondition, DailySession, TimeSlot, WebPushSubscription,
};
pub use crate::push::DispatchOutcome;
pub use crate::services::DayOverview;

use crate::api::{ConditionScore, SessionId, UserId};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

/// Request body for starting or ending a day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRequest {
    pub user_id: UserId,
    /// Defaults to the server's current local date.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Request body for saving one time slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSlotRequest {
    pub session_id: SessionId,
    pub slot_time: DateTime<Utc>,
    #[serde(default)]
    pub activity: Option<String>,
    #[serde(default)]
    pub condition_score: Option<ConditionScore>,
}

/// Request body for deleting one time slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSlotRequest {
    pub session_id: SessionId,
    pub slot_time: DateTime<Utc>,
}

/// Request body for registering a push subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    pub user_id: UserId,
    pub subscription: WebPushSubscription,
}

/// Request body for removing a push subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsubscribeRequest {
    pub user_id: UserId,
}

/// Request body for sending a test notification to one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendPushRequest {
    pub user_id: UserId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

/// Minimal acknowledgement, mirroring the worker's `{success}` acks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    pub success: bool,
}

/// VAPID public key response; `None` when push is not configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyResponse {
    pub public_key: Option<String>,
}

/// Query parameters for the cron dispatch endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DispatchQuery {
    /// Override the configured dispatch mode ("active-only" or "broadcast").
    #[serde(default)]
    pub mode: Option<String>,
}

/// Body of the cron dispatch response: `{success, sent, failed, time}` when
/// deliveries were attempted, `success: false` with the reason on a skip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResponse {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: DispatchOutcome,
}

impl From<DispatchOutcome> for DispatchResponse {
    fn from(outcome: DispatchOutcome) -> Self {
        Self {
            success: matches!(outcome, DispatchOutcome::Sent { .. }),
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::SkipReason;
    use chrono::TimeZone;

    #[test]
    fn test_dispatch_response_carries_success_flag() {
        let time = Utc.with_ymd_and_hms(2025, 9, 3, 10, 0, 0).unwrap();

        let sent: DispatchResponse = DispatchOutcome::Sent {
            sent: 2,
            failed: 1,
            time,
        }
        .into();
        let json = serde_json::to_value(&sent).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["sent"], 2);
        assert_eq!(json["failed"], 1);
        assert!(json["time"].is_string());

        let skipped: DispatchResponse = DispatchOutcome::Skipped {
            reason: SkipReason::QuietHours,
            time,
        }
        .into();
        let json = serde_json::to_value(&skipped).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["reason"], "quiet-hours");
    }
}
