//! Public API surface for the planner backend.
//!
//! This file consolidates the domain types shared between the repository
//! layer, the services, and the HTTP API. All types derive
//! Serialize/Deserialize for JSON serialization.

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User identifier (opaque, issued by the auth provider).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

/// Daily session identifier (database primary key).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl UserId {
    pub fn new(value: Uuid) -> Self {
        UserId(value)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl SessionId {
    pub fn new(value: Uuid) -> Self {
        SessionId(value)
    }

    /// Generate a fresh random session id.
    pub fn random() -> Self {
        SessionId(Uuid::new_v4())
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(UserId(Uuid::parse_str(s)?))
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(SessionId(Uuid::parse_str(s)?))
    }
}

/// Error returned when a condition score falls outside the valid 1–7 range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("condition score {0} is outside the valid range 1..=7")]
pub struct ScoreOutOfRange(pub u8);

/// Subjective condition score, constrained to 1..=7.
///
/// Serializes as a plain integer; deserialization rejects out-of-range
/// values so an invalid score can never enter the system through JSON.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ConditionScore(u8);

impl ConditionScore {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 7;

    /// Create a score, rejecting values outside 1..=7.
    pub fn new(value: u8) -> Result<Self, ScoreOutOfRange> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(ConditionScore(value))
        } else {
            Err(ScoreOutOfRange(value))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for ConditionScore {
    type Error = ScoreOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        ConditionScore::new(value)
    }
}

impl From<ConditionScore> for u8 {
    fn from(score: ConditionScore) -> Self {
        score.0
    }
}

impl std::fmt::Display for ConditionScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user's single working day, bounded by a start and optional end timestamp.
///
/// At most one session exists per (user, date). A session is "active" when its
/// start is set and its end is not; active sessions gate server-side reminder
/// dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySession {
    pub id: SessionId,
    pub user_id: UserId,
    pub date: NaiveDate,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl DailySession {
    /// Whether this session currently gates reminder delivery.
    pub fn is_active(&self) -> bool {
        self.start_time.is_some() && self.end_time.is_none()
    }
}

/// One 15-minute interval's entry: free-text activity plus condition score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub user_id: UserId,
    pub session_id: SessionId,
    /// Start of the interval, aligned to the 15-minute grid.
    pub slot_time: DateTime<Utc>,
    pub activity: Option<String>,
    pub condition_score: Option<ConditionScore>,
}

/// Returns true when a timestamp sits exactly on the 15-minute grid.
pub fn is_grid_aligned(at: DateTime<Utc>) -> bool {
    at.minute() % 15 == 0 && at.second() == 0 && at.nanosecond() == 0
}

/// Encryption keys of a browser-issued push subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// Opaque browser-issued push subscription: an addressable endpoint plus the
/// keys needed to encrypt payloads for it. Matches `PushSubscription.toJSON()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebPushSubscription {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

/// A stored subscription, keyed by user (one per user, last write wins).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub user_id: UserId,
    pub subscription: WebPushSubscription,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Analytics DTOs
// =============================================================================

/// One activity with its occurrence count over the analytics window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityCount {
    pub activity: String,
    pub count: usize,
}

/// Average condition for a single day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCondition {
    pub date: NaiveDate,
    pub average_score: f64,
    pub slot_count: usize,
}

/// Aggregated statistics over the trailing 30-day window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    /// Number of days with a started session in the window.
    pub days_tracked: usize,
    /// Total hours between session start and end, summed over the window.
    pub total_hours: f64,
    /// Mean condition score across all scored slots, if any.
    pub average_condition: Option<f64>,
    /// Most frequent activities, descending by count.
    pub top_activities: Vec<ActivityCount>,
    /// Per-day condition averages, ascending by date.
    pub daily_condition: Vec<DailyCondition>,
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod api_tests;
