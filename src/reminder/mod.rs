//! Reminder core: when to fire, and the client-side channels that fire.
//!
//! The decision of *whether* a reminder should fire right now is a pure
//! function over wall-clock time ([`decision`]). The two client channels
//! (foreground page timer and background worker timer) are both modeled by
//! [`scheduler::ReminderScheduler`], a scoped controller owning a single
//! cancellable task. Server-side dispatch lives in [`crate::push`] and
//! re-evaluates the same decision defensively on entry.

pub mod decision;
pub mod scheduler;

pub use decision::{decide, decide_at, delay_until_next_boundary, Decision, SuppressReason};
pub use scheduler::{
    ChannelKind, Clock, Notifier, NotifierError, ReminderScheduler, SystemClock, WorkerAck,
    WorkerChannel, WorkerMessage,
};

use serde::{Deserialize, Serialize};

/// Icon path baked into every reminder (presentation constant).
pub const REMINDER_ICON: &str = "/icon-192x192.png";

/// Contents of a single user-visible reminder notification.
///
/// Shared between the local channels (shown via a platform `Notifier`) and
/// the server dispatch path (serialized as the encrypted push payload).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    /// Uniqueness tag; a per-firing tag keeps platforms from collapsing
    /// consecutive reminders.
    pub tag: String,
    /// Click-through URL back into the application.
    pub url: String,
    /// Ask the platform to keep the notification until the user dismisses it.
    /// Set by the background worker channel so backgrounded users notice it.
    #[serde(default)]
    pub require_interaction: bool,
}

impl NotificationContent {
    /// The standard 15-minute check-in reminder for the given local time.
    pub fn reminder(hour: u32, minute: u32) -> Self {
        Self {
            title: "⏰ 15-minute planner".to_string(),
            body: format!("{:02}:{:02} - What are you doing right now?", hour, minute),
            icon: REMINDER_ICON.to_string(),
            badge: REMINDER_ICON.to_string(),
            tag: format!("time-{:02}{:02}", hour, minute),
            url: "/".to_string(),
            require_interaction: false,
        }
    }

    /// A one-off test notification, optionally overriding title and body.
    pub fn test(title: Option<String>, body: Option<String>) -> Self {
        Self {
            title: title.unwrap_or_else(|| "Test notification 🔔".to_string()),
            body: body.unwrap_or_else(|| "Push notifications are working!".to_string()),
            icon: REMINDER_ICON.to_string(),
            badge: REMINDER_ICON.to_string(),
            tag: "test-notification".to_string(),
            url: "/".to_string(),
            require_interaction: false,
        }
    }

    pub fn with_require_interaction(mut self, value: bool) -> Self {
        self.require_interaction = value;
        self
    }
}
