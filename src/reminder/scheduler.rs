//! Client-side reminder channels.
//!
//! Both the foreground page timer and the background worker timer boil down
//! to the same loop: sleep until the next 15-minute boundary, show a local
//! notification, reschedule. [`ReminderScheduler`] owns that loop as a single
//! cancellable task handle; the two channels are two instances distinguished
//! by [`ChannelKind`], not two code paths. The channels do not coordinate
//! with each other or with server dispatch — duplicate reminders across
//! simultaneously active channels are accepted behavior.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, Timelike};
use tokio::{sync::Mutex, task::JoinHandle, time};
use tracing::{debug, warn};

use super::decision::{decide_at, next_boundary, Decision};
use super::NotificationContent;

/// Source of the current local time.
///
/// The firing loop reads time exclusively through this seam so tests can pin
/// the clock and drive the loop under paused tokio time.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Local>;
}

/// The real wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Error surfaced by a notification backend.
///
/// Permission denial and missing platform support are reported synchronously
/// to the caller; the scheduler never retries a failed display.
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("notification permission not granted")]
    PermissionDenied,
    #[error("notifications are not supported in this environment")]
    Unsupported,
    #[error("failed to display notification: {0}")]
    Display(String),
}

/// Platform seam for displaying a local notification.
///
/// Implementations wrap whatever immediate-display API the embedding
/// environment offers. The click-through URL in the content is the
/// embedder's to honor (focus an open page, or open a new one at the root).
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn notify(&self, content: &NotificationContent) -> Result<(), NotifierError>;
}

/// Which delivery channel a scheduler instance represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// In-page timer; runs only while the application is foregrounded.
    Foreground,
    /// Page-independent worker timer; best-effort while backgrounded.
    /// Its notifications require explicit interaction to dismiss.
    BackgroundWorker,
}

impl ChannelKind {
    fn require_interaction(&self) -> bool {
        matches!(self, ChannelKind::BackgroundWorker)
    }
}

/// Scoped controller for one reminder channel.
///
/// Owns at most one pending scheduled task at a time. `start` while already
/// running is a no-op; `stop` aborts the pending wait deterministically so no
/// stale notification fires after a session ends or reminders are disabled.
pub struct ReminderScheduler {
    kind: ChannelKind,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ReminderScheduler {
    pub fn new(kind: ChannelKind, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_clock(kind, notifier, Arc::new(SystemClock))
    }

    /// Build a scheduler reading time from the given clock. Production code
    /// uses [`ReminderScheduler::new`], which reads the system clock.
    pub fn with_clock(
        kind: ChannelKind,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            kind,
            notifier,
            clock,
            handle: Mutex::new(None),
        }
    }

    /// Start the schedule loop. Returns `false` (no-op) if already running.
    pub async fn start(&self) -> bool {
        let mut guard = self.handle.lock().await;
        if guard.as_ref().is_some_and(|h| !h.is_finished()) {
            return false;
        }

        let kind = self.kind;
        let notifier = Arc::clone(&self.notifier);
        let clock = Arc::clone(&self.clock);
        let handle = tokio::spawn(async move {
            let mut target = next_boundary(&clock.now());
            loop {
                let now = clock.now();
                if target <= now {
                    // A long suspension skips missed boundaries instead of
                    // replaying them in a burst.
                    target = next_boundary(&now);
                }
                let delay = (target - now).to_std().unwrap_or(Duration::ZERO);
                debug!(?kind, delay_secs = delay.as_secs(), "reminder sleeping until next boundary");
                time::sleep(delay).await;

                // The decision and the displayed HH:MM both use the boundary
                // the sleep targeted, so a wake delayed past the minute still
                // delivers that boundary's reminder with its own time.
                match decide_at(&target) {
                    Decision::Fire => {
                        let content = NotificationContent::reminder(target.hour(), target.minute())
                            .with_require_interaction(kind.require_interaction());
                        if let Err(e) = notifier.notify(&content).await {
                            warn!(?kind, error = %e, "reminder notification failed");
                        }
                    }
                    Decision::Suppress(reason) => {
                        debug!(?kind, %reason, "reminder suppressed");
                    }
                }
                target = next_boundary(&target);
            }
        });

        *guard = Some(handle);
        true
    }

    /// Cancel the pending wait, if any. Returns `true` if a task was stopped.
    pub async fn stop(&self) -> bool {
        match self.handle.lock().await.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub async fn is_running(&self) -> bool {
        self.handle
            .lock()
            .await
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Show one notification immediately, bypassing grid and quiet-hour
    /// gating. Used for user-facing "test notification" actions.
    pub async fn send_test(&self) -> Result<(), NotifierError> {
        let now = self.clock.now();
        let content = NotificationContent::reminder(now.hour(), now.minute())
            .with_require_interaction(self.kind.require_interaction());
        self.notifier.notify(&content).await
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        // A controller going away must not leave a timer behind.
        if let Some(handle) = self.handle.get_mut().take() {
            handle.abort();
        }
    }
}

/// Control messages accepted by the background worker channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "type")]
pub enum WorkerMessage {
    StartNotifications,
    StopNotifications,
    TestNotification,
}

/// Acknowledgement posted back for each handled worker message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WorkerAck {
    pub success: bool,
}

/// Message-driven wrapper around the background worker scheduler.
pub struct WorkerChannel {
    scheduler: ReminderScheduler,
}

impl WorkerChannel {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            scheduler: ReminderScheduler::new(ChannelKind::BackgroundWorker, notifier),
        }
    }

    /// Handle one control message. Test notifications report display
    /// failures in the acknowledgement; start/stop always succeed.
    pub async fn handle(&self, message: WorkerMessage) -> WorkerAck {
        match message {
            WorkerMessage::StartNotifications => {
                self.scheduler.start().await;
                WorkerAck { success: true }
            }
            WorkerMessage::StopNotifications => {
                self.scheduler.stop().await;
                WorkerAck { success: true }
            }
            WorkerMessage::TestNotification => match self.scheduler.send_test().await {
                Ok(()) => WorkerAck { success: true },
                Err(e) => {
                    warn!(error = %e, "worker test notification failed");
                    WorkerAck { success: false }
                }
            },
        }
    }

    pub fn scheduler(&self) -> &ReminderScheduler {
        &self.scheduler
    }
}
