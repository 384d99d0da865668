//! Externally triggered reminder dispatch.
//!
//! An external scheduler invokes this roughly every 15 minutes. Each
//! invocation is stateless: re-check the grid alignment and quiet hours
//! defensively, work out who to page, push to every addressed subscription
//! concurrently, and fold the per-send results into a count. "Fire all, wait
//! for all, ignore individual errors" — acceptable at the scale of a
//! single-user tool, not designed to scale further.

use chrono::{DateTime, Local, Timelike, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::sender::PushSender;
use crate::api::SubscriptionRecord;
use crate::db::repository::{FullRepository, RepositoryResult};
use crate::reminder::decision::{decide, Decision, SuppressReason};
use crate::reminder::NotificationContent;

/// Who gets paged on a dispatch tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DispatchMode {
    /// Page only users whose current-date session is started and not ended.
    /// Matches the product intent of "are you currently tracking your day".
    ActiveOnly,
    /// Page every stored subscriber unconditionally. Fallback for
    /// environments lacking reliable session data.
    Broadcast,
}

impl Default for DispatchMode {
    fn default() -> Self {
        DispatchMode::ActiveOnly
    }
}

impl std::str::FromStr for DispatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" | "active-only" | "active_only" => Ok(DispatchMode::ActiveOnly),
            "broadcast" | "all" => Ok(DispatchMode::Broadcast),
            other => Err(format!("Unknown dispatch mode: {}", other)),
        }
    }
}

/// Why a dispatch tick sent nothing at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// VAPID keys are missing; push is disabled.
    NotConfigured,
    /// The trigger arrived off the 15-minute grid.
    NotGridAligned,
    /// Inside the 23:00–06:00 quiet window.
    QuietHours,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NotConfigured => write!(f, "not-configured"),
            SkipReason::NotGridAligned => write!(f, "not-grid-aligned"),
            SkipReason::QuietHours => write!(f, "quiet-hours"),
        }
    }
}

/// Result of one dispatch invocation.
///
/// Per-send failures never fail the whole invocation; they are counted in
/// `failed`. Only a repository error surfaces as an `Err` to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum DispatchOutcome {
    Sent {
        sent: usize,
        failed: usize,
        time: DateTime<Utc>,
    },
    Skipped {
        reason: SkipReason,
        time: DateTime<Utc>,
    },
}

impl DispatchOutcome {
    pub fn sent_count(&self) -> usize {
        match self {
            DispatchOutcome::Sent { sent, .. } => *sent,
            DispatchOutcome::Skipped { .. } => 0,
        }
    }
}

/// Run one dispatch tick.
///
/// `now` is the trigger's wall-clock moment in the server's local timezone;
/// it is injected rather than read inside so the gating is testable.
pub async fn run_dispatch(
    repo: &dyn FullRepository,
    sender: &dyn PushSender,
    mode: DispatchMode,
    now: DateTime<Local>,
) -> RepositoryResult<DispatchOutcome> {
    let time = now.with_timezone(&Utc);

    // The external trigger already aims for the grid; re-check defensively.
    match decide(now.hour(), now.minute()) {
        Decision::Suppress(SuppressReason::NotGridAligned) => {
            return Ok(DispatchOutcome::Skipped {
                reason: SkipReason::NotGridAligned,
                time,
            });
        }
        Decision::Suppress(SuppressReason::QuietHours) => {
            return Ok(DispatchOutcome::Skipped {
                reason: SkipReason::QuietHours,
                time,
            });
        }
        Decision::Fire => {}
    }

    let subscriptions = addressed_subscriptions(repo, mode, now).await?;
    if subscriptions.is_empty() {
        info!(?mode, "dispatch tick: nobody to page");
        return Ok(DispatchOutcome::Sent {
            sent: 0,
            failed: 0,
            time,
        });
    }

    let content = NotificationContent::reminder(now.hour(), now.minute());

    let results = join_all(subscriptions.iter().map(|record| {
        let content = &content;
        async move { sender.send(&record.subscription, content).await }
    }))
    .await;

    let mut sent = 0;
    let mut failed = 0;
    for (record, result) in subscriptions.iter().zip(results) {
        match result {
            Ok(()) => sent += 1,
            Err(e) => {
                failed += 1;
                warn!(user_id = %record.user_id, error = %e, "push delivery failed");
            }
        }
    }

    info!(sent, failed, "dispatch tick complete");
    Ok(DispatchOutcome::Sent { sent, failed, time })
}

/// Resolve the set of subscriptions to page for this tick.
async fn addressed_subscriptions(
    repo: &dyn FullRepository,
    mode: DispatchMode,
    now: DateTime<Local>,
) -> RepositoryResult<Vec<SubscriptionRecord>> {
    match mode {
        DispatchMode::Broadcast => repo.list_subscriptions().await,
        DispatchMode::ActiveOnly => {
            let active = repo.list_active_sessions(now.date_naive()).await?;
            if active.is_empty() {
                return Ok(Vec::new());
            }
            let users: Vec<_> = active.iter().map(|s| s.user_id).collect();
            // Inactive users are never paged, even if subscribed.
            repo.find_subscriptions_for_users(&users).await
        }
    }
}
