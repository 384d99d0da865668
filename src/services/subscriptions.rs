//! Push subscription management.
//!
//! Each user holds at most one subscription; registering a new one
//! replaces the previous record (a browser re-subscribe issues a fresh
//! endpoint, and only the latest is deliverable).

use chrono::{DateTime, Utc};
use tracing::info;

use crate::api::{SubscriptionRecord, UserId, WebPushSubscription};
use crate::db::repository::{FullRepository, RepositoryResult};

/// Store (or replace) the user's push subscription.
pub async fn subscribe(
    repo: &dyn FullRepository,
    user_id: UserId,
    subscription: WebPushSubscription,
    now: DateTime<Utc>,
) -> RepositoryResult<()> {
    let record = SubscriptionRecord {
        user_id,
        subscription,
        updated_at: now,
    };
    repo.upsert_subscription(&record).await?;
    info!(user_id = %user_id, "push subscription stored");
    Ok(())
}

/// Remove the user's push subscription. Removing a subscription that does
/// not exist is not an error; returns whether one was removed.
pub async fn unsubscribe(repo: &dyn FullRepository, user_id: UserId) -> RepositoryResult<bool> {
    let removed = repo.delete_subscription(user_id).await?;
    if removed {
        info!(user_id = %user_id, "push subscription removed");
    }
    Ok(removed)
}

/// Look up the user's stored subscription.
pub async fn find_subscription(
    repo: &dyn FullRepository,
    user_id: UserId,
) -> RepositoryResult<Option<SubscriptionRecord>> {
    repo.find_subscription(user_id).await
}
