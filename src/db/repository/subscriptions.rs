//! Subscription repository trait for push-subscription bookkeeping.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{SubscriptionRecord, UserId};

/// Repository trait for stored push subscriptions.
///
/// One subscription per user, last write wins: a re-subscribe overwrites any
/// prior row for that user.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Insert or replace the subscription for its user.
    async fn upsert_subscription(&self, record: &SubscriptionRecord) -> RepositoryResult<()>;

    /// Delete a user's stored subscription.
    ///
    /// Returns `false` when no row existed; unsubscribing an unknown user is
    /// a no-op, not an error.
    async fn delete_subscription(&self, user_id: UserId) -> RepositoryResult<bool>;

    /// Fetch a user's stored subscription, if any.
    async fn find_subscription(
        &self,
        user_id: UserId,
    ) -> RepositoryResult<Option<SubscriptionRecord>>;

    /// Subscriptions for exactly the given users. Users without a stored
    /// subscription are silently absent from the result.
    async fn find_subscriptions_for_users(
        &self,
        user_ids: &[UserId],
    ) -> RepositoryResult<Vec<SubscriptionRecord>>;

    /// Every stored subscription (broadcast dispatch mode).
    async fn list_subscriptions(&self) -> RepositoryResult<Vec<SubscriptionRecord>>;
}
