//! Repository trait definitions.
//!
//! The abstract interface between the service layer and a storage backend.
//! Split by entity: sessions, slots, subscriptions. [`FullRepository`]
//! bundles the three plus a health probe, and is what application state
//! carries as `Arc<dyn FullRepository>`.

pub mod error;
pub mod sessions;
pub mod slots;
pub mod subscriptions;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};
pub use sessions::SessionRepository;
pub use slots::SlotRepository;
pub use subscriptions::SubscriptionRepository;

use async_trait::async_trait;

/// Combined repository interface over all entities.
#[async_trait]
pub trait FullRepository:
    SessionRepository + SlotRepository + SubscriptionRepository + Send + Sync
{
    /// Verify the backend is reachable. `Ok(false)` means "reachable but
    /// degraded" where a backend can distinguish that.
    async fn health_check(&self) -> RepositoryResult<bool>;
}
