//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::FullRepository;
use crate::push::{DispatchMode, PushSender};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for database operations
    pub repository: Arc<dyn FullRepository>,
    /// Push sender, present only when VAPID keys are configured
    pub push: Option<Arc<dyn PushSender>>,
    /// VAPID public key served to browsers for subscription
    pub vapid_public_key: Option<String>,
    /// Shared secret guarding the cron dispatch endpoint
    pub cron_secret: Option<String>,
    /// Who gets paged on a dispatch tick
    pub dispatch_mode: DispatchMode,
}

impl AppState {
    /// Create a new application state with the given repository.
    ///
    /// Push dispatch starts disabled; enable it with [`with_push`].
    ///
    /// [`with_push`]: AppState::with_push
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self {
            repository,
            push: None,
            vapid_public_key: None,
            cron_secret: None,
            dispatch_mode: DispatchMode::default(),
        }
    }

    /// Enable push delivery with the given sender and public key.
    pub fn with_push(mut self, sender: Arc<dyn PushSender>, public_key: impl Into<String>) -> Self {
        self.push = Some(sender);
        self.vapid_public_key = Some(public_key.into());
        self
    }

    /// Require a bearer secret on the cron dispatch endpoint.
    pub fn with_cron_secret(mut self, secret: impl Into<String>) -> Self {
        self.cron_secret = Some(secret.into());
        self
    }

    /// Set the default dispatch mode.
    pub fn with_dispatch_mode(mut self, mode: DispatchMode) -> Self {
        self.dispatch_mode = mode;
        self
    }
}
