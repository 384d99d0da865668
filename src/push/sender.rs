//! Push protocol sender.
//!
//! [`PushSender`] is the seam between dispatch logic and the wire protocol;
//! [`WebPushSender`] is the production implementation built on the
//! `web-push` crate (VAPID signing plus aes128gcm payload encryption).

use async_trait::async_trait;
use web_push::{
    ContentEncoding, IsahcWebPushClient, SubscriptionInfo, VapidSignatureBuilder, WebPushClient,
    WebPushMessageBuilder, URL_SAFE_NO_PAD,
};

use super::vapid::VapidConfig;
use crate::api::WebPushSubscription;
use crate::reminder::NotificationContent;

/// Error delivering one push message.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The stored subscription could not be used to build a request
    /// (malformed endpoint or keys).
    #[error("invalid subscription: {0}")]
    InvalidSubscription(String),
    /// The push service rejected or failed the delivery.
    #[error("push delivery failed: {0}")]
    Delivery(String),
    /// VAPID keys are missing; the feature is disabled.
    #[error("push notifications are not configured")]
    NotConfigured,
}

/// One encrypted push to one subscription endpoint.
///
/// Implementations must tolerate being called concurrently; dispatch issues
/// all sends for an interval in parallel and lets each fail independently.
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(
        &self,
        subscription: &WebPushSubscription,
        content: &NotificationContent,
    ) -> Result<(), PushError>;
}

/// Production sender speaking the Web Push protocol.
pub struct WebPushSender {
    vapid: VapidConfig,
    client: IsahcWebPushClient,
}

impl WebPushSender {
    pub fn new(vapid: VapidConfig) -> Result<Self, PushError> {
        let client =
            IsahcWebPushClient::new().map_err(|e| PushError::Delivery(e.to_string()))?;
        Ok(Self { vapid, client })
    }

    pub fn vapid(&self) -> &VapidConfig {
        &self.vapid
    }
}

#[async_trait]
impl PushSender for WebPushSender {
    async fn send(
        &self,
        subscription: &WebPushSubscription,
        content: &NotificationContent,
    ) -> Result<(), PushError> {
        let info = SubscriptionInfo::new(
            subscription.endpoint.clone(),
            subscription.keys.p256dh.clone(),
            subscription.keys.auth.clone(),
        );

        let mut signature =
            VapidSignatureBuilder::from_base64(self.vapid.private_key(), URL_SAFE_NO_PAD, &info)
                .map_err(|e| PushError::InvalidSubscription(e.to_string()))?;
        signature.add_claim("sub", self.vapid.subject());
        let signature = signature
            .build()
            .map_err(|e| PushError::InvalidSubscription(e.to_string()))?;

        let payload = serde_json::to_vec(content)
            .map_err(|e| PushError::Delivery(format!("payload serialization: {}", e)))?;

        let mut builder = WebPushMessageBuilder::new(&info);
        builder.set_payload(ContentEncoding::Aes128Gcm, &payload);
        builder.set_vapid_signature(signature);
        let message = builder
            .build()
            .map_err(|e| PushError::InvalidSubscription(e.to_string()))?;

        self.client
            .send(message)
            .await
            .map_err(|e| PushError::Delivery(e.to_string()))
    }
}
