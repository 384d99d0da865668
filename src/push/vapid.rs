//! VAPID key configuration.
//!
//! Web Push requires an application server key pair (VAPID). The public key
//! is handed to browsers when they subscribe; the private key signs every
//! push request. Missing keys put the system into an explicit "not
//! configured" state: the push feature is disabled and dispatch reports a
//! skip, but nothing is fatal to the rest of the application.

/// VAPID key pair plus the contact address sent in the `sub` claim.
#[derive(Debug, Clone)]
pub struct VapidConfig {
    /// URL-safe base64 public key, served to browsers unauthenticated.
    pub public_key: String,
    /// URL-safe base64 private key. Never leaves the server.
    private_key: String,
    /// Contact email for the `mailto:` subject claim.
    pub contact_email: String,
}

impl VapidConfig {
    /// Read the configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `VAPID_PUBLIC_KEY`: public key (required)
    /// - `VAPID_PRIVATE_KEY`: private key (required)
    /// - `VAPID_EMAIL`: contact email (default: `your-email@example.com`)
    ///
    /// Returns `None` when either key is absent — push is then "not
    /// configured" and callers degrade gracefully.
    pub fn from_env() -> Option<Self> {
        let public_key = std::env::var("VAPID_PUBLIC_KEY").ok()?;
        let private_key = std::env::var("VAPID_PRIVATE_KEY").ok()?;
        let contact_email = std::env::var("VAPID_EMAIL")
            .unwrap_or_else(|_| "your-email@example.com".to_string());

        Some(Self {
            public_key,
            private_key,
            contact_email,
        })
    }

    pub fn new(
        public_key: impl Into<String>,
        private_key: impl Into<String>,
        contact_email: impl Into<String>,
    ) -> Self {
        Self {
            public_key: public_key.into(),
            private_key: private_key.into(),
            contact_email: contact_email.into(),
        }
    }

    pub(crate) fn private_key(&self) -> &str {
        &self.private_key
    }

    /// Subject claim value for VAPID signatures.
    pub fn subject(&self) -> String {
        format!("mailto:{}", self.contact_email)
    }
}
