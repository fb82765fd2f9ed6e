//! Access tokens and their session slot.
//!
//! This module provides:
//! - [`AccessToken`] - An opaque provider token with optional expiry metadata
//! - [`TokenStore`] - Best-effort persistence of one token per user session

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::store::{Secret, SessionStore, TOKEN_KEY};

/// An access token issued by the provider.
///
/// The value is opaque. It is serialized to the session as-is and attached
/// to outgoing graph calls. Expiry is kept for callers that want it but is
/// not part of the serialized form.
#[derive(Debug, Clone)]
pub struct AccessToken {
    value: Secret,
    expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Create a token from its string form.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Secret::new(value),
            expires_at: None,
        }
    }

    /// Attach an expiration time.
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// The token value. Never log the result.
    pub fn expose(&self) -> &str {
        self.value.expose()
    }

    /// The string written to the session slot.
    pub fn to_session_value(&self) -> String {
        self.value.expose().to_string()
    }

    /// When the token expires, if the provider said.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Check if this token has expired.
    ///
    /// Returns `false` if no expiration is known.
    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|exp| exp < Utc::now()).unwrap_or(false)
    }
}

impl PartialEq for AccessToken {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for AccessToken {}

impl From<&str> for AccessToken {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AccessToken {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// The session slot holding the user's access token.
///
/// Persistence is best-effort: without a session facility `set` is a no-op,
/// and backend failures are logged rather than returned. Reads that fail are
/// treated as an empty slot.
#[derive(Clone)]
pub struct TokenStore {
    session: Option<Arc<dyn SessionStore>>,
}

impl TokenStore {
    /// Create a token store backed by the given session.
    pub fn new(session: Arc<dyn SessionStore>) -> Self {
        Self {
            session: Some(session),
        }
    }

    /// Create a token store with no session facility.
    ///
    /// `get` always returns `None` and `set` does nothing.
    pub fn detached() -> Self {
        Self { session: None }
    }

    /// Whether a session facility is attached.
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Read the stored token, if any.
    pub async fn get(&self) -> Option<AccessToken> {
        let session = self.session.as_ref()?;
        match session.get(TOKEN_KEY).await {
            Ok(value) => value.filter(|v| !v.is_empty()).map(AccessToken::new),
            Err(e) => {
                tracing::warn!("Failed to read access token from session: {}", e);
                None
            }
        }
    }

    /// Persist a token, overwriting any previous one.
    pub async fn set(&self, token: &AccessToken) {
        let Some(session) = self.session.as_ref() else {
            tracing::debug!("No session available, access token not persisted");
            return;
        };

        if let Err(e) = session.set(TOKEN_KEY, &token.to_session_value()).await {
            tracing::warn!("Failed to persist access token to session: {}", e);
        }
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("has_session", &self.has_session())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemorySession, StoreError};
    use async_trait::async_trait;

    struct BrokenSession;

    #[async_trait]
    impl SessionStore for BrokenSession {
        async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable {
                message: "headers already sent".to_string(),
            })
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable {
                message: "headers already sent".to_string(),
            })
        }

        async fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[test]
    fn test_token_is_expired() {
        let expired = AccessToken::new("t").with_expiry(Utc::now() - chrono::Duration::hours(1));
        assert!(expired.is_expired());

        let valid = AccessToken::new("t").with_expiry(Utc::now() + chrono::Duration::hours(1));
        assert!(!valid.is_expired());

        assert!(!AccessToken::new("t").is_expired());
    }

    #[test]
    fn test_token_debug_redacted() {
        let token = AccessToken::new("EAABsecret");
        assert!(!format!("{:?}", token).contains("EAABsecret"));
    }

    #[tokio::test]
    async fn test_round_trip() {
        let store = TokenStore::new(Arc::new(MemorySession::new()));
        assert!(store.get().await.is_none());

        let token = AccessToken::new("EAAB-token");
        store.set(&token).await;

        let stored = store.get().await.unwrap();
        assert_eq!(stored.to_session_value(), token.to_session_value());
    }

    #[tokio::test]
    async fn test_set_is_idempotent() {
        let session = Arc::new(MemorySession::new());
        let store = TokenStore::new(session.clone());
        let token = AccessToken::new("same");

        store.set(&token).await;
        let once = store.get().await;
        store.set(&token).await;
        let twice = store.get().await;

        assert_eq!(once, twice);
        assert_eq!(session.get(TOKEN_KEY).await.unwrap().as_deref(), Some("same"));
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let store = TokenStore::new(Arc::new(MemorySession::new()));
        store.set(&AccessToken::new("first")).await;
        store.set(&AccessToken::new("second")).await;
        assert_eq!(store.get().await.unwrap().expose(), "second");
    }

    #[tokio::test]
    async fn test_detached_store_is_noop() {
        let store = TokenStore::detached();
        store.set(&AccessToken::new("lost")).await;
        assert!(store.get().await.is_none());
        assert!(!store.has_session());
    }

    #[tokio::test]
    async fn test_backend_failures_are_soft() {
        let store = TokenStore::new(Arc::new(BrokenSession));
        store.set(&AccessToken::new("t")).await;
        assert!(store.get().await.is_none());
    }
}
