//! Lazily built, memoized graph client.
//!
//! [`ApiClientFactory`] owns exactly one client per component lifetime. The
//! client is built on first use from the validated credentials and, when the
//! session already holds a token, starts out with that token attached.

use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::client::{GraphApi, GraphClientBuilder};
use crate::error::ClientInitError;
use crate::model::Credentials;
use crate::token::{AccessToken, TokenStore};

/// Builds and memoizes the graph client for one component instance.
///
/// Not a process-wide singleton: a new factory (one per request in the
/// reference server) builds a new client.
pub struct ApiClientFactory {
    credentials: Credentials,
    tokens: TokenStore,
    builder: Arc<dyn GraphClientBuilder>,
    client: OnceCell<Arc<dyn GraphApi>>,
}

impl ApiClientFactory {
    /// Create a factory. Nothing is built until [`client`](Self::client).
    pub fn new(
        credentials: Credentials,
        tokens: TokenStore,
        builder: Arc<dyn GraphClientBuilder>,
    ) -> Self {
        Self {
            credentials,
            tokens,
            builder,
            client: OnceCell::new(),
        }
    }

    /// Get the client, building it on first call.
    ///
    /// Every later call returns the same instance. A failed build is not
    /// memoized; the next call tries again.
    pub async fn client(&self) -> Result<Arc<dyn GraphApi>, ClientInitError> {
        let client = self
            .client
            .get_or_try_init(|| async {
                tracing::debug!(
                    app_id = %self.credentials.app_id(),
                    api_version = %self.credentials.api_version(),
                    "Constructing graph client"
                );

                let client = self.builder.build(&self.credentials)?;

                if let Some(token) = self.tokens.get().await {
                    tracing::debug!("Attaching session access token to graph client");
                    client.set_default_token(token);
                }

                Ok::<_, ClientInitError>(client)
            })
            .await?;

        Ok(Arc::clone(client))
    }

    /// Whether the client has been built.
    pub fn is_initialized(&self) -> bool {
        self.client.initialized()
    }

    /// Attach a token to the client and persist it to the session.
    pub async fn set_access_token(&self, token: AccessToken) -> Result<(), ClientInitError> {
        let client = self.client().await?;
        self.tokens.set(&token).await;
        client.set_default_token(token);
        Ok(())
    }

    /// The client's current default token.
    pub async fn access_token(&self) -> Result<Option<AccessToken>, ClientInitError> {
        Ok(self.client().await?.default_token())
    }

    /// The credentials the client is built from.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// The session token slot.
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }
}

impl std::fmt::Debug for ApiClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClientFactory")
            .field("credentials", &self.credentials)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::HttpGraphClientBuilder;
    use crate::provider::GraphEndpoints;
    use crate::store::{MemorySession, SessionStore, TOKEN_KEY};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingBuilder {
        inner: HttpGraphClientBuilder,
        builds: AtomicUsize,
    }

    impl GraphClientBuilder for CountingBuilder {
        fn build(&self, credentials: &Credentials) -> Result<Arc<dyn GraphApi>, ClientInitError> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            self.inner.build(credentials)
        }
    }

    fn credentials() -> Credentials {
        Credentials::configure("app", "secret", None).unwrap()
    }

    fn counting() -> Arc<CountingBuilder> {
        Arc::new(CountingBuilder {
            inner: HttpGraphClientBuilder::default(),
            builds: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_client_is_memoized() {
        let builder = counting();
        let factory = ApiClientFactory::new(credentials(), TokenStore::detached(), builder.clone());

        assert!(!factory.is_initialized());
        let first = factory.client().await.unwrap();
        let second = factory.client().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(factory.is_initialized());
        assert_eq!(builder.builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_separate_factories_build_separate_clients() {
        let builder = counting();
        let a = ApiClientFactory::new(credentials(), TokenStore::detached(), builder.clone());
        let b = ApiClientFactory::new(credentials(), TokenStore::detached(), builder.clone());

        let ca = a.client().await.unwrap();
        let cb = b.client().await.unwrap();

        assert!(!Arc::ptr_eq(&ca, &cb));
        assert_eq!(builder.builds.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_session_token_attached_on_construction() {
        let session = Arc::new(MemorySession::new());
        session.set(TOKEN_KEY, "stored-token").await.unwrap();

        let factory = ApiClientFactory::new(
            credentials(),
            TokenStore::new(session),
            Arc::new(HttpGraphClientBuilder::default()),
        );

        let token = factory.access_token().await.unwrap();
        assert_eq!(token.unwrap().expose(), "stored-token");
    }

    #[tokio::test]
    async fn test_no_session_token_leaves_client_bare() {
        let factory = ApiClientFactory::new(
            credentials(),
            TokenStore::new(Arc::new(MemorySession::new())),
            Arc::new(HttpGraphClientBuilder::default()),
        );

        assert!(factory.access_token().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_access_token_attaches_and_persists() {
        let session = Arc::new(MemorySession::new());
        let factory = ApiClientFactory::new(
            credentials(),
            TokenStore::new(session.clone()),
            Arc::new(HttpGraphClientBuilder::default()),
        );

        factory.set_access_token(AccessToken::new("fresh")).await.unwrap();

        assert_eq!(factory.access_token().await.unwrap().unwrap().expose(), "fresh");
        assert_eq!(session.get(TOKEN_KEY).await.unwrap().as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_build_failure_surfaces_and_is_not_memoized() {
        let builder = Arc::new(HttpGraphClientBuilder::new(
            GraphEndpoints::new("not a url", "not a url"),
            Duration::from_secs(5),
        ));
        let factory = ApiClientFactory::new(credentials(), TokenStore::detached(), builder);

        assert!(matches!(
            factory.client().await,
            Err(ClientInitError::InvalidUrl { .. })
        ));
        assert!(!factory.is_initialized());
    }
}
