//! The two HTTP-facing auth actions, independent of any web framework.
//!
//! Hosts map their routes onto [`AuthController::redirect`] and
//! [`AuthController::oauth_callback`] and translate the returned
//! [`ControllerResponse`] into their own response type.

use std::sync::Arc;

use crate::error::AuthExchangeError;
use crate::model::AuthRequestOptions;
use crate::oauth::AuthFlow;
use crate::store::{RETURN_URL_KEY, STATE_KEY, SessionStore};
use crate::token::TokenStore;

/// Outcome of an auth action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerResponse {
    /// Send a 302 to `location`.
    Redirect { location: String },

    /// Send a 500 carrying `message`.
    ServerError { message: String },
}

/// Redirect and callback actions of the login flow.
pub struct AuthController {
    flow: Arc<AuthFlow>,
    tokens: TokenStore,
    session: Option<Arc<dyn SessionStore>>,
    options: AuthRequestOptions,
    verify_state: bool,
    home_url: String,
}

impl AuthController {
    /// Create a controller over `flow` that persists tokens through `tokens`.
    ///
    /// `session` holds the return location (and the issued `state` when
    /// verification is enabled); without one, the callback always returns to
    /// the home URL. State verification is off and the home URL is `/` until
    /// changed with the builder methods.
    pub fn new(
        flow: Arc<AuthFlow>,
        tokens: TokenStore,
        session: Option<Arc<dyn SessionStore>>,
        options: AuthRequestOptions,
    ) -> Self {
        Self {
            flow,
            tokens,
            session,
            options,
            verify_state: false,
            home_url: "/".to_string(),
        }
    }

    /// Require the callback `state` to match the one issued by `redirect`.
    pub fn with_state_verification(mut self, enabled: bool) -> Self {
        self.verify_state = enabled;
        self
    }

    /// Fallback location after the callback when no referrer was remembered.
    pub fn with_home_url(mut self, home_url: impl Into<String>) -> Self {
        self.home_url = home_url.into();
        self
    }

    /// Remember where the user came from and send them to the login dialog.
    pub async fn redirect(&self, referrer: Option<&str>) -> ControllerResponse {
        match referrer.filter(|r| !r.is_empty()) {
            Some(referrer) => self.session_set(RETURN_URL_KEY, referrer).await,
            None => self.session_remove(RETURN_URL_KEY).await,
        }

        let login = match self.flow.build_login_url(&self.options).await {
            Ok(login) => login,
            Err(e) => {
                tracing::error!("Failed to build login URL: {}", e);
                return ControllerResponse::ServerError {
                    message: e.to_string(),
                };
            }
        };

        if self.verify_state {
            self.session_set(STATE_KEY, &login.state).await;
        }

        ControllerResponse::Redirect {
            location: login.url,
        }
    }

    /// Exchange the code, persist the token and go back to the remembered
    /// location.
    ///
    /// `state` is ignored unless state verification is enabled.
    pub async fn oauth_callback(
        &self,
        code: Option<&str>,
        state: Option<&str>,
    ) -> ControllerResponse {
        if let Err(e) = self.handle_callback(code, state).await {
            return ControllerResponse::ServerError {
                message: e.to_string(),
            };
        }

        let location = self
            .session_get(RETURN_URL_KEY)
            .await
            .unwrap_or_else(|| self.home_url.clone());

        ControllerResponse::Redirect { location }
    }

    async fn handle_callback(
        &self,
        code: Option<&str>,
        state: Option<&str>,
    ) -> Result<(), AuthExchangeError> {
        if self.verify_state {
            let expected = self.session_get(STATE_KEY).await;
            self.session_remove(STATE_KEY).await;

            match (expected.as_deref(), state) {
                (Some(expected), Some(received)) if expected == received => {}
                _ => {
                    tracing::warn!("Rejecting OAuth callback with missing or mismatched state");
                    return Err(AuthExchangeError::StateMismatch);
                }
            }
        }

        let code = code.ok_or(AuthExchangeError::MissingCode)?;
        let token = self
            .flow
            .exchange_code(code, &self.options.redirect_uri)
            .await?;

        self.tokens.set(&token).await;
        Ok(())
    }

    async fn session_get(&self, key: &str) -> Option<String> {
        let session = self.session.as_ref()?;
        match session.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to read {} from session: {}", key, e);
                None
            }
        }
    }

    async fn session_set(&self, key: &str, value: &str) {
        if let Some(session) = &self.session {
            if let Err(e) = session.set(key, value).await {
                tracing::warn!("Failed to write {} to session: {}", key, e);
            }
        }
    }

    async fn session_remove(&self, key: &str) {
        if let Some(session) = &self.session {
            if let Err(e) = session.remove(key).await {
                tracing::warn!("Failed to remove {} from session: {}", key, e);
            }
        }
    }
}

impl std::fmt::Debug for AuthController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthController")
            .field("options", &self.options)
            .field("verify_state", &self.verify_state)
            .field("home_url", &self.home_url)
            .finish()
    }
}
