//! Authorization Code flow.
//!
//! # Flow Overview
//!
//! 1. Build the login dialog URL with the configured redirect URI and scopes
//! 2. User authorizes in the browser
//! 3. Provider redirects back with an authorization code
//! 4. Exchange the code for an access token
//!
//! The flow does not touch session storage; persisting the token is the
//! caller's job (see [`AuthController`](crate::controller::AuthController)).
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example(factory: std::sync::Arc<graphgate_core::ApiClientFactory>)
//! #     -> Result<(), Box<dyn std::error::Error>> {
//! use graphgate_core::{AuthFlow, AuthRequestOptions};
//!
//! let flow = AuthFlow::new(factory);
//! let options = AuthRequestOptions::new("https://example.com/facebook/auth/oauth-callback")
//!     .with_scopes(["email"]);
//!
//! let redirect = flow.build_login_url(&options).await?;
//! println!("Visit: {}", redirect.url);
//!
//! // After the provider redirects back with a code...
//! let token = flow.exchange_code("authorization-code", &options.redirect_uri).await?;
//! # Ok(())
//! # }
//! ```

use parking_lot::Mutex;
use std::sync::Arc;

use super::generate_random_string;
use crate::error::{AuthExchangeError, ClientInitError};
use crate::factory::ApiClientFactory;
use crate::model::AuthRequestOptions;
use crate::token::AccessToken;

/// Length of the generated `state` parameter.
const STATE_LENGTH: usize = 32;

/// Where the flow currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    /// No login has been started, or the last exchange failed.
    Unauthenticated,

    /// A login URL was issued and the callback has not been handled yet.
    PendingCallback { state: String },

    /// A code was exchanged successfully.
    Authenticated,
}

/// A login URL together with the `state` embedded in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRedirect {
    pub url: String,
    pub state: String,
}

/// The authorization-code state machine.
pub struct AuthFlow {
    factory: Arc<ApiClientFactory>,
    state: Mutex<FlowState>,
}

impl AuthFlow {
    /// Create a flow over the given client factory.
    pub fn new(factory: Arc<ApiClientFactory>) -> Self {
        Self {
            factory,
            state: Mutex::new(FlowState::Unauthenticated),
        }
    }

    /// Current state of the flow.
    pub fn state(&self) -> FlowState {
        self.state.lock().clone()
    }

    /// Build the provider login URL.
    ///
    /// The redirect URI and scopes are passed to the provider exactly as
    /// given. A fresh `state` value is generated for every call.
    pub async fn build_login_url(
        &self,
        options: &AuthRequestOptions,
    ) -> Result<LoginRedirect, ClientInitError> {
        let client = self.factory.client().await?;
        let state = generate_random_string(STATE_LENGTH);
        let url = client.login_url(options, &state)?;

        tracing::debug!(
            redirect_uri = %options.redirect_uri,
            scopes = ?options.scopes,
            "Built login URL"
        );

        *self.state.lock() = FlowState::PendingCallback {
            state: state.clone(),
        };

        Ok(LoginRedirect { url, state })
    }

    /// Exchange an authorization code for an access token.
    ///
    /// `redirect_uri` must be the one the code was issued for. Failures are
    /// not retried: codes are single use.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<AccessToken, AuthExchangeError> {
        match self.try_exchange(code, redirect_uri).await {
            Ok(token) => {
                tracing::info!("Authorization code exchanged for access token");
                *self.state.lock() = FlowState::Authenticated;
                Ok(token)
            }
            Err(e) => {
                tracing::warn!("Authorization code exchange failed: {}", e);
                *self.state.lock() = FlowState::Unauthenticated;
                Err(e)
            }
        }
    }

    async fn try_exchange(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<AccessToken, AuthExchangeError> {
        if code.trim().is_empty() {
            return Err(AuthExchangeError::MissingCode);
        }

        let client = self.factory.client().await?;
        client.exchange_code(code, redirect_uri).await
    }
}

impl std::fmt::Debug for AuthFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthFlow")
            .field("state", &*self.state.lock())
            .finish()
    }
}
