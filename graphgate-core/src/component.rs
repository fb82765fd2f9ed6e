//! One component instance: everything needed to serve a single request.

use std::sync::Arc;

use crate::client::{GraphClientBuilder, HttpGraphClientBuilder};
use crate::config::ValidatedConfig;
use crate::controller::AuthController;
use crate::factory::ApiClientFactory;
use crate::oauth::AuthFlow;
use crate::proxy::RequestProxy;
use crate::store::SessionStore;
use crate::token::TokenStore;

/// Wires the token store, client factory, auth flow, request proxy and
/// controller around one session.
///
/// Build one per inbound request; the memoized graph client lives exactly
/// as long as this value.
#[derive(Debug)]
pub struct GraphComponent {
    factory: Arc<ApiClientFactory>,
    flow: Arc<AuthFlow>,
    proxy: RequestProxy,
    controller: AuthController,
}

impl GraphComponent {
    /// Create a component talking to the configured provider endpoints.
    pub fn new(config: &ValidatedConfig, session: Option<Arc<dyn SessionStore>>) -> Self {
        let builder = Arc::new(HttpGraphClientBuilder::new(
            config.endpoints.clone(),
            config.timeout,
        ));
        Self::with_builder(config, session, builder)
    }

    /// Create a component with a custom client builder.
    pub fn with_builder(
        config: &ValidatedConfig,
        session: Option<Arc<dyn SessionStore>>,
        builder: Arc<dyn GraphClientBuilder>,
    ) -> Self {
        let tokens = match &session {
            Some(session) => TokenStore::new(Arc::clone(session)),
            None => TokenStore::detached(),
        };

        let factory = Arc::new(ApiClientFactory::new(
            config.credentials.clone(),
            tokens.clone(),
            builder,
        ));
        let flow = Arc::new(AuthFlow::new(Arc::clone(&factory)));
        let proxy = RequestProxy::new(Arc::clone(&factory));
        let controller = AuthController::new(Arc::clone(&flow), tokens, session, config.auth.clone())
            .with_state_verification(config.verify_state)
            .with_home_url(config.home_url.clone());

        Self {
            factory,
            flow,
            proxy,
            controller,
        }
    }

    pub fn factory(&self) -> &Arc<ApiClientFactory> {
        &self.factory
    }

    pub fn tokens(&self) -> &TokenStore {
        self.factory.tokens()
    }

    pub fn auth_flow(&self) -> &Arc<AuthFlow> {
        &self.flow
    }

    pub fn proxy(&self) -> &RequestProxy {
        &self.proxy
    }

    pub fn controller(&self) -> &AuthController {
        &self.controller
    }
}
