//! HTTP implementation of the graph client.

use async_trait::async_trait;
use chrono::Utc;
use oauth2::{
    AuthorizationCode, CsrfToken, RequestTokenError, TokenResponse,
    basic::{BasicClient, BasicErrorResponse},
    reqwest::async_http_client,
};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

use super::{
    GraphApi, GraphClientBuilder, GraphRequest, GraphResponse, HttpMethod,
    provider_error_message,
};
use crate::error::{ApiRequestError, AuthExchangeError, ClientInitError};
use crate::model::{AuthRequestOptions, Credentials};
use crate::oauth::create_oauth_client;
use crate::provider::GraphEndpoints;
use crate::token::AccessToken;

/// Default timeout for graph requests and the token exchange.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Graph client talking to the provider over HTTP.
pub struct HttpGraphClient {
    credentials: Credentials,
    endpoints: GraphEndpoints,
    http_client: reqwest::Client,
    timeout: Duration,
    default_token: RwLock<Option<AccessToken>>,
}

impl HttpGraphClient {
    /// Create a client.
    ///
    /// Fails if the endpoints do not form valid URLs or the HTTP transport
    /// cannot be built.
    pub fn new(
        credentials: Credentials,
        endpoints: GraphEndpoints,
        timeout: Duration,
    ) -> Result<Self, ClientInitError> {
        url::Url::parse(&endpoints.graph_url).map_err(|e| ClientInitError::InvalidUrl {
            endpoint: "graph",
            message: e.to_string(),
        })?;
        create_oauth_client(&endpoints, &credentials, None)?;

        let http_client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            credentials,
            endpoints,
            http_client,
            timeout,
            default_token: RwLock::new(None),
        })
    }

    fn oauth_client(&self, redirect_uri: &str) -> Result<BasicClient, ClientInitError> {
        create_oauth_client(&self.endpoints, &self.credentials, Some(redirect_uri))
    }
}

impl std::fmt::Debug for HttpGraphClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGraphClient")
            .field("app_id", &self.credentials.app_id())
            .field("endpoints", &self.endpoints)
            .field("has_default_token", &self.default_token.read().is_some())
            .finish()
    }
}

#[async_trait]
impl GraphApi for HttpGraphClient {
    fn login_url(&self, options: &AuthRequestOptions, state: &str) -> Result<String, ClientInitError> {
        let client = self.oauth_client(&options.redirect_uri)?;
        let state = state.to_string();

        let mut request = client.authorize_url(move || CsrfToken::new(state));

        if !options.scopes.is_empty() {
            request = request.add_extra_param("scope", options.scopes.join(","));
        }
        for (name, value) in &options.extra_params {
            request = request.add_extra_param(name.as_str(), value.as_str());
        }

        let (url, _state) = request.url();
        Ok(url.to_string())
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<AccessToken, AuthExchangeError> {
        let client = self.oauth_client(redirect_uri)?;

        // The oauth2 transport has no timeout of its own.
        let exchange = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(async_http_client);

        let token_result = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| AuthExchangeError::Transport {
                message: format!("token endpoint did not answer within {:?}", self.timeout),
            })?
            .map_err(exchange_error)?;

        let mut token = AccessToken::new(token_result.access_token().secret().to_string());

        if let Some(duration) = token_result.expires_in() {
            match chrono::Duration::from_std(duration) {
                Ok(duration) => token = token.with_expiry(Utc::now() + duration),
                Err(e) => tracing::debug!("Ignoring out-of-range token lifetime: {}", e),
            }
        }

        Ok(token)
    }

    fn set_default_token(&self, token: AccessToken) {
        *self.default_token.write() = Some(token);
    }

    fn default_token(&self) -> Option<AccessToken> {
        self.default_token.read().clone()
    }

    async fn send_request(&self, request: &GraphRequest) -> Result<GraphResponse, ApiRequestError> {
        let token = request
            .access_token
            .clone()
            .or_else(|| self.default_token())
            .ok_or(ApiRequestError::MissingAccessToken)?;

        let version = request
            .api_version
            .as_deref()
            .unwrap_or_else(|| self.credentials.api_version());
        let url = self.endpoints.api_url(version, &request.endpoint);

        let mut params = request.flat_params();
        params.push(("access_token".to_string(), token.expose().to_string()));

        let mut builder = match request.method {
            HttpMethod::Get => self.http_client.get(&url).query(&params),
            HttpMethod::Delete => self.http_client.delete(&url).query(&params),
            HttpMethod::Post => self.http_client.post(&url).form(&params),
        };

        if let Some(etag) = &request.etag {
            builder = builder.header(reqwest::header::IF_NONE_MATCH, etag);
        }

        tracing::debug!("Sending graph request {} {}", request.method, request.endpoint);

        let response = builder
            .send()
            .await
            .map_err(|e| ApiRequestError::Transport {
                message: format!("request to {} failed: {}", request.endpoint, e),
            })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let body = response
            .text()
            .await
            .map_err(|e| ApiRequestError::Transport {
                message: format!("failed to read response body: {}", e),
            })?;

        Ok(GraphResponse {
            status,
            headers,
            body,
        })
    }
}

fn exchange_error<RE>(err: RequestTokenError<RE, BasicErrorResponse>) -> AuthExchangeError
where
    RE: std::error::Error + 'static,
{
    match err {
        RequestTokenError::ServerResponse(response) => AuthExchangeError::Rejected {
            message: response.to_string(),
        },
        RequestTokenError::Request(e) => AuthExchangeError::Transport {
            message: e.to_string(),
        },
        RequestTokenError::Parse(e, body) => AuthExchangeError::Rejected {
            message: provider_error_message(&body)
                .unwrap_or_else(|| format!("unexpected token response: {}", e)),
        },
        RequestTokenError::Other(message) => AuthExchangeError::Rejected { message },
    }
}

/// Builds [`HttpGraphClient`]s for a fixed set of endpoints.
#[derive(Debug, Clone)]
pub struct HttpGraphClientBuilder {
    endpoints: GraphEndpoints,
    timeout: Duration,
}

impl HttpGraphClientBuilder {
    /// Create a builder.
    pub fn new(endpoints: GraphEndpoints, timeout: Duration) -> Self {
        Self { endpoints, timeout }
    }
}

impl Default for HttpGraphClientBuilder {
    fn default() -> Self {
        Self::new(GraphEndpoints::default(), DEFAULT_TIMEOUT)
    }
}

impl GraphClientBuilder for HttpGraphClientBuilder {
    fn build(&self, credentials: &Credentials) -> Result<Arc<dyn GraphApi>, ClientInitError> {
        let client = HttpGraphClient::new(credentials.clone(), self.endpoints.clone(), self.timeout)?;
        Ok(Arc::new(client))
    }
}
