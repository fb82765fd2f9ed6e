//! The graph API client capability.
//!
//! Graphgate orchestrates calls to the provider but does not implement its
//! wire protocol. Everything protocol-shaped sits behind [`GraphApi`]:
//! - building the login dialog URL
//! - exchanging an authorization code for a token
//! - holding a default token and sending graph requests
//!
//! [`HttpGraphClient`] is the production implementation. Tests substitute
//! their own through [`GraphClientBuilder`].

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{ApiRequestError, AuthExchangeError, ClientInitError};
use crate::model::{AuthRequestOptions, Credentials};
use crate::token::AccessToken;

mod http;

pub use http::{HttpGraphClient, HttpGraphClientBuilder};

/// HTTP methods accepted by the graph API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    /// Get the method as an upper-case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ApiRequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "DELETE" => Ok(Self::Delete),
            other => Err(ApiRequestError::InvalidRequest {
                message: format!("unsupported method: {}", other),
            }),
        }
    }
}

/// A graph call as forwarded to the client.
///
/// Without an explicit token the client's default token is used.
#[derive(Debug, Clone)]
pub struct GraphRequest {
    pub method: HttpMethod,
    pub endpoint: String,
    pub params: BTreeMap<String, serde_json::Value>,
    pub access_token: Option<AccessToken>,
    pub etag: Option<String>,
    pub api_version: Option<String>,
}

impl GraphRequest {
    /// Create a request with no parameters or overrides.
    pub fn new(method: HttpMethod, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            params: BTreeMap::new(),
            access_token: None,
            etag: None,
            api_version: None,
        }
    }

    /// Shorthand for a GET request.
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, endpoint)
    }

    /// Add a parameter. Non-string values are sent JSON-encoded.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Replace all parameters.
    pub fn with_params(mut self, params: BTreeMap<String, serde_json::Value>) -> Self {
        self.params = params;
        self
    }

    /// Use this token instead of the client's default.
    pub fn with_access_token(mut self, token: AccessToken) -> Self {
        self.access_token = Some(token);
        self
    }

    /// Send `If-None-Match` with this eTag.
    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    /// Use this API version instead of the configured default.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Parameters flattened to strings, in key order.
    pub fn flat_params(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), value)
            })
            .collect()
    }
}

/// A raw provider response, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphResponse {
    pub status: u16,
    /// Header pairs in arrival order; names may repeat.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Capability interface over the provider's API client.
///
/// One instance is created per component lifetime by
/// [`ApiClientFactory`](crate::factory::ApiClientFactory).
#[async_trait]
pub trait GraphApi: Send + Sync {
    /// Build the login dialog URL.
    ///
    /// `options.redirect_uri` and `options.scopes` are passed through
    /// unchanged; `state` is echoed back by the provider on the callback.
    fn login_url(&self, options: &AuthRequestOptions, state: &str) -> Result<String, ClientInitError>;

    /// Exchange an authorization code for an access token.
    ///
    /// `redirect_uri` must equal the one used to obtain the code.
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<AccessToken, AuthExchangeError>;

    /// Attach a token used by requests that carry none.
    fn set_default_token(&self, token: AccessToken);

    /// The currently attached default token.
    fn default_token(&self) -> Option<AccessToken>;

    /// Send a graph request.
    ///
    /// Returns the provider response as received; error envelopes are
    /// interpreted by the caller.
    async fn send_request(&self, request: &GraphRequest) -> Result<GraphResponse, ApiRequestError>;
}

/// Constructs [`GraphApi`] clients from credentials.
pub trait GraphClientBuilder: Send + Sync {
    fn build(&self, credentials: &Credentials) -> Result<Arc<dyn GraphApi>, ClientInitError>;
}

/// Extract `error.message` from a provider error envelope.
pub(crate) fn provider_error_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_from_str() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("POST".parse::<HttpMethod>().unwrap(), HttpMethod::Post);
        assert_eq!("Delete".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
        assert!(matches!(
            "PATCH".parse::<HttpMethod>(),
            Err(ApiRequestError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn test_flat_params_encodes_non_strings() {
        let request = GraphRequest::get("/me")
            .with_param("fields", "id,name")
            .with_param("limit", 25)
            .with_param("ids", json!(["1", "2"]));

        assert_eq!(
            request.flat_params(),
            vec![
                ("fields".to_string(), "id,name".to_string()),
                ("ids".to_string(), r#"["1","2"]"#.to_string()),
                ("limit".to_string(), "25".to_string()),
            ]
        );
    }

    #[test]
    fn test_provider_error_message() {
        let body = br#"{"error":{"message":"Invalid OAuth access token.","type":"OAuthException","code":190}}"#;
        assert_eq!(
            provider_error_message(body).as_deref(),
            Some("Invalid OAuth access token.")
        );
        assert!(provider_error_message(b"{\"id\":\"1\"}").is_none());
        assert!(provider_error_message(b"<html>").is_none());
    }
}
