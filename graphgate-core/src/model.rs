//! Domain model types for Graphgate.
//!
//! This module defines:
//! - [`Credentials`] - validated application credentials
//! - [`AuthRequestOptions`] - redirect URI, scopes, and extra login parameters

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ConfigError;
use crate::store::Secret;

/// Graph API version used when none is configured.
pub const DEFAULT_API_VERSION: &str = "v2.10";

/// Application credentials.
///
/// Only constructed through [`Credentials::configure`] or
/// [`Credentials::from_json`], so an instance always carries a non-empty app
/// id and app secret. Immutable after construction.
///
/// # Examples
///
/// ```
/// use graphgate_core::Credentials;
///
/// let creds = Credentials::configure("1234", "app-secret", None).unwrap();
/// assert_eq!(creds.api_version(), "v2.10");
///
/// assert!(Credentials::configure("", "app-secret", None).is_err());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    app_id: String,
    app_secret: Secret,
    api_version: String,
}

impl Credentials {
    /// Validate and store credentials.
    ///
    /// Fails with [`ConfigError::Missing`] if the app id or app secret is
    /// empty. A missing or blank `api_version` falls back to
    /// [`DEFAULT_API_VERSION`].
    pub fn configure(
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
        api_version: Option<String>,
    ) -> Result<Self, ConfigError> {
        let app_id = app_id.into();
        let app_secret = Secret::new(app_secret);

        if app_id.trim().is_empty() {
            return Err(ConfigError::Missing { param: "app id" });
        }
        if app_secret.expose().trim().is_empty() {
            return Err(ConfigError::Missing { param: "app secret" });
        }

        let api_version = api_version
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        Ok(Self {
            app_id,
            app_secret,
            api_version,
        })
    }

    /// Parse structured credentials.
    ///
    /// Accepts a JSON object with `app_id`, `app_secret` and an optional
    /// `default_graph_version`. Any other shape is rejected with
    /// [`ConfigError::InvalidCredentials`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| ConfigError::InvalidCredentials {
                message: e.to_string(),
            })?;

        let object = value.as_object().ok_or_else(|| ConfigError::InvalidCredentials {
            message: "expected a JSON object".to_string(),
        })?;

        let field = |name: &str| -> Option<String> {
            match object.get(name)? {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            }
        };

        let app_id = field("app_id").ok_or_else(|| ConfigError::InvalidCredentials {
            message: "missing app_id".to_string(),
        })?;
        let app_secret = field("app_secret").ok_or_else(|| ConfigError::InvalidCredentials {
            message: "missing app_secret".to_string(),
        })?;

        Self::configure(app_id, app_secret, field("default_graph_version"))
    }

    /// The application id.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// The application secret.
    pub fn app_secret(&self) -> &Secret {
        &self.app_secret
    }

    /// The default graph API version, e.g. `v2.10`.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("app_secret", &self.app_secret)
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// Options for building the provider login URL.
///
/// The redirect URI is passed to the provider exactly as given; it must match
/// the URI registered for the app and the one used for the code exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRequestOptions {
    /// Absolute callback URL.
    pub redirect_uri: String,

    /// Permissions to request, in order.
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Additional query parameters appended to the login URL.
    #[serde(default)]
    pub extra_params: Vec<(String, String)>,
}

impl AuthRequestOptions {
    /// Create options for the given redirect URI with no scopes.
    pub fn new(redirect_uri: impl Into<String>) -> Self {
        Self {
            redirect_uri: redirect_uri.into(),
            scopes: Vec::new(),
            extra_params: Vec::new(),
        }
    }

    /// Set the requested scopes.
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Append an extra login URL parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_params.push((name.into(), value.into()));
        self
    }
}
