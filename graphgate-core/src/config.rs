//! Client configuration and its validation.
//!
//! [`ClientConfig`] is the deserializable shape hosts put in their config
//! files. [`ClientConfig::validate`] turns it into a [`ValidatedConfig`] or a
//! single [`ConfigError`]; components are only ever built from the latter.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::ConfigError;
use crate::model::{AuthRequestOptions, Credentials};
use crate::provider::{DEFAULT_DIALOG_URL, DEFAULT_GRAPH_URL, GraphEndpoints};

/// Graph client configuration as written by the host.
///
/// Credentials come either from `app_id`/`app_secret` or from the
/// `credentials` JSON string; the JSON form wins when both are present.
///
/// # Example
///
/// ```toml
/// app_id = "1234567890"
/// app_secret = "0123456789abcdef"
/// api_version = "v2.10"
/// redirect_uri = "https://example.com/facebook/auth/oauth-callback"
/// scopes = ["email", "public_profile"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub app_id: Option<String>,

    #[serde(default)]
    pub app_secret: Option<String>,

    /// Structured credentials: `{"app_id": ..., "app_secret": ..., "default_graph_version": ...}`.
    #[serde(default)]
    pub credentials: Option<String>,

    #[serde(default)]
    pub api_version: Option<String>,

    #[serde(default)]
    pub redirect_uri: Option<String>,

    #[serde(default)]
    pub scopes: Vec<String>,

    /// Extra query parameters for the login URL.
    #[serde(default)]
    pub extra_login_params: BTreeMap<String, String>,

    /// Check the callback `state` against the one issued at redirect time.
    #[serde(default)]
    pub verify_state: bool,

    /// Where the callback sends the user when no referrer was remembered.
    #[serde(default = "default_home_url")]
    pub home_url: String,

    /// Timeout for graph requests, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_graph_url")]
    pub graph_url: String,

    #[serde(default = "default_dialog_url")]
    pub dialog_url: String,
}

fn default_home_url() -> String {
    "/".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_graph_url() -> String {
    DEFAULT_GRAPH_URL.to_string()
}

fn default_dialog_url() -> String {
    DEFAULT_DIALOG_URL.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            app_secret: None,
            credentials: None,
            api_version: None,
            redirect_uri: None,
            scopes: Vec::new(),
            extra_login_params: BTreeMap::new(),
            verify_state: false,
            home_url: default_home_url(),
            timeout_secs: default_timeout_secs(),
            graph_url: default_graph_url(),
            dialog_url: default_dialog_url(),
        }
    }
}

/// A configuration that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub credentials: Credentials,
    pub auth: AuthRequestOptions,
    pub verify_state: bool,
    pub home_url: String,
    pub endpoints: GraphEndpoints,
    pub timeout: Duration,
}

impl ClientConfig {
    /// Create a configuration with the mandatory values set.
    pub fn new(
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            app_id: Some(app_id.into()),
            app_secret: Some(app_secret.into()),
            redirect_uri: Some(redirect_uri.into()),
            ..Self::default()
        }
    }

    /// Validate everything a component needs.
    pub fn validate(&self) -> Result<ValidatedConfig, ConfigError> {
        let credentials = match &self.credentials {
            Some(json) => Credentials::from_json(json)?,
            None => Credentials::configure(
                self.app_id.clone().unwrap_or_default(),
                self.app_secret.clone().unwrap_or_default(),
                self.api_version.clone(),
            )?,
        };

        let redirect_uri = self
            .redirect_uri
            .as_deref()
            .filter(|uri| !uri.trim().is_empty())
            .ok_or(ConfigError::Missing {
                param: "redirect uri",
            })?;
        url::Url::parse(redirect_uri).map_err(|e| ConfigError::Invalid {
            param: "redirect uri",
            message: format!("{} is not an absolute URL: {}", redirect_uri, e),
        })?;

        for (param, value) in [("graph url", &self.graph_url), ("dialog url", &self.dialog_url)] {
            url::Url::parse(value).map_err(|e| ConfigError::Invalid {
                param,
                message: e.to_string(),
            })?;
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                param: "timeout",
                message: "must be at least one second".to_string(),
            });
        }

        let mut auth = AuthRequestOptions::new(redirect_uri).with_scopes(self.scopes.iter().cloned());
        for (name, value) in &self.extra_login_params {
            auth = auth.with_param(name.clone(), value.clone());
        }

        Ok(ValidatedConfig {
            credentials,
            auth,
            verify_state: self.verify_state,
            home_url: self.home_url.clone(),
            endpoints: GraphEndpoints::new(self.graph_url.clone(), self.dialog_url.clone()),
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_minimal() {
        let config = ClientConfig::new("123", "secret", "https://host/cb");
        let validated = config.validate().unwrap();

        assert_eq!(validated.credentials.app_id(), "123");
        assert_eq!(validated.credentials.api_version(), "v2.10");
        assert_eq!(validated.auth.redirect_uri, "https://host/cb");
        assert!(validated.auth.scopes.is_empty());
        assert!(!validated.verify_state);
        assert_eq!(validated.home_url, "/");
        assert_eq!(validated.timeout, Duration::from_secs(30));
        assert_eq!(validated.endpoints, GraphEndpoints::default());
    }

    #[test]
    fn test_validate_missing_credentials() {
        let mut config = ClientConfig::new("", "secret", "https://host/cb");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing { param: "app id" })
        ));

        config.app_id = Some("123".to_string());
        config.app_secret = None;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing { param: "app secret" })
        ));
    }

    #[test]
    fn test_validate_redirect_uri() {
        let mut config = ClientConfig::new("123", "secret", "");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing { param: "redirect uri" })
        ));

        config.redirect_uri = Some("/facebook/auth/oauth-callback".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { param: "redirect uri", .. })
        ));
    }

    #[test]
    fn test_validate_prefers_json_credentials() {
        let mut config = ClientConfig::new("ignored", "ignored", "https://host/cb");
        config.credentials =
            Some(r#"{"app_id":"json-app","app_secret":"json-secret","default_graph_version":"v4.0"}"#.to_string());

        let validated = config.validate().unwrap();
        assert_eq!(validated.credentials.app_id(), "json-app");
        assert_eq!(validated.credentials.api_version(), "v4.0");

        config.credentials = Some("{not json".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidCredentials { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = ClientConfig::new("123", "secret", "https://host/cb");
        config.timeout_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { param: "timeout", .. })
        ));
    }

    #[test]
    fn test_deserialize_from_toml_shape() {
        let config: ClientConfig = serde_json::from_value(serde_json::json!({
            "app_id": "123",
            "app_secret": "secret",
            "redirect_uri": "https://host/cb",
            "scopes": ["email", "public_profile"],
            "extra_login_params": {"auth_type": "rerequest"},
            "verify_state": true
        }))
        .unwrap();

        let validated = config.validate().unwrap();
        assert_eq!(validated.auth.scopes, vec!["email", "public_profile"]);
        assert_eq!(
            validated.auth.extra_params,
            vec![("auth_type".to_string(), "rerequest".to_string())]
        );
        assert!(validated.verify_state);
        assert_eq!(validated.home_url, "/");
    }
}
