//! Graph provider endpoints.
//!
//! The provider exposes three URL families, all versioned:
//! - the login dialog on the web host
//! - the OAuth token endpoint on the graph host
//! - the graph API itself
//!
//! Both hosts are configurable so tests can point them at a local stub.

use serde::{Deserialize, Serialize};

/// Default graph API host.
pub const DEFAULT_GRAPH_URL: &str = "https://graph.facebook.com";

/// Default host serving the login dialog.
pub const DEFAULT_DIALOG_URL: &str = "https://www.facebook.com";

/// Base URLs of the graph provider.
///
/// # Example
///
/// ```
/// use graphgate_core::provider::GraphEndpoints;
///
/// let endpoints = GraphEndpoints::default();
/// assert_eq!(
///     endpoints.token_url("v2.10"),
///     "https://graph.facebook.com/v2.10/oauth/access_token"
/// );
/// assert_eq!(endpoints.api_url("v2.10", "me"), "https://graph.facebook.com/v2.10/me");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphEndpoints {
    /// Graph API host, e.g. `https://graph.facebook.com`.
    pub graph_url: String,

    /// Login dialog host, e.g. `https://www.facebook.com`.
    pub dialog_url: String,
}

impl GraphEndpoints {
    /// Create endpoints from explicit hosts.
    pub fn new(graph_url: impl Into<String>, dialog_url: impl Into<String>) -> Self {
        Self {
            graph_url: graph_url.into(),
            dialog_url: dialog_url.into(),
        }
    }

    /// Point both hosts at the same base URL.
    pub fn single_host(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self::new(base_url.clone(), base_url)
    }

    /// Login dialog URL for an API version.
    pub fn login_dialog_url(&self, version: &str) -> String {
        format!("{}/{}/dialog/oauth", self.dialog_url.trim_end_matches('/'), version)
    }

    /// OAuth token endpoint for an API version.
    pub fn token_url(&self, version: &str) -> String {
        format!("{}/{}/oauth/access_token", self.graph_url.trim_end_matches('/'), version)
    }

    /// Graph API URL for an endpoint path.
    ///
    /// The endpoint may be given with or without its leading slash.
    pub fn api_url(&self, version: &str, endpoint: &str) -> String {
        format!(
            "{}/{}/{}",
            self.graph_url.trim_end_matches('/'),
            version,
            endpoint.trim_start_matches('/')
        )
    }
}

impl Default for GraphEndpoints {
    fn default() -> Self {
        Self::new(DEFAULT_GRAPH_URL, DEFAULT_DIALOG_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoints() {
        let endpoints = GraphEndpoints::default();
        assert_eq!(
            endpoints.login_dialog_url("v2.10"),
            "https://www.facebook.com/v2.10/dialog/oauth"
        );
        assert_eq!(
            endpoints.api_url("v3.1", "/me/feed"),
            "https://graph.facebook.com/v3.1/me/feed"
        );
    }

    #[test]
    fn test_single_host_trims_trailing_slash() {
        let endpoints = GraphEndpoints::single_host("http://127.0.0.1:9000/");
        assert_eq!(
            endpoints.token_url("v2.10"),
            "http://127.0.0.1:9000/v2.10/oauth/access_token"
        );
        assert_eq!(
            endpoints.login_dialog_url("v2.10"),
            "http://127.0.0.1:9000/v2.10/dialog/oauth"
        );
    }
}
