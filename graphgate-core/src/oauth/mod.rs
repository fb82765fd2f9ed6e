//! OAuth 2.0 authorization-code flow.
//!
//! This module provides:
//! - [`code_flow`] - the redirect/callback state machine ([`AuthFlow`])
//! - [`create_oauth_client`] - an `oauth2` client wired to the graph endpoints

pub mod code_flow;

pub use code_flow::{AuthFlow, FlowState, LoginRedirect};

use oauth2::{
    basic::BasicClient, AuthType, AuthUrl, ClientId, ClientSecret, RedirectUrl, TokenUrl,
};

use crate::error::ClientInitError;
use crate::model::Credentials;
use crate::provider::GraphEndpoints;

/// Create an OAuth2 client for the credentials' API version.
///
/// # Arguments
///
/// * `endpoints` - Provider hosts
/// * `credentials` - App id, secret and default API version
/// * `redirect_uri` - Redirect URI used for the login URL and the code exchange
///
/// The app secret is sent in the request body; the provider does not accept
/// HTTP basic auth on its token endpoint.
pub fn create_oauth_client(
    endpoints: &GraphEndpoints,
    credentials: &Credentials,
    redirect_uri: Option<&str>,
) -> Result<BasicClient, ClientInitError> {
    let version = credentials.api_version();

    let auth_url = AuthUrl::new(endpoints.login_dialog_url(version)).map_err(|e| {
        ClientInitError::InvalidUrl {
            endpoint: "login dialog",
            message: e.to_string(),
        }
    })?;

    let token_url =
        TokenUrl::new(endpoints.token_url(version)).map_err(|e| ClientInitError::InvalidUrl {
            endpoint: "token",
            message: e.to_string(),
        })?;

    let mut client = BasicClient::new(
        ClientId::new(credentials.app_id().to_string()),
        Some(ClientSecret::new(
            credentials.app_secret().expose().to_string(),
        )),
        auth_url,
        Some(token_url),
    )
    .set_auth_type(AuthType::RequestBody);

    if let Some(redirect) = redirect_uri {
        let redirect_url =
            RedirectUrl::new(redirect.to_string()).map_err(|e| ClientInitError::InvalidUrl {
                endpoint: "redirect",
                message: e.to_string(),
            })?;
        client = client.set_redirect_uri(redirect_url);
    }

    Ok(client)
}

/// Generate a random alphanumeric string of the specified length.
///
/// Used for the OAuth `state` parameter.
pub fn generate_random_string(length: usize) -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::thread_rng();

    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}
