//! End-to-end tests for the auth routes.
//!
//! A real server is bound on a loopback port and driven with reqwest, with
//! the provider stubbed by wiremock.

use graphgate_core::ClientConfig;
use graphgate_server::{AppState, ServerHandle, start_server};
use reqwest::StatusCode;
use reqwest::header::{COOKIE, LOCATION, REFERER, SET_COOKIE};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, method, path},
};

const REDIRECT_URI: &str = "https://app.example/facebook/auth/oauth-callback";

async fn start(provider_uri: &str, verify_state: bool) -> ServerHandle {
    let config = ClientConfig {
        graph_url: provider_uri.to_string(),
        dialog_url: provider_uri.to_string(),
        scopes: vec!["email".to_string()],
        verify_state,
        ..ClientConfig::new("test-app", "test-secret", REDIRECT_URI)
    }
    .validate()
    .expect("valid config");

    start_server(
        "127.0.0.1:0".parse().unwrap(),
        AppState::new(config),
        "facebook",
    )
    .await
    .expect("Failed to start server")
}

fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// The `name=value` part of the session cookie.
fn cookie_pair(response: &reqwest::Response) -> String {
    let header = response
        .headers()
        .get(SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .unwrap();
    header.split(';').next().unwrap().to_string()
}

fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(LOCATION)
        .expect("Location header")
        .to_str()
        .unwrap()
        .to_string()
}

async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v2.10/oauth/access_token"))
        .and(body_string_contains("code=good-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "EAAB-fresh",
            "token_type": "bearer",
            "expires_in": 3600
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2.10/oauth/access_token"))
        .and(body_string_contains("code=bad-code"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "message": "Invalid verification code format.",
                "type": "OAuthException",
                "code": 100
            }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_redirect_sends_browser_to_login_dialog() {
    let provider = MockServer::start().await;
    let server = start(&provider.uri(), false).await;
    let base = format!("http://{}", server.local_addr());

    let response = http_client()
        .get(format!("{}/facebook/auth/redirect", base))
        .header(REFERER, "https://app.example/profile")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    let login_url = location(&response);
    assert!(login_url.starts_with(&format!("{}/v2.10/dialog/oauth", provider.uri())));
    assert!(login_url.contains("client_id=test-app"));
    assert!(cookie_pair(&response).starts_with("graphgate_session="));
    assert!(response.text().await.unwrap().is_empty());

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_callback_returns_to_referrer() {
    let provider = MockServer::start().await;
    mount_token_endpoint(&provider).await;
    let server = start(&provider.uri(), false).await;
    let base = format!("http://{}", server.local_addr());
    let client = http_client();

    let redirect = client
        .get(format!("{}/facebook/auth/redirect", base))
        .header(REFERER, "https://app.example/profile")
        .send()
        .await
        .unwrap();
    let cookie = cookie_pair(&redirect);

    let callback = client
        .get(format!(
            "{}/facebook/auth/oauth-callback?code=good-code&state=ignored",
            base
        ))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();

    assert_eq!(callback.status(), StatusCode::FOUND);
    assert_eq!(location(&callback), "https://app.example/profile");
    assert_eq!(cookie_pair(&callback), cookie);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_callback_without_session_goes_home() {
    let provider = MockServer::start().await;
    mount_token_endpoint(&provider).await;
    let server = start(&provider.uri(), false).await;

    let response = http_client()
        .get(format!(
            "http://{}/facebook/auth/oauth-callback?code=good-code",
            server.local_addr()
        ))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_failed_exchange_is_server_error_with_message() {
    let provider = MockServer::start().await;
    mount_token_endpoint(&provider).await;
    let server = start(&provider.uri(), false).await;

    let response = http_client()
        .get(format!(
            "http://{}/facebook/auth/oauth-callback?code=bad-code",
            server.local_addr()
        ))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.text().await.unwrap();
    assert!(body.contains("Invalid verification code format."));

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_missing_code_is_server_error() {
    let provider = MockServer::start().await;
    let server = start(&provider.uri(), false).await;

    let response = http_client()
        .get(format!(
            "http://{}/facebook/auth/oauth-callback",
            server.local_addr()
        ))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_state_verification_rejects_forged_state() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&provider)
        .await;
    let server = start(&provider.uri(), true).await;
    let base = format!("http://{}", server.local_addr());
    let client = http_client();

    let redirect = client
        .get(format!("{}/facebook/auth/redirect", base))
        .send()
        .await
        .unwrap();
    let cookie = cookie_pair(&redirect);

    let callback = client
        .get(format!(
            "{}/facebook/auth/oauth-callback?code=good-code&state=forged",
            base
        ))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();

    assert_eq!(callback.status(), StatusCode::INTERNAL_SERVER_ERROR);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let provider = MockServer::start().await;
    let server = start(&provider.uri(), false).await;

    let response = http_client()
        .get(format!("http://{}/twitter/auth/redirect", server.local_addr()))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    server.stop().await.unwrap();
}
