//! Route handlers mapping [`ControllerResponse`] onto HTTP.

use axum::Router;
use axum::extract::{Query, State};
use axum::http::header::{LOCATION, REFERER, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use graphgate_core::ControllerResponse;
use serde::Deserialize;
use tracing::{debug, warn};

use super::AppState;

/// Query string of the provider's callback.
#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
}

/// Build the router serving `/<prefix>/auth/redirect` and
/// `/<prefix>/auth/oauth-callback`.
pub fn router(state: AppState, prefix: &str) -> Router {
    let base = match prefix.trim_matches('/') {
        "" => String::new(),
        prefix => format!("/{}", prefix),
    };

    Router::new()
        .route(&format!("{}/auth/redirect", base), get(auth_redirect))
        .route(&format!("{}/auth/oauth-callback", base), get(oauth_callback))
        .with_state(state)
}

async fn auth_redirect(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (session_id, session) = state.sessions().resolve(&headers);
    let referrer = headers.get(REFERER).and_then(|v| v.to_str().ok());

    debug!("Starting login for session {}", session_id);
    let outcome = state.component(session).controller().redirect(referrer).await;

    respond(outcome, state.sessions().cookie(&session_id))
}

async fn oauth_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    let (session_id, session) = state.sessions().resolve(&headers);

    let outcome = state
        .component(session)
        .controller()
        .oauth_callback(params.code.as_deref(), params.state.as_deref())
        .await;

    respond(outcome, state.sessions().cookie(&session_id))
}

fn respond(outcome: ControllerResponse, cookie: String) -> Response {
    match outcome {
        ControllerResponse::Redirect { location } => (
            StatusCode::FOUND,
            [(LOCATION, location), (SET_COOKIE, cookie)],
        )
            .into_response(),
        ControllerResponse::ServerError { message } => {
            warn!("Auth route failed: {}", message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(SET_COOKIE, cookie)],
                message,
            )
                .into_response()
        }
    }
}
