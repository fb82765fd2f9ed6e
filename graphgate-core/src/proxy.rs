//! Request proxy and response normalization.
//!
//! Every graph call made on behalf of the host goes through
//! [`RequestProxy::request`], which resolves the memoized client, makes sure
//! the session token is attached, and maps the provider's answer into a
//! [`NormalizedResponse`].

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::client::{GraphRequest, GraphResponse};
use crate::error::ApiRequestError;
use crate::factory::ApiClientFactory;

/// Content type reported for every normalized response.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Uniform envelope for a proxied graph response.
///
/// `decoded_body` is JSON `null` when the raw body is empty or not JSON;
/// `raw_body` always carries the body as received.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedResponse {
    pub status_code: u16,
    /// Header names lower-cased; repeated headers folded with `", "`.
    pub headers: BTreeMap<String, String>,
    pub content_type: &'static str,
    pub decoded_body: serde_json::Value,
    pub raw_body: String,
}

impl NormalizedResponse {
    /// Normalize a raw provider response.
    ///
    /// Fails with [`ApiRequestError::Provider`] when the body carries an
    /// `error` object or the status is 400 or above.
    pub fn from_graph_response(response: GraphResponse) -> Result<Self, ApiRequestError> {
        let GraphResponse {
            status,
            headers,
            body,
        } = response;

        let decoded_body = decode_body(&body);

        if let Some(error) = decoded_body.get("error").filter(|e| e.is_object()) {
            return Err(ApiRequestError::Provider {
                status,
                code: error.get("code").and_then(|c| c.as_i64()),
                message: error
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or("unknown graph API error")
                    .to_string(),
            });
        }

        if status >= 400 {
            return Err(ApiRequestError::Provider {
                status,
                code: None,
                message: format!("provider responded with HTTP {}", status),
            });
        }

        Ok(Self {
            status_code: status,
            headers: fold_headers(headers),
            content_type: JSON_CONTENT_TYPE,
            decoded_body,
            raw_body: body,
        })
    }
}

fn decode_body(body: &str) -> serde_json::Value {
    if body.trim().is_empty() {
        return serde_json::Value::Null;
    }
    match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!("Response body is not JSON, decoded body left null: {}", e);
            serde_json::Value::Null
        }
    }
}

fn fold_headers(headers: Vec<(String, String)>) -> BTreeMap<String, String> {
    let mut folded: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        folded
            .entry(name.to_ascii_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    folded
}

/// Forwards graph calls through the memoized client.
#[derive(Debug, Clone)]
pub struct RequestProxy {
    factory: Arc<ApiClientFactory>,
}

impl RequestProxy {
    /// Create a proxy over the given client factory.
    pub fn new(factory: Arc<ApiClientFactory>) -> Self {
        Self { factory }
    }

    /// Send a graph request and normalize the result.
    ///
    /// Requests without an explicit token use the session token, which is
    /// attached to the client before the call. Errors are never retried.
    pub async fn request(&self, request: GraphRequest) -> Result<NormalizedResponse, ApiRequestError> {
        let client = self.factory.client().await?;

        if request.access_token.is_none() {
            if let Some(token) = self.factory.tokens().get().await {
                client.set_default_token(token);
            }
        }

        let method = request.method;
        let endpoint = request.endpoint.clone();

        let result = client
            .send_request(&request)
            .await
            .and_then(NormalizedResponse::from_graph_response);

        match &result {
            Ok(response) => tracing::debug!(
                "Graph request {} {} returned {}",
                method,
                endpoint,
                response.status_code
            ),
            Err(e) => tracing::warn!("Graph request {} {} failed: {}", method, endpoint, e),
        }

        result
    }

    /// Send a request given its parts.
    ///
    /// `method` is one of `GET`, `POST` or `DELETE`, case-insensitive.
    pub async fn send(
        &self,
        method: &str,
        endpoint: &str,
        params: BTreeMap<String, serde_json::Value>,
    ) -> Result<NormalizedResponse, ApiRequestError> {
        let request = GraphRequest::new(method.parse()?, endpoint).with_params(params);
        self.request(request).await
    }
}
