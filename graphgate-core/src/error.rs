//! Error types for Graphgate.
//!
//! Each component surfaces its own error kind:
//! - [`ConfigError`] - invalid configuration, raised while validating
//! - [`ClientInitError`] - the graph client could not be constructed
//! - [`AuthExchangeError`] - the authorization code could not be exchanged
//! - [`ApiRequestError`] - a proxied graph call failed
//!
//! [`GraphgateError`] aggregates all of them for callers that do not care
//! which stage failed.

use thiserror::Error;

use crate::store::StoreError;

/// Missing or invalid configuration.
///
/// Fatal: no component is built from a configuration that fails validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A mandatory parameter is absent or empty.
    #[error("the \"{param}\" param is mandatory")]
    Missing { param: &'static str },

    /// Structured credentials could not be parsed or lack a required key.
    #[error("the client credentials are invalid: {message}")]
    InvalidCredentials { message: String },

    /// A parameter is present but malformed.
    #[error("invalid {param}: {message}")]
    Invalid { param: &'static str, message: String },
}

/// The underlying graph client could not be constructed.
#[derive(Debug, Error)]
pub enum ClientInitError {
    /// An endpoint derived from the configuration is not a valid URL.
    #[error("invalid {endpoint} URL: {message}")]
    InvalidUrl { endpoint: &'static str, message: String },

    /// The HTTP transport could not be built.
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// The authorization-code exchange failed.
///
/// Authorization codes are single use, so none of these are retried.
#[derive(Debug, Error)]
pub enum AuthExchangeError {
    /// The callback carried no authorization code.
    #[error("no authorization code was supplied")]
    MissingCode,

    /// The callback `state` does not match the one issued at redirect time.
    #[error("state parameter mismatch")]
    StateMismatch,

    /// The provider rejected the code (invalid, expired, redirect URI mismatch).
    #[error("token exchange rejected: {message}")]
    Rejected { message: String },

    /// The provider could not be reached.
    #[error("token exchange transport failure: {message}")]
    Transport { message: String },

    /// The client needed for the exchange could not be built.
    #[error(transparent)]
    ClientInit(#[from] ClientInitError),
}

/// A proxied graph call failed.
#[derive(Debug, Error)]
pub enum ApiRequestError {
    /// The provider answered with an error.
    #[error("graph API error (status {status}): {message}")]
    Provider {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    /// Neither an explicit nor a default access token was available.
    #[error("you must provide an access token")]
    MissingAccessToken,

    /// The request itself is malformed (unknown method, bad endpoint).
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// The provider could not be reached or the response could not be read.
    #[error("transport failure: {message}")]
    Transport { message: String },

    /// The client needed for the call could not be built.
    #[error(transparent)]
    ClientInit(#[from] ClientInitError),
}

impl ApiRequestError {
    /// HTTP status reported by the provider, if the call reached it.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Provider { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Top-level error type encompassing all Graphgate errors.
#[derive(Debug, Error)]
pub enum GraphgateError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("client initialization error: {0}")]
    ClientInit(#[from] ClientInitError),

    #[error("auth exchange error: {0}")]
    AuthExchange(#[from] AuthExchangeError),

    #[error("API request error: {0}")]
    ApiRequest(#[from] ApiRequestError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
