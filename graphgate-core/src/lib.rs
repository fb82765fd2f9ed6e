//! # Graphgate Core
//!
//! OAuth2 login and authenticated calls against a social-graph API.
//!
//! This crate provides:
//! - Validated configuration and credentials
//! - A session-scoped access token slot over a pluggable session facility
//! - A lazily built, memoized graph client per component instance
//! - The authorization-code flow (login URL, code exchange)
//! - A request proxy that normalizes every response into one envelope
//! - Framework-independent redirect and callback actions
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use graphgate_core::{ClientConfig, GraphComponent, GraphRequest, SessionStore};
//!
//! async fn whoami(session: Arc<dyn SessionStore>) -> Result<(), graphgate_core::GraphgateError> {
//!     let config = ClientConfig::new("app-id", "app-secret", "https://example.com/cb").validate()?;
//!     let component = GraphComponent::new(&config, Some(session));
//!
//!     let response = component.proxy().request(GraphRequest::get("/me")).await?;
//!     println!("{}", response.decoded_body);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod component;
pub mod config;
pub mod controller;
pub mod error;
pub mod factory;
pub mod model;
pub mod oauth;
pub mod provider;
pub mod proxy;
pub mod store;
pub mod token;

// Re-export commonly used types at crate root
pub use model::{AuthRequestOptions, Credentials, DEFAULT_API_VERSION};

pub use store::{MemorySession, Secret, SessionStore, StoreError};

pub use token::{AccessToken, TokenStore};

pub use client::{
    GraphApi, GraphClientBuilder, GraphRequest, GraphResponse, HttpGraphClient,
    HttpGraphClientBuilder, HttpMethod,
};

pub use config::{ClientConfig, ValidatedConfig};

pub use factory::ApiClientFactory;

pub use oauth::{AuthFlow, FlowState, LoginRedirect};

pub use proxy::{NormalizedResponse, RequestProxy};

pub use controller::{AuthController, ControllerResponse};

pub use component::GraphComponent;

pub use error::{
    ApiRequestError, AuthExchangeError, ClientInitError, ConfigError, GraphgateError,
};
