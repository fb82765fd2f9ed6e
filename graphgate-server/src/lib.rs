//! Graphgate Server Library
//!
//! This library exposes the server's routes, sessions and configuration for
//! testing and embedding in other applications.

pub mod api;
pub mod config;
pub mod session;

pub use api::{AppState, ServerHandle, router, start_server};
pub use config::{ServerConfig, load_config, load_from_path};
pub use session::SessionRegistry;
