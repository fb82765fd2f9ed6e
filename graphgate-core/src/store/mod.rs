//! Session storage abstraction.
//!
//! This module provides:
//! - [`Secret`] - A wrapper for sensitive values that prevents accidental logging
//! - [`SessionStore`] - Trait for the host's per-user key-value session facility
//! - [`MemorySession`] - In-memory implementation for tests and the reference server
//!
//! # Session Keys
//!
//! Graphgate only ever touches a handful of fixed keys:
//! - [`TOKEN_KEY`] - the serialized access token
//! - [`RETURN_URL_KEY`] - where to send the user after the callback
//! - [`STATE_KEY`] - the OAuth `state` issued at redirect time (when verified)
//!
//! # Example
//!
//! ```rust,ignore
//! use graphgate_core::store::{MemorySession, SessionStore, TOKEN_KEY};
//!
//! let session = MemorySession::new();
//! session.set(TOKEN_KEY, "EAAB...").await.unwrap();
//!
//! let token = session.get(TOKEN_KEY).await.unwrap();
//! assert_eq!(token.as_deref(), Some("EAAB..."));
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

mod memory;

pub use memory::MemorySession;

/// Session key holding the serialized access token.
pub const TOKEN_KEY: &str = "facebookApiToken";

/// Session key holding the location remembered by the redirect action.
pub const RETURN_URL_KEY: &str = "__returnUrl";

/// Session key holding the OAuth `state` issued by the redirect action.
pub const STATE_KEY: &str = "facebookOAuthState";

/// A secret value that prevents accidental exposure in logs.
///
/// The inner value is only accessible via [`expose()`](Secret::expose) and
/// is zeroed when dropped. Debug and Display implementations show
/// `[REDACTED]` instead of the value.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
    /// Create a new secret from a string value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the secret value.
    ///
    /// Use sparingly and never log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the secret holds an empty string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Secret {}

/// Error type for session store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The session could not be started or has been invalidated.
    #[error("session unavailable: {message}")]
    Unavailable { message: String },

    /// The storage backend encountered an error.
    #[error("backend error: {message}")]
    BackendError { message: String },
}

/// Abstraction over the host's per-user session facility.
///
/// One instance belongs to one browser session. Writes from concurrent
/// requests of the same user are last-write-wins.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read a value.
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, overwriting any existing one.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a value.
    ///
    /// Returns `Ok(())` even if the key didn't exist.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Check if a key exists without retrieving the value.
    async fn has(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_debug_redacted() {
        let secret = Secret::new("super-secret");
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_secret_display_redacted() {
        let secret = Secret::new("super-secret");
        let display = format!("{}", secret);
        assert!(!display.contains("super-secret"));
        assert!(display.contains("REDACTED"));
    }

    #[test]
    fn test_secret_expose() {
        let secret = Secret::new("app-secret");
        assert_eq!(secret.expose(), "app-secret");
        assert!(!secret.is_empty());
        assert!(Secret::new("").is_empty());
    }
}
