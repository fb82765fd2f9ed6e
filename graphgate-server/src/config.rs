//! Server configuration handling.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use graphgate_core::ClientConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::session::{DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_SESSIONS, SessionRegistry};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV_VAR: &str = "GRAPHGATE_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// First path segment of the auth routes (`/<prefix>/auth/...`).
    #[serde(default = "default_route_prefix")]
    pub route_prefix: String,

    /// Logging level, used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Seconds a session may sit idle before it is dropped.
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,

    /// Maximum number of live sessions.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Mark the session cookie `Secure`; enable when served over HTTPS.
    #[serde(default)]
    pub secure_cookie: bool,

    /// The graph client component. Required.
    pub client: ClientConfig,

    /// Path to the configuration file that was loaded.
    #[serde(skip)]
    pub config_path: PathBuf,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_route_prefix() -> String {
    "facebook".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_session_idle_secs() -> u64 {
    DEFAULT_IDLE_TIMEOUT.as_secs()
}

fn default_max_sessions() -> usize {
    DEFAULT_MAX_SESSIONS
}

impl ServerConfig {
    /// Route prefix without surrounding slashes.
    pub fn prefix(&self) -> &str {
        self.route_prefix.trim_matches('/')
    }

    /// Session registry configured from this file.
    pub fn session_registry(&self) -> SessionRegistry {
        SessionRegistry::new()
            .with_idle_timeout(Duration::from_secs(self.session_idle_secs))
            .with_max_sessions(self.max_sessions)
            .with_secure_cookie(self.secure_cookie)
    }
}

/// Load configuration from `explicit`, `GRAPHGATE_CONFIG`, or the default
/// location, in that order.
pub fn load_config(explicit: Option<&Path>) -> Result<ServerConfig> {
    let config_path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => PathBuf::from(path),
            None => default_config_path(),
        },
    };

    load_from_path(&config_path)
}

/// Load and parse a configuration file.
///
/// The `[client]` table has no default, so a missing file is an error.
pub fn load_from_path(config_path: &Path) -> Result<ServerConfig> {
    let contents = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config from {:?}", config_path))?;

    let mut config: ServerConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config from {:?}", config_path))?;

    config.config_path = config_path.to_path_buf();
    Ok(config)
}

fn default_config_path() -> PathBuf {
    project_dirs()
        .map(|d| d.config_dir().join("server.toml"))
        .unwrap_or_else(|| PathBuf::from("graphgate-server.toml"))
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "raibid-labs", "graphgate")
}
