//! Cookie-keyed in-memory sessions.
//!
//! Each browser gets a random session id in the `graphgate_session` cookie;
//! the id maps to one [`MemorySession`] shared by every request carrying it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use graphgate_core::MemorySession;
use parking_lot::RwLock;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "graphgate_session";

/// Idle time after which a session is dropped.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Upper bound on live sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

struct SessionEntry {
    session: Arc<MemorySession>,
    last_seen: Instant,
}

/// Registry of live sessions.
///
/// Sessions idle for longer than the idle timeout are swept whenever a new
/// one is created. At capacity the least recently seen session is evicted.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    idle_timeout: Duration,
    max_sessions: usize,
    secure_cookie: bool,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            max_sessions: DEFAULT_MAX_SESSIONS,
            secure_cookie: false,
        }
    }

    /// Drop sessions not seen for `idle_timeout`.
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Keep at most `max_sessions` sessions (at least one).
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions.max(1);
        self
    }

    /// Mark the session cookie `Secure`.
    pub fn with_secure_cookie(mut self, secure: bool) -> Self {
        self.secure_cookie = secure;
        self
    }

    /// Return the session named by the request's cookie, creating a fresh one
    /// when the cookie is absent, unknown or expired.
    pub fn resolve(&self, headers: &HeaderMap) -> (String, Arc<MemorySession>) {
        let now = Instant::now();
        let mut sessions = self.sessions.write();

        if let Some(id) = session_id_from_headers(headers) {
            if let Some(entry) = sessions.get_mut(&id) {
                if now.duration_since(entry.last_seen) < self.idle_timeout {
                    entry.last_seen = now;
                    return (id, Arc::clone(&entry.session));
                }
            }
        }

        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) < self.idle_timeout);

        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    sessions.remove(&id);
                }
                None => break,
            }
        }

        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!("Evicted {} sessions", evicted);
        }

        let id = Uuid::new_v4().to_string();
        let session = Arc::new(MemorySession::new());
        sessions.insert(
            id.clone(),
            SessionEntry {
                session: Arc::clone(&session),
                last_seen: now,
            },
        );
        tracing::debug!("Created session {}", id);
        (id, session)
    }

    /// `Set-Cookie` value binding the browser to `id`.
    pub fn cookie(&self, id: &str) -> String {
        session_cookie(id, self.secure_cookie)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.len())
            .field("idle_timeout", &self.idle_timeout)
            .field("max_sessions", &self.max_sessions)
            .field("secure_cookie", &self.secure_cookie)
            .finish()
    }
}

/// `Set-Cookie` value binding the browser to `id`.
pub fn session_cookie(id: &str, secure: bool) -> String {
    let mut cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id);
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Extract the session id from every `Cookie` header on the request.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
