// ============================
// crates/backend-lib/src/auth/session.rs
// ============================
//! Session token handling and management.
//!
//! A session maps an opaque cookie token to the username it was issued for
//! (nothing else about the user is kept here) plus any pending flash
//! messages. Anonymous sessions exist only to carry flash messages: they
//! live for minutes, their number is capped and they vanish once read.
use metrics::{counter, gauge};
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, SystemTime},
};
use tokio::sync::RwLock;

use super::token_generator::generate_secure_token;
use super::Principal;
use crate::error::AppError;
use crate::metrics::{SESSION_ACTIVE, SESSION_CREATED, SESSION_EVICTED, SESSION_EXPIRED};

/// Default session TTL (time to live)
pub const SESSION_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 7); // 7 days

/// Anonymous sessions only carry a flash message to the next page
pub const ANONYMOUS_TTL: Duration = Duration::from_secs(5 * 60);

/// Default cap on live anonymous sessions
pub const MAX_ANONYMOUS_SESSIONS: usize = 10_000;

/// What a session remembers about its principal
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionPayload {
    pub username: String,
}

impl SessionPayload {
    /// Serialize a principal into a session payload
    pub fn from_principal(principal: &Principal) -> Self {
        Self {
            username: principal.username.clone(),
        }
    }
}

/// Session information
#[derive(Clone, Debug)]
pub struct Session {
    /// `None` for an anonymous session
    pub payload: Option<SessionPayload>,
    pub flash: Vec<String>,
    pub created_at: SystemTime,
    pub expires_at: SystemTime,
}

impl Session {
    fn new(payload: Option<SessionPayload>, ttl: Duration) -> Self {
        let now = SystemTime::now();
        Self {
            payload,
            flash: Vec::new(),
            created_at: now,
            expires_at: now + ttl,
        }
    }

    fn is_live(&self, now: SystemTime) -> bool {
        now < self.expires_at
    }
}

/// Session manager for handling session tokens
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
    /// Lifetime of an anonymous, flash-only session
    anonymous_ttl: Duration,
    /// Upper bound on live anonymous sessions
    max_anonymous: usize,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(SESSION_TTL)
    }
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(ttl: Duration) -> Self {
        SessionManager {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            anonymous_ttl: ANONYMOUS_TTL.min(ttl),
            max_anonymous: MAX_ANONYMOUS_SESSIONS,
        }
    }

    /// Override the lifetime and count limit of anonymous sessions
    pub fn with_anonymous_limits(mut self, ttl: Duration, max: usize) -> Self {
        self.anonymous_ttl = ttl;
        self.max_anonymous = max.max(1);
        self
    }

    /// Start an authenticated session.
    ///
    /// Any session the client already had is discarded and a fresh token is
    /// issued, so a token handed out before login never becomes authenticated.
    pub async fn login(&self, previous: Option<&str>, payload: SessionPayload) -> String {
        let token = generate_secure_token();
        let mut sessions = self.sessions.write().await;
        if let Some(old) = previous {
            sessions.remove(old);
        }
        sessions.insert(token.clone(), Session::new(Some(payload), self.ttl));

        counter!(SESSION_CREATED).increment(1);
        gauge!(SESSION_ACTIVE).set(sessions.len() as f64);

        token
    }

    /// Get a live session by token
    pub async fn get(&self, token: &str) -> Option<Session> {
        let sessions = self.sessions.read().await;
        sessions
            .get(token)
            .filter(|s| s.is_live(SystemTime::now()))
            .cloned()
    }

    /// The payload of a live authenticated session
    pub async fn payload(&self, token: &str) -> Option<SessionPayload> {
        self.get(token).await.and_then(|s| s.payload)
    }

    /// Invalidate a session. Unknown tokens are already logged out.
    pub async fn logout(&self, token: &str) -> Result<(), AppError> {
        let mut sessions = self.sessions.write().await;
        if sessions.remove(token).is_some() {
            tracing::debug!("session invalidated");
        }
        gauge!(SESSION_ACTIVE).set(sessions.len() as f64);
        Ok(())
    }

    /// Queue a one-shot message on the client's session.
    ///
    /// Returns the token the message was stored under: the existing one if it
    /// is still live, otherwise a new anonymous session.
    pub async fn push_flash(&self, token: Option<&str>, message: impl Into<String>) -> String {
        let now = SystemTime::now();
        let mut sessions = self.sessions.write().await;

        if let Some(token) = token {
            if let Some(session) = sessions.get_mut(token).filter(|s| s.is_live(now)) {
                session.flash.push(message.into());
                return token.to_string();
            }
        }

        self.make_room_for_anonymous(&mut sessions, now);

        let token = generate_secure_token();
        let mut session = Session::new(None, self.anonymous_ttl);
        session.flash.push(message.into());
        sessions.insert(token.clone(), session);
        gauge!(SESSION_ACTIVE).set(sessions.len() as f64);
        token
    }

    /// Keep the anonymous session count below `max_anonymous`, dropping
    /// expired ones first and then the oldest.
    fn make_room_for_anonymous(&self, sessions: &mut HashMap<String, Session>, now: SystemTime) {
        let anonymous = sessions.values().filter(|s| s.payload.is_none()).count();
        if anonymous < self.max_anonymous {
            return;
        }

        sessions.retain(|_, s| s.payload.is_some() || s.is_live(now));
        let mut anonymous: Vec<(SystemTime, String)> = sessions
            .iter()
            .filter(|(_, s)| s.payload.is_none())
            .map(|(token, s)| (s.created_at, token.clone()))
            .collect();
        if anonymous.len() < self.max_anonymous {
            return;
        }

        anonymous.sort();
        let excess = anonymous.len() + 1 - self.max_anonymous;
        for (_, token) in anonymous.into_iter().take(excess) {
            sessions.remove(&token);
        }
        counter!(SESSION_EVICTED).increment(excess as u64);
        tracing::warn!(evicted = excess, "anonymous session limit reached");
    }

    /// Remove and return pending flash messages.
    ///
    /// An anonymous session exists only for its messages and is dropped
    /// once they are read.
    pub async fn take_flash(&self, token: &str) -> Vec<String> {
        let now = SystemTime::now();
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(token).filter(|s| s.is_live(now)) else {
            return Vec::new();
        };
        let flash = std::mem::take(&mut session.flash);
        if session.payload.is_none() {
            sessions.remove(token);
            gauge!(SESSION_ACTIVE).set(sessions.len() as f64);
        }
        flash
    }

    /// Drop expired sessions, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let now = SystemTime::now();
        let before_count = sessions.len();

        sessions.retain(|_, session| session.is_live(now));

        let after_count = sessions.len();
        let removed = before_count - after_count;

        if removed > 0 {
            counter!(SESSION_EXPIRED).increment(removed as u64);
            gauge!(SESSION_ACTIVE).set(after_count as f64);
            tracing::debug!(removed, "purged expired sessions");
        }
        removed
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
