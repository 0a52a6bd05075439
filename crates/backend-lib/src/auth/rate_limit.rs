// ============================
// crates/backend-lib/src/auth/rate_limit.rs
// ============================
//! Opt-in lockout after repeated failed logins for one username.
//!
//! Off by default: plain deployments have no lockout, see
//! `LockoutSettings::enabled`.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::LockoutSettings;

/// Entry in the lockout map
#[derive(Debug, Clone)]
struct LockoutEntry {
    /// Number of failed attempts
    failed_attempts: u32,
    /// Time of the last failed attempt
    last_failure: Instant,
    /// When the lockout expires, if locked
    lockout_expiry: Option<Instant>,
}

/// Failed-login tracker keyed by username
#[derive(Debug, Clone)]
pub struct LoginLockout {
    attempts: Arc<DashMap<String, LockoutEntry>>,
    /// Maximum number of failed attempts before lockout
    max_attempts: u32,
    /// Duration of lockout period
    lockout_duration: Duration,
}

impl LoginLockout {
    pub fn new(max_attempts: u32, lockout_duration: Duration) -> Self {
        Self {
            attempts: Arc::new(DashMap::new()),
            max_attempts,
            lockout_duration,
        }
    }

    /// Build from settings, `None` when lockout is disabled
    pub fn from_settings(settings: &LockoutSettings) -> Option<Self> {
        settings.enabled.then(|| {
            Self::new(
                settings.max_attempts,
                Duration::from_secs(settings.lockout_secs),
            )
        })
    }

    /// Record a failed authentication attempt
    pub fn record_failed_attempt(&self, username: &str) {
        let now = Instant::now();

        let mut entry = self
            .attempts
            .entry(username.to_string())
            .or_insert_with(|| LockoutEntry {
                failed_attempts: 0,
                last_failure: now,
                lockout_expiry: None,
            });

        // A lapsed lockout starts a fresh count
        if entry.lockout_expiry.is_some_and(|expiry| now >= expiry) {
            entry.failed_attempts = 0;
            entry.lockout_expiry = None;
        }

        entry.failed_attempts += 1;
        entry.last_failure = now;

        if entry.failed_attempts >= self.max_attempts && entry.lockout_expiry.is_none() {
            entry.lockout_expiry = Some(now + self.lockout_duration);
            tracing::warn!(
                username,
                lockout_secs = self.lockout_duration.as_secs(),
                "username locked after repeated failed logins"
            );
        }
    }

    /// Record a successful authentication
    pub fn record_success(&self, username: &str) {
        self.attempts.remove(username);
    }

    /// Whether `username` may attempt to log in right now
    pub fn check(&self, username: &str) -> bool {
        match self.attempts.get(username) {
            Some(entry) => match entry.lockout_expiry {
                Some(expiry) => Instant::now() >= expiry,
                None => true,
            },
            None => true,
        }
    }

    /// Drop lapsed lockouts and stale failure counts
    pub fn cleanup(&self) {
        let now = Instant::now();

        self.attempts.retain(|_, entry| {
            if let Some(expiry) = entry.lockout_expiry {
                return now < expiry;
            }
            // Otherwise, keep entries for a day
            now.duration_since(entry.last_failure) < Duration::from_secs(24 * 60 * 60)
        });
    }
}
