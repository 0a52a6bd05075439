// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core of the parish registry server: authentication, sessions,
//! per-parish scoping of student records and the HTTP layer on top.

pub mod auth;
pub mod config;
pub mod cookies;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod router;
pub mod scope;
pub mod storage;
pub mod timeout;
pub mod validation;
pub mod views;

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use tokio::task::JoinHandle;

use crate::auth::{
    AuthService, DefaultAuth, LoginLockout, PasswordHasher, Principal, SessionIdentity,
    SessionManager,
};
use crate::config::Settings;
use crate::error::AppError;
use crate::scope::ParishScope;
use crate::storage::{Storage, TimedStorage};
use crate::views::Views;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Authentication service
    pub auth: Arc<dyn AuthService>,
    /// Session identity (sessions + principal restore)
    pub identity: SessionIdentity,
    /// Settings
    pub settings: Arc<Settings>,
    /// Storage backend, every call bounded by the operation timeout
    pub storage: Arc<dyn Storage>,
    /// Page templates
    pub views: Arc<Views>,
    /// Failed-login tracker, when enabled
    pub lockout: Option<LoginLockout>,
}

impl AppState {
    /// Create a new application state
    pub fn new(storage: Arc<dyn Storage>, settings: Settings) -> Result<Self, AppError> {
        let timeout = settings.operation_timeout();
        let storage: Arc<dyn Storage> = Arc::new(TimedStorage::new(storage, timeout));
        let hasher = PasswordHasher::new(settings.hash_cost, timeout)?;
        let lockout = LoginLockout::from_settings(&settings.login_lockout);

        let auth: Arc<dyn AuthService> =
            Arc::new(DefaultAuth::new(storage.clone(), hasher).with_lockout(lockout.clone()));
        let sessions = SessionManager::new(settings.session_ttl())
            .with_anonymous_limits(settings.anonymous_session_ttl(), settings.max_anonymous_sessions);
        let identity = SessionIdentity::new(sessions, auth.clone());

        Ok(Self {
            auth,
            identity,
            settings: Arc::new(settings),
            storage,
            views: Arc::new(Views::new()?),
            lockout,
        })
    }

    /// Student access for `principal`'s parish
    pub fn scope(&self, principal: &Principal) -> ParishScope {
        ParishScope::for_principal(principal, self.storage.clone())
    }

    pub fn session_cookie(&self, token: &str) -> Result<HeaderValue, AppError> {
        cookies::session_cookie(
            &self.settings.session_cookie,
            token,
            self.settings.session_ttl(),
            self.settings.secure_cookie,
        )
    }

    pub fn clear_session_cookie(&self) -> Result<HeaderValue, AppError> {
        cookies::expired_cookie(&self.settings.session_cookie)
    }

    /// Spawn the task that purges expired sessions and lapsed lockouts
    pub fn spawn_maintenance(&self, interval: Duration) -> JoinHandle<()> {
        let sessions = self.identity.sessions().clone();
        let lockout = self.lockout.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                sessions.purge_expired().await;
                if let Some(lockout) = &lockout {
                    lockout.cleanup();
                }
            }
        })
    }
}
