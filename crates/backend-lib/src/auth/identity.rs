//! Session identity: principal ↔ session token.
use std::sync::Arc;

use super::{AuthService, Principal, SessionManager, SessionPayload};
use crate::error::AppError;

/// Issues sessions for principals and restores principals from sessions
#[derive(Clone)]
pub struct SessionIdentity {
    sessions: SessionManager,
    auth: Arc<dyn AuthService>,
}

impl SessionIdentity {
    pub fn new(sessions: SessionManager, auth: Arc<dyn AuthService>) -> Self {
        Self { sessions, auth }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Only the username goes into the session
    pub fn serialize(principal: &Principal) -> SessionPayload {
        SessionPayload::from_principal(principal)
    }

    /// Re-fetch the principal a payload names
    pub async fn deserialize(&self, payload: &SessionPayload) -> Result<Option<Principal>, AppError> {
        self.auth.restore(payload).await
    }

    /// Start an authenticated session, returning the new token
    pub async fn establish(&self, previous: Option<&str>, principal: &Principal) -> String {
        self.sessions
            .login(previous, Self::serialize(principal))
            .await
    }

    /// The principal behind a request's session token, if any.
    ///
    /// A session whose user has disappeared from the store is dropped.
    pub async fn current(&self, token: Option<&str>) -> Result<Option<Principal>, AppError> {
        let Some(token) = token else {
            return Ok(None);
        };
        let Some(payload) = self.sessions.payload(token).await else {
            return Ok(None);
        };

        match self.deserialize(&payload).await? {
            Some(principal) => Ok(Some(principal)),
            None => {
                tracing::info!(username = %payload.username, "session user no longer exists");
                self.sessions.logout(token).await?;
                Ok(None)
            },
        }
    }

    pub async fn is_authenticated(&self, token: Option<&str>) -> Result<bool, AppError> {
        Ok(self.current(token).await?.is_some())
    }

    /// Invalidate the request's session
    pub async fn logout(&self, token: Option<&str>) -> Result<(), AppError> {
        match token {
            Some(token) => self.sessions.logout(token).await,
            None => Ok(()),
        }
    }
}
