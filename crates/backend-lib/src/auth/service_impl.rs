use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;

use super::{
    AuthResult, AuthService, LoginLockout, PasswordHasher, Principal, Registration, RejectReason,
    SessionPayload,
};
use crate::error::AppError;
use crate::metrics::{AUTH_LOGIN_ACCEPTED, AUTH_LOGIN_REJECTED, AUTH_REGISTER};
use crate::scope::TenantId;
use crate::storage::{CredentialRecord, Storage};

/// Username/password authentication against the credential store
pub struct DefaultAuth {
    storage: Arc<dyn Storage>,
    hasher: PasswordHasher,
    lockout: Option<LoginLockout>,
}

impl DefaultAuth {
    pub fn new(storage: Arc<dyn Storage>, hasher: PasswordHasher) -> Self {
        Self {
            storage,
            hasher,
            lockout: None,
        }
    }

    pub fn with_lockout(mut self, lockout: Option<LoginLockout>) -> Self {
        self.lockout = lockout;
        self
    }

    async fn check_credentials(&self, username: &str, password: &str) -> Result<AuthResult, AppError> {
        let Some(record) = self.storage.find_user(username).await? else {
            // Same hash work as a wrong password
            self.hasher.verify_decoy(password).await?;
            return Ok(AuthResult::Rejected(RejectReason::NotFound));
        };

        if self.hasher.verify(password, &record.password_hash).await? {
            Ok(AuthResult::Accepted(record.into()))
        } else {
            Ok(AuthResult::Rejected(RejectReason::BadPassword))
        }
    }
}

#[async_trait]
impl AuthService for DefaultAuth {
    async fn authenticate(&self, username: &str, password: &str) -> Result<AuthResult, AppError> {
        if let Some(lockout) = &self.lockout {
            if !lockout.check(username) {
                return Err(AppError::AuthRateLimited);
            }
        }

        let result = self.check_credentials(username, password).await?;

        match &result {
            AuthResult::Accepted(principal) => {
                counter!(AUTH_LOGIN_ACCEPTED).increment(1);
                tracing::info!(username = %principal.username, "login accepted");
                if let Some(lockout) = &self.lockout {
                    lockout.record_success(username);
                }
            },
            AuthResult::Rejected(reason) => {
                counter!(AUTH_LOGIN_REJECTED, "reason" => reason.as_str()).increment(1);
                tracing::warn!(username, reason = reason.as_str(), "login rejected");
                if let Some(lockout) = &self.lockout {
                    lockout.record_failed_attempt(username);
                }
            },
        }

        Ok(result)
    }

    async fn register(&self, username: &str, password: &str) -> Result<Registration, AppError> {
        if self.storage.find_user(username).await?.is_some() {
            return Ok(Registration::AlreadyExists);
        }

        let password_hash = self.hasher.hash(password).await?;
        let record = CredentialRecord {
            username: username.to_string(),
            password_hash,
            tenant_id: TenantId::new(username),
        };

        match self.storage.insert_user(record.clone()).await {
            Ok(()) => {},
            // Lost a race with a concurrent registration
            Err(AppError::Conflict(_)) => return Ok(Registration::AlreadyExists),
            Err(e) => return Err(e),
        }

        counter!(AUTH_REGISTER).increment(1);
        tracing::info!(username, "user registered");
        Ok(Registration::Created(record.into()))
    }

    async fn restore(&self, payload: &SessionPayload) -> Result<Option<Principal>, AppError> {
        Ok(self
            .storage
            .find_user(&payload.username)
            .await?
            .map(Principal::from))
    }
}
