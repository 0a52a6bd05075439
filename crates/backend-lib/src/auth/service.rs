use async_trait::async_trait;

use super::SessionPayload;
use crate::error::AppError;
use crate::scope::TenantId;
use crate::storage::CredentialRecord;

/// An authenticated identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub tenant_id: TenantId,
}

impl From<CredentialRecord> for Principal {
    fn from(record: CredentialRecord) -> Self {
        Self {
            username: record.username,
            tenant_id: record.tenant_id,
        }
    }
}

/// Why a login was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NotFound,
    BadPassword,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RejectReason::NotFound => "not_found",
            RejectReason::BadPassword => "bad_password",
        }
    }
}

/// Outcome of a login attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthResult {
    Accepted(Principal),
    Rejected(RejectReason),
}

/// Outcome of a registration attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    Created(Principal),
    AlreadyExists,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Check a username/password pair. Store or hasher failures are errors,
    /// a wrong password or unknown user is `Ok(AuthResult::Rejected)`.
    async fn authenticate(&self, username: &str, password: &str) -> Result<AuthResult, AppError>;

    /// Create a user whose partition is their own username
    async fn register(&self, username: &str, password: &str) -> Result<Registration, AppError>;

    /// Deserialize a session payload, `None` once the user no longer exists
    async fn restore(&self, payload: &SessionPayload) -> Result<Option<Principal>, AppError>;
}
