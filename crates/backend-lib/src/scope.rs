// ============================
// crates/backend-lib/src/scope.rs
// ============================
//! Authorization scoping.
//!
//! Student records are partitioned by parish. A [`ParishScope`] can only be
//! built from an authenticated [`Principal`], and every storage call it makes
//! passes that principal's tenant id. Handlers never see a tenant id that
//! came from the request body.

use std::fmt;
use std::sync::Arc;

use parish_common::{Student, StudentDetails, StudentId};
use serde::{Deserialize, Serialize};

use crate::auth::Principal;
use crate::error::AppError;
use crate::storage::Storage;

/// Partition key for per-parish records
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The partition a principal may read and write
pub fn scope_filter(principal: &Principal) -> &TenantId {
    &principal.tenant_id
}

/// Student access restricted to one parish
pub struct ParishScope {
    tenant: TenantId,
    storage: Arc<dyn Storage>,
}

impl ParishScope {
    pub fn for_principal(principal: &Principal, storage: Arc<dyn Storage>) -> Self {
        Self {
            tenant: scope_filter(principal).clone(),
            storage,
        }
    }

    pub async fn list(&self) -> Result<Vec<Student>, AppError> {
        self.storage.list_students(&self.tenant).await
    }

    /// Fetch a record, records of other parishes read as missing
    pub async fn get(&self, id: StudentId) -> Result<Student, AppError> {
        self.storage
            .get_student(&self.tenant, id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn create(&self, details: StudentDetails) -> Result<Student, AppError> {
        self.storage.insert_student(&self.tenant, details).await
    }

    pub async fn update(&self, id: StudentId, details: StudentDetails) -> Result<Student, AppError> {
        self.storage
            .update_student(&self.tenant, id, details)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn delete(&self, id: StudentId) -> Result<(), AppError> {
        if self.storage.delete_student(&self.tenant, id).await? {
            Ok(())
        } else {
            Err(not_found(id))
        }
    }
}

fn not_found(id: StudentId) -> AppError {
    AppError::NotFound(format!("student {id}"))
}
