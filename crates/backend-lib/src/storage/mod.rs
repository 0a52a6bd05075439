// ============================
// crates/backend-lib/src/storage/mod.rs
// ============================
//! Storage abstraction with SQLite and flat-file implementations.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parish_common::{Student, StudentDetails, StudentId};
use serde::{Deserialize, Serialize};

use crate::config::{Settings, StorageBackend};
use crate::error::AppError;
use crate::scope::TenantId;
use crate::timeout::bounded;

mod flat_file;
mod sqlite;

pub use flat_file::FlatFileStorage;
pub use sqlite::SqliteStorage;

/// SQLite database file under the data directory
pub const DATABASE_FILE: &str = "parish.db";

/// A stored login
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialRecord {
    pub username: String,
    /// PHC-format password hash
    pub password_hash: String,
    /// Partition this user's records live in
    pub tenant_id: TenantId,
}

/// Trait for storage backends.
///
/// Every student operation takes the caller's tenant and must only ever
/// touch records of that tenant.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Look up a user by exact username
    async fn find_user(&self, username: &str) -> Result<Option<CredentialRecord>, AppError>;

    /// Insert a new user, `AppError::Conflict` if the username is taken
    async fn insert_user(&self, record: CredentialRecord) -> Result<(), AppError>;

    /// All students of a tenant, in insertion order
    async fn list_students(&self, tenant: &TenantId) -> Result<Vec<Student>, AppError>;

    async fn get_student(
        &self,
        tenant: &TenantId,
        id: StudentId,
    ) -> Result<Option<Student>, AppError>;

    async fn insert_student(
        &self,
        tenant: &TenantId,
        details: StudentDetails,
    ) -> Result<Student, AppError>;

    /// Replace a student's details, `None` if no such record in this tenant
    async fn update_student(
        &self,
        tenant: &TenantId,
        id: StudentId,
        details: StudentDetails,
    ) -> Result<Option<Student>, AppError>;

    /// Delete a student, `false` if no such record in this tenant
    async fn delete_student(&self, tenant: &TenantId, id: StudentId) -> Result<bool, AppError>;
}

/// Open the backend named in `settings` under its data directory
pub fn open_storage(settings: &Settings) -> anyhow::Result<Arc<dyn Storage>> {
    std::fs::create_dir_all(&settings.data_dir)?;
    let storage: Arc<dyn Storage> = match settings.storage {
        StorageBackend::Sqlite => {
            Arc::new(SqliteStorage::open(settings.data_dir.join(DATABASE_FILE))?)
        },
        StorageBackend::FlatFile => Arc::new(FlatFileStorage::new(&settings.data_dir)?),
    };
    tracing::info!(backend = ?settings.storage, dir = %settings.data_dir.display(), "storage opened");
    Ok(storage)
}

/// Wraps a backend so that no call can hang a request past `limit`.
///
/// Both backends finish their writes on the blocking pool, so a call that
/// times out here still completes or fails as a whole.
pub struct TimedStorage {
    inner: Arc<dyn Storage>,
    limit: Duration,
}

impl TimedStorage {
    pub fn new(inner: Arc<dyn Storage>, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl Storage for TimedStorage {
    async fn find_user(&self, username: &str) -> Result<Option<CredentialRecord>, AppError> {
        bounded(self.limit, "store", self.inner.find_user(username)).await
    }

    async fn insert_user(&self, record: CredentialRecord) -> Result<(), AppError> {
        bounded(self.limit, "store", self.inner.insert_user(record)).await
    }

    async fn list_students(&self, tenant: &TenantId) -> Result<Vec<Student>, AppError> {
        bounded(self.limit, "store", self.inner.list_students(tenant)).await
    }

    async fn get_student(
        &self,
        tenant: &TenantId,
        id: StudentId,
    ) -> Result<Option<Student>, AppError> {
        bounded(self.limit, "store", self.inner.get_student(tenant, id)).await
    }

    async fn insert_student(
        &self,
        tenant: &TenantId,
        details: StudentDetails,
    ) -> Result<Student, AppError> {
        bounded(self.limit, "store", self.inner.insert_student(tenant, details)).await
    }

    async fn update_student(
        &self,
        tenant: &TenantId,
        id: StudentId,
        details: StudentDetails,
    ) -> Result<Option<Student>, AppError> {
        bounded(self.limit, "store", self.inner.update_student(tenant, id, details)).await
    }

    async fn delete_student(&self, tenant: &TenantId, id: StudentId) -> Result<bool, AppError> {
        bounded(self.limit, "store", self.inner.delete_student(tenant, id)).await
    }
}

/// Behaviour every backend must share, run against each of them
#[cfg(test)]
pub(crate) mod contract {
    use super::*;

    pub fn record(name: &str) -> CredentialRecord {
        CredentialRecord {
            username: name.to_string(),
            password_hash: "$scrypt$ln=10,r=8,p=1$c2FsdA$aGFzaA".to_string(),
            tenant_id: TenantId::new(name),
        }
    }

    fn ana() -> StudentDetails {
        StudentDetails {
            name: "Ana".to_string(),
            surname: "Lopez".to_string(),
            age: Some(12),
            birthday: "2013-04-02".to_string(),
            parent_email: "maria@example.org".to_string(),
            ..StudentDetails::default()
        }
    }

    pub async fn users_are_unique_and_exact(storage: &dyn Storage) {
        assert!(storage.find_user("alice").await.unwrap().is_none());
        storage.insert_user(record("alice")).await.unwrap();
        assert_eq!(storage.find_user("alice").await.unwrap(), Some(record("alice")));
        assert!(storage.find_user("Alice").await.unwrap().is_none());

        let dup = storage.insert_user(record("alice")).await;
        assert!(matches!(dup, Err(AppError::Conflict(_))));

        // Case differs, so this is another user
        storage.insert_user(record("Alice")).await.unwrap();
    }

    pub async fn students_stay_in_their_tenant(storage: &dyn Storage) {
        let alice = TenantId::new("alice");
        let bob = TenantId::new("bob");

        let student = storage.insert_student(&alice, ana()).await.unwrap();
        assert_eq!(student.tenant_id, "alice");
        assert_eq!(student.details, ana());
        storage.insert_student(&bob, StudentDetails::default()).await.unwrap();

        let listed = storage.list_students(&alice).await.unwrap();
        assert_eq!(listed, vec![student.clone()]);

        assert!(storage.get_student(&bob, student.id).await.unwrap().is_none());
        assert!(storage
            .update_student(&bob, student.id, StudentDetails::default())
            .await
            .unwrap()
            .is_none());
        assert!(!storage.delete_student(&bob, student.id).await.unwrap());
        assert_eq!(storage.get_student(&alice, student.id).await.unwrap(), Some(student.clone()));

        let renamed = StudentDetails {
            name: "Anabel".to_string(),
            age: None,
            ..ana()
        };
        let updated = storage
            .update_student(&alice, student.id, renamed.clone())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.details, renamed);
        assert_eq!(updated.id, student.id);

        assert!(storage.delete_student(&alice, student.id).await.unwrap());
        assert!(storage.get_student(&alice, student.id).await.unwrap().is_none());
        assert!(storage.list_students(&alice).await.unwrap().is_empty());
    }

    pub async fn unknown_ids_are_absent(storage: &dyn Storage) {
        let alice = TenantId::new("alice");
        assert!(storage.get_student(&alice, 42).await.unwrap().is_none());
        assert!(storage.get_student(&alice, u64::MAX).await.unwrap().is_none());
        assert!(!storage.delete_student(&alice, u64::MAX).await.unwrap());
    }

    pub async fn concurrent_inserts_get_distinct_ids(storage: Arc<dyn Storage>) {
        let tenant = TenantId::new("alice");

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let storage = storage.clone();
            let tenant = tenant.clone();
            tasks.push(tokio::spawn(async move {
                storage.insert_student(&tenant, StudentDetails::default()).await.unwrap().id
            }));
        }

        let mut ids = Vec::new();
        for task in tasks {
            ids.push(task.await.unwrap());
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 8);
    }
}
