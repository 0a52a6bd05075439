//! JSON flat-file backend: `users.json` and `students.json` under one directory.
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parish_common::{Student, StudentDetails, StudentId};
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::{CredentialRecord, Storage};
use crate::error::AppError;
use crate::scope::TenantId;

const USERS_FILE: &str = "users.json";
const STUDENTS_FILE: &str = "students.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct StudentTable {
    next_id: StudentId,
    students: Vec<Student>,
}

impl StudentTable {
    fn position(&self, tenant: &TenantId, id: StudentId) -> Option<usize> {
        self.students
            .iter()
            .position(|s| s.id == id && s.tenant_id == tenant.as_str())
    }
}

/// Flat-file implementation of the Storage trait.
///
/// Each read-modify-write cycle runs start to finish on the blocking pool
/// under one lock, so a caller giving up early cannot leave a write half done
/// or let the next writer read a stale table.
#[derive(Clone)]
pub struct FlatFileStorage {
    root: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FlatFileStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    async fn read<T, R, F>(&self, name: &'static str, f: F) -> Result<R, AppError>
    where
        T: DeserializeOwned + Default,
        F: FnOnce(T) -> R + Send + 'static,
        R: Send + 'static,
    {
        let path = self.root.join(name);
        tokio::task::spawn_blocking(move || -> Result<R, AppError> { Ok(f(read_table(&path)?)) })
            .await?
    }

    async fn mutate<T, R, F>(&self, name: &'static str, f: F) -> Result<R, AppError>
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnOnce(&mut T) -> Result<R, AppError> + Send + 'static,
        R: Send + 'static,
    {
        let path = self.root.join(name);
        let lock = self.write_lock.clone();
        tokio::task::spawn_blocking(move || -> Result<R, AppError> {
            let _guard = lock.lock();
            let mut table: T = read_table(&path)?;
            let out = f(&mut table)?;
            write_table(&path, &table)?;
            Ok(out)
        })
        .await?
    }
}

fn read_table<T: DeserializeOwned + Default>(path: &Path) -> Result<T, AppError> {
    match fs::read_to_string(path) {
        Ok(content) if content.trim().is_empty() => Ok(T::default()),
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

/// Write via a temp file and rename so readers never see a partial table
fn write_table<T: Serialize>(path: &Path, table: &T) -> Result<(), AppError> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_string_pretty(table)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[async_trait]
impl Storage for FlatFileStorage {
    async fn find_user(&self, username: &str) -> Result<Option<CredentialRecord>, AppError> {
        let username = username.to_owned();
        self.read(USERS_FILE, move |users: Vec<CredentialRecord>| {
            users.into_iter().find(|u| u.username == username)
        })
        .await
    }

    async fn insert_user(&self, record: CredentialRecord) -> Result<(), AppError> {
        self.mutate(USERS_FILE, move |users: &mut Vec<CredentialRecord>| {
            if users.iter().any(|u| u.username == record.username) {
                return Err(AppError::Conflict(format!("user {}", record.username)));
            }
            users.push(record);
            Ok(())
        })
        .await
    }

    async fn list_students(&self, tenant: &TenantId) -> Result<Vec<Student>, AppError> {
        let tenant = tenant.clone();
        self.read(STUDENTS_FILE, move |table: StudentTable| {
            table
                .students
                .into_iter()
                .filter(|s| s.tenant_id == tenant.as_str())
                .collect()
        })
        .await
    }

    async fn get_student(
        &self,
        tenant: &TenantId,
        id: StudentId,
    ) -> Result<Option<Student>, AppError> {
        let tenant = tenant.clone();
        self.read(STUDENTS_FILE, move |mut table: StudentTable| {
            table.position(&tenant, id).map(|pos| table.students.swap_remove(pos))
        })
        .await
    }

    async fn insert_student(
        &self,
        tenant: &TenantId,
        details: StudentDetails,
    ) -> Result<Student, AppError> {
        let tenant = tenant.clone();
        self.mutate(STUDENTS_FILE, move |table: &mut StudentTable| {
            table.next_id += 1;
            let student = Student {
                id: table.next_id,
                tenant_id: tenant.as_str().to_string(),
                details,
            };
            table.students.push(student.clone());
            Ok(student)
        })
        .await
    }

    async fn update_student(
        &self,
        tenant: &TenantId,
        id: StudentId,
        details: StudentDetails,
    ) -> Result<Option<Student>, AppError> {
        let tenant = tenant.clone();
        self.mutate(STUDENTS_FILE, move |table: &mut StudentTable| {
            Ok(table.position(&tenant, id).map(|pos| {
                table.students[pos].details = details;
                table.students[pos].clone()
            }))
        })
        .await
    }

    async fn delete_student(&self, tenant: &TenantId, id: StudentId) -> Result<bool, AppError> {
        let tenant = tenant.clone();
        self.mutate(STUDENTS_FILE, move |table: &mut StudentTable| {
            Ok(table
                .position(&tenant, id)
                .map(|pos| table.students.remove(pos))
                .is_some())
        })
        .await
    }
}
