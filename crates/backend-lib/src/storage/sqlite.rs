//! SQLite backend.
//!
//! Tables:
//! - `users`: username (unique, case-sensitive), password_hash, tenant_id
//! - `students`: one row per student, partitioned by tenant_id
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parish_common::{Student, StudentDetails, StudentId};
use parking_lot::Mutex;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

use super::{CredentialRecord, Storage};
use crate::error::AppError;
use crate::scope::TenantId;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        username TEXT NOT NULL UNIQUE COLLATE BINARY,
        password_hash TEXT NOT NULL,
        tenant_id TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS students (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        tenant_id TEXT NOT NULL,
        name TEXT NOT NULL,
        surname TEXT NOT NULL,
        age INTEGER,
        birthday TEXT NOT NULL,
        confirmation_year TEXT NOT NULL,
        cell_number TEXT NOT NULL,
        allergies TEXT NOT NULL,
        school TEXT NOT NULL,
        parent_name TEXT NOT NULL,
        parent_surname TEXT NOT NULL,
        parent_number TEXT NOT NULL,
        parent_email TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_students_tenant ON students(tenant_id, id);
";

const STUDENT_COLUMNS: &str = "id, tenant_id, name, surname, age, birthday, confirmation_year, \
     cell_number, allergies, school, parent_name, parent_surname, parent_number, parent_email";

/// SQLite implementation of the Storage trait.
///
/// The connection sits behind a blocking mutex and every statement runs on
/// the blocking pool. Student queries always bind the tenant.
#[derive(Clone)]
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    /// Open (or create) the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn call<R, F>(&self, f: F) -> Result<R, AppError>
    where
        F: FnOnce(&mut Connection) -> Result<R, AppError> + Send + 'static,
        R: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || f(&mut conn.lock())).await?
    }
}

fn student_from_row(row: &Row<'_>) -> rusqlite::Result<Student> {
    let raw_id: i64 = row.get(0)?;
    let id = StudentId::try_from(raw_id)
        .map_err(|_| rusqlite::Error::IntegralValueOutOfRange(0, raw_id))?;
    Ok(Student {
        id,
        tenant_id: row.get(1)?,
        details: StudentDetails {
            name: row.get(2)?,
            surname: row.get(3)?,
            age: row.get(4)?,
            birthday: row.get(5)?,
            confirmation_year: row.get(6)?,
            cell_number: row.get(7)?,
            allergies: row.get(8)?,
            school: row.get(9)?,
            parent_name: row.get(10)?,
            parent_surname: row.get(11)?,
            parent_number: row.get(12)?,
            parent_email: row.get(13)?,
        },
    })
}

fn select_student(
    conn: &Connection,
    tenant: &TenantId,
    id: i64,
) -> Result<Option<Student>, AppError> {
    let sql = format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = ?1 AND tenant_id = ?2");
    Ok(conn
        .query_row(&sql, params![id, tenant.as_str()], student_from_row)
        .optional()?)
}

/// Ids beyond SQLite's integer range cannot name a stored row
fn row_id(id: StudentId) -> Option<i64> {
    i64::try_from(id).ok()
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn find_user(&self, username: &str) -> Result<Option<CredentialRecord>, AppError> {
        let username = username.to_owned();
        self.call(move |conn| {
            Ok(conn
                .query_row(
                    "SELECT username, password_hash, tenant_id FROM users WHERE username = ?1",
                    params![username],
                    |row| {
                        Ok(CredentialRecord {
                            username: row.get(0)?,
                            password_hash: row.get(1)?,
                            tenant_id: TenantId::new(row.get::<_, String>(2)?),
                        })
                    },
                )
                .optional()?)
        })
        .await
    }

    async fn insert_user(&self, record: CredentialRecord) -> Result<(), AppError> {
        self.call(move |conn| {
            let inserted = conn.execute(
                "INSERT INTO users (username, password_hash, tenant_id) VALUES (?1, ?2, ?3)",
                params![record.username, record.password_hash, record.tenant_id.as_str()],
            );
            match inserted {
                Ok(_) => Ok(()),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == ErrorCode::ConstraintViolation =>
                {
                    Err(AppError::Conflict(format!("user {}", record.username)))
                },
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn list_students(&self, tenant: &TenantId) -> Result<Vec<Student>, AppError> {
        let tenant = tenant.clone();
        self.call(move |conn| {
            let sql =
                format!("SELECT {STUDENT_COLUMNS} FROM students WHERE tenant_id = ?1 ORDER BY id");
            let mut stmt = conn.prepare_cached(&sql)?;
            let rows = stmt.query_map(params![tenant.as_str()], student_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    async fn get_student(
        &self,
        tenant: &TenantId,
        id: StudentId,
    ) -> Result<Option<Student>, AppError> {
        let Some(id) = row_id(id) else {
            return Ok(None);
        };
        let tenant = tenant.clone();
        self.call(move |conn| select_student(conn, &tenant, id)).await
    }

    async fn insert_student(
        &self,
        tenant: &TenantId,
        details: StudentDetails,
    ) -> Result<Student, AppError> {
        let tenant = tenant.clone();
        self.call(move |conn| {
            conn.execute(
                "INSERT INTO students (tenant_id, name, surname, age, birthday, confirmation_year,
                     cell_number, allergies, school, parent_name, parent_surname, parent_number,
                     parent_email)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    tenant.as_str(),
                    details.name,
                    details.surname,
                    details.age,
                    details.birthday,
                    details.confirmation_year,
                    details.cell_number,
                    details.allergies,
                    details.school,
                    details.parent_name,
                    details.parent_surname,
                    details.parent_number,
                    details.parent_email,
                ],
            )?;
            let raw_id = conn.last_insert_rowid();
            let id = StudentId::try_from(raw_id)
                .map_err(|_| rusqlite::Error::IntegralValueOutOfRange(0, raw_id))?;
            Ok(Student {
                id,
                tenant_id: tenant.as_str().to_string(),
                details,
            })
        })
        .await
    }

    async fn update_student(
        &self,
        tenant: &TenantId,
        id: StudentId,
        details: StudentDetails,
    ) -> Result<Option<Student>, AppError> {
        let Some(id) = row_id(id) else {
            return Ok(None);
        };
        let tenant = tenant.clone();
        self.call(move |conn| {
            let changed = conn.execute(
                "UPDATE students SET name = ?3, surname = ?4, age = ?5, birthday = ?6,
                     confirmation_year = ?7, cell_number = ?8, allergies = ?9, school = ?10,
                     parent_name = ?11, parent_surname = ?12, parent_number = ?13,
                     parent_email = ?14
                 WHERE id = ?1 AND tenant_id = ?2",
                params![
                    id,
                    tenant.as_str(),
                    details.name,
                    details.surname,
                    details.age,
                    details.birthday,
                    details.confirmation_year,
                    details.cell_number,
                    details.allergies,
                    details.school,
                    details.parent_name,
                    details.parent_surname,
                    details.parent_number,
                    details.parent_email,
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            select_student(conn, &tenant, id)
        })
        .await
    }

    async fn delete_student(&self, tenant: &TenantId, id: StudentId) -> Result<bool, AppError> {
        let Some(id) = row_id(id) else {
            return Ok(false);
        };
        let tenant = tenant.clone();
        self.call(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM students WHERE id = ?1 AND tenant_id = ?2",
                params![id, tenant.as_str()],
            )?;
            Ok(deleted > 0)
        })
        .await
    }
}
