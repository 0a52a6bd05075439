// ================
// common/src/lib.rs
// ================
//! Common types shared by the parish registry server and its page layer:
//! the stored student record and the HTML form payloads posted by browsers.

use serde::{Deserialize, Serialize};

/// Identifier of a student record
pub type StudentId = u64;

/// Everything a parish records about a child and their parent
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentDetails {
    pub name: String,
    pub surname: String,
    /// Age in years, if given
    pub age: Option<u32>,
    pub birthday: String,
    pub confirmation_year: String,
    pub cell_number: String,
    pub allergies: String,
    pub school: String,
    pub parent_name: String,
    pub parent_surname: String,
    pub parent_number: String,
    pub parent_email: String,
}

/// A stored student record
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Student {
    /// Store-assigned identifier
    pub id: StudentId,
    /// Partition (parish) the record belongs to
    pub tenant_id: String,
    #[serde(flatten)]
    pub details: StudentDetails,
}

/// Login and registration form
#[derive(Deserialize, Debug, Clone, Default)]
pub struct CredentialsForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Student fields as posted by the registration and edit forms.
///
/// The registration page names the child fields `child_name`,
/// `child_surname` and `year`; the edit page uses the record names.
/// A posted `parish_email` is ignored: the partition always comes from
/// the logged-in user.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct StudentForm {
    #[serde(alias = "child_name")]
    pub name: String,
    #[serde(alias = "child_surname")]
    pub surname: String,
    pub age: String,
    pub birthday: String,
    #[serde(alias = "year")]
    pub confirmation_year: String,
    pub cell_number: String,
    pub allergies: String,
    pub school: String,
    pub parent_name: String,
    pub parent_surname: String,
    pub parent_number: String,
    pub parent_email: String,
}

/// Edit form: the student fields plus the record being edited
#[derive(Deserialize, Debug, Clone, Default)]
pub struct EditStudentForm {
    #[serde(rename = "studentId", default)]
    pub student_id: String,
    #[serde(flatten)]
    pub student: StudentForm,
}

/// Delete form posted from the class list
#[derive(Deserialize, Debug, Clone, Default)]
pub struct DeleteStudentForm {
    #[serde(rename = "studentId", default)]
    pub student_id: String,
}
