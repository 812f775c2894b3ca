pub mod handle;

use serde::{Deserialize, Serialize};

/// Role a login record is tagged with.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Mess,
    Student,
}

/// The single locally-registered student record.
///
/// The credential store round-trips this record verbatim; the handle
/// layer only ever writes SHA-256 digests into `password`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Credentials {
    /// Name of this student.
    pub name: String,
    /// Email of this student, the unique identity of the record.
    /// Compared case-insensitively everywhere.
    pub email: String,
    /// SHA-256 digest of this student's password.
    pub password: String,
    /// Division letter, `A` to `G`.
    pub division: String,
    /// Roll number, 1 to 100.
    pub roll: Option<u32>,
    /// 14-digit PRN, kept as a string to preserve leading zeroes.
    pub prn: String,
    /// Batch year (ex. 2026).
    pub batch: Option<u32>,
}

/// A role-tagged mess login record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MessAccount {
    /// Unique lookup key, compared case-insensitively.
    pub username: String,
    /// SHA-256 digest of this account's password.
    pub password: String,
    pub role: Role,
}
