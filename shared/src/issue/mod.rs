pub mod handle;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The fixed escalation ladder an issue nominally passes through.
/// An issue's `stage` is an index into this list.
pub const STAGES: [&str; 4] = ["User", "Infra club", "Mess", "Campus admin"];

/// Represents an issue reported by a student.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// The only id of this issue.
    pub id: u64,
    pub title: String,
    pub details: String,
    /// Media cache hashes of the attachments, in the order they were
    /// added.
    pub media: Vec<u64>,
    pub category: String,
    /// Email of the reporting student, if known.
    pub author: Option<String>,
    /// Creation time of this issue.
    pub time: chrono::DateTime<chrono::Utc>,
    pub status: IssueStatus,
    /// Index into [`STAGES`].
    pub stage: u32,
    /// Sparse mapping from stage index to the response recorded there.
    pub responses: BTreeMap<u32, StageResponse>,
}

/// Describes status of an issue. `Cancelled` and `Resolved` are
/// terminal.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
    Open,
    Cancelled,
    Resolved,
}

/// A response recorded at one stage of the ladder.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StageResponse {
    /// Label of the responding authority, one of [`STAGES`].
    pub actor: String,
    pub text: String,
    pub time: chrono::DateTime<chrono::Utc>,
}
