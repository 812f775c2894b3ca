use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct GetMediaDescriptor {
    pub hash: u64,
}

#[derive(Serialize, Deserialize)]
pub struct RaiseIssueDescriptor {
    pub title: String,
    pub details: String,
    pub category: String,
    /// Media cache hashes returned by previous uploads.
    pub media: Vec<u64>,
}

#[derive(Serialize, Deserialize)]
pub struct GetIssuesDescriptor {
    pub filters: Vec<GetIssuesFilter>,
}

#[derive(Serialize, Deserialize, Clone)]
pub enum GetIssuesFilter {
    /// Issues reported by the target author.
    Author(String),
    /// Issues created on or before the target date.
    Before(chrono::NaiveDate),
    /// Issues created on or after the target date.
    After(chrono::NaiveDate),
    Category(String),
    /// Issues whose title or details contain all target keywords.
    Keyword(String),
    /// Issues currently at the target stage of the ladder.
    Stage(u32),
    /// Issues in the target status.
    Status(super::IssueStatus),
}

#[derive(Serialize, Deserialize)]
pub struct GetIssuesInfoDescriptor {
    pub issues: Vec<u64>,
}

#[derive(Serialize, Deserialize)]
pub enum GetIssueInfoResult {
    Full(super::Issue),
    NotFound(
        /// Target issue id
        u64,
    ),
}

#[derive(Serialize, Deserialize)]
pub struct EditIssueDescriptor {
    pub issue: u64,
    pub variants: Vec<EditIssueVariant>,
}

#[derive(Serialize, Deserialize, Clone)]
pub enum EditIssueVariant {
    /// Close the issue without resolution.
    Cancel,
    Category(String),
    Details(String),
    Media(Vec<u64>),
    Title(String),
}

#[derive(Serialize, Deserialize)]
pub struct AdvanceIssueDescriptor {
    pub issue: u64,
    pub variant: AdvanceIssueVariant,
}

#[derive(Serialize, Deserialize, Clone)]
pub enum AdvanceIssueVariant {
    /// Move the issue one stage up the ladder, recording the message as
    /// the receiving stage's response.
    Forward(String),
    /// Record a response at the issue's current stage without moving it.
    Respond(String),
    /// Record a closing response and mark the issue resolved.
    Resolve(String),
}
