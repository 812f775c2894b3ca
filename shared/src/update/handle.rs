use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct PostUpdateDescriptor {
    pub title: String,
    pub description: String,
    /// Media cache hash of an illustration, if any.
    pub image: Option<u64>,
    pub category: Option<String>,
    #[serde(default)]
    pub urgent: bool,
}

#[derive(Serialize, Deserialize)]
pub struct GetUpdatesDescriptor {
    pub filters: Vec<GetUpdatesFilter>,
}

#[derive(Serialize, Deserialize, Clone)]
pub enum GetUpdatesFilter {
    /// Updates posted on or after the target date.
    After(chrono::NaiveDate),
    /// Updates posted on or before the target date.
    Before(chrono::NaiveDate),
    Category(String),
    Urgent,
}
