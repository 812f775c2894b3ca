pub mod handle;

use serde::{Deserialize, Serialize};

/// A broadcast update posted by the mess.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Update {
    /// The only id of this update.
    pub id: u64,
    /// Posting time of this update.
    pub time: chrono::DateTime<chrono::Utc>,
    pub title: String,
    pub description: String,
    /// Media cache hash of an illustration, if any.
    pub image: Option<u64>,
    pub category: Option<String>,
    pub urgent: bool,
}
