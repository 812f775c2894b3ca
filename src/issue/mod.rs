pub(crate) mod cache;
pub mod handle;

use chrono::Utc;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tokio::sync::Mutex;

pub use messbuddy_shared::issue::*;

use crate::store;

pub static INSTANCE: Lazy<IssueManager> = Lazy::new(IssueManager::new);

/// Attachments per issue.
pub const MAX_MEDIA: usize = 6;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("cache error: {0}")]
    Cache(cache::Error),
    #[error("issue not found")]
    NotFound,
    #[error("issue title couldn't be empty")]
    TitleEmpty,
    #[error("issue details couldn't be empty")]
    DetailsEmpty,
    #[error("too many attachments, max {MAX_MEDIA}")]
    TooManyAttachments,
    #[error("issue already in status: {0:?}")]
    Already(IssueStatus),
    #[error("issue already at the top of the ladder")]
    LadderExhausted,
    #[error("response text couldn't be empty")]
    MsgEmpty,
}

impl crate::AsResCode for Error {
    fn response_code(&self) -> hyper::StatusCode {
        match self {
            Error::Cache(err) => err.response_code(),
            Error::NotFound => hyper::StatusCode::NOT_FOUND,
            _ => hyper::StatusCode::FORBIDDEN,
        }
    }
}

/// The caller-supplied part of an issue record. [`IssueManager::append`]
/// materializes the rest.
pub struct IssueDraft {
    pub title: String,
    pub details: String,
    pub media: Vec<u64>,
    pub category: String,
    pub author: Option<String>,
}

pub struct IssueManager {
    pub issues: RwLock<Vec<RwLock<Issue>>>,
    persist_lock: Mutex<()>,
}

impl IssueManager {
    const KEY: &'static str = "issues";

    /// Read and create an issue manager from the issues entry.
    fn new() -> Self {
        #[cfg(not(test))]
        {
            let issues = match store::read_entry::<Vec<Issue>>(Self::KEY) {
                Ok(issues) => issues,
                Err(store::Error::NotFound) => Vec::new(),
                Err(err) => {
                    tracing::warn!("issues entry unreadable, treating as empty: {err}");
                    Vec::new()
                }
            };
            return Self {
                issues: RwLock::new(issues.into_iter().map(RwLock::new).collect()),
                persist_lock: Mutex::new(()),
            };
        }

        #[cfg(test)]
        Self {
            issues: RwLock::new(Vec::new()),
            persist_lock: Mutex::new(()),
        }
    }

    /// All stored issues, newest first.
    pub fn all(&self) -> Vec<Issue> {
        self.issues.read().iter().map(|e| e.read().clone()).collect()
    }

    /// Replace the entire collection and persist it.
    pub async fn save(&self, issues: Vec<Issue>) -> Result<(), store::Error> {
        *self.issues.write() = issues.into_iter().map(RwLock::new).collect();
        self.persist().await
    }

    /// Materialize `draft` and prepend it to the collection, so the
    /// collection stays newest-first.
    ///
    /// The id starts from the current UTC millisecond count and is
    /// generated inside the write-lock critical section, bumping past
    /// any taken value. Two appends racing each other within the same
    /// millisecond therefore can not collide.
    pub async fn append(&self, draft: IssueDraft) -> Result<Issue, store::Error> {
        let issue = {
            let mut w = self.issues.write();

            let mut id = Utc::now().timestamp_millis() as u64;
            while w.iter().any(|e| e.read().id == id) {
                id += 1;
            }

            let issue = Issue {
                id,
                title: draft.title,
                details: draft.details,
                media: draft.media,
                category: draft.category,
                author: draft.author,
                time: Utc::now(),
                status: IssueStatus::Open,
                stage: 0,
                responses: Default::default(),
            };
            w.insert(0, RwLock::new(issue.clone()));
            issue
        };

        self.persist().await?;
        Ok(issue)
    }

    /// Remove the collection and its entry.
    pub async fn clear(&self) -> Result<(), store::Error> {
        self.issues.write().clear();

        let _guard = self.persist_lock.lock().await;

        #[cfg(not(test))]
        return store::remove_entry(Self::KEY).await;

        #[cfg(test)]
        Ok(())
    }

    /// Write the current collection to its entry.
    pub(crate) async fn persist(&self) -> Result<(), store::Error> {
        let _guard = self.persist_lock.lock().await;

        #[cfg(not(test))]
        {
            let snapshot = self.all();
            return store::write_entry(Self::KEY, &snapshot).await;
        }

        #[cfg(test)]
        Ok(())
    }

    #[cfg(test)]
    pub fn reset(&self) {
        self.issues.write().clear();
    }
}
