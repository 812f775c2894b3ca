pub mod handle;

use chrono::Utc;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tokio::sync::Mutex;

pub use messbuddy_shared::update::*;

use crate::store;

pub static INSTANCE: Lazy<UpdateManager> = Lazy::new(UpdateManager::new);

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("update title couldn't be empty")]
    TitleEmpty,
}

impl crate::AsResCode for Error {
    fn response_code(&self) -> hyper::StatusCode {
        hyper::StatusCode::FORBIDDEN
    }
}

/// The caller-supplied part of an update record.
pub struct UpdateDraft {
    pub title: String,
    pub description: String,
    pub image: Option<u64>,
    pub category: Option<String>,
    pub urgent: bool,
}

pub struct UpdateManager {
    pub updates: RwLock<Vec<Update>>,
    persist_lock: Mutex<()>,
}

impl UpdateManager {
    const KEY: &'static str = "updates";

    /// Read and create an update manager from the updates entry.
    fn new() -> Self {
        #[cfg(not(test))]
        {
            let updates = match store::read_entry::<Vec<Update>>(Self::KEY) {
                Ok(updates) => updates,
                Err(store::Error::NotFound) => Vec::new(),
                Err(err) => {
                    tracing::warn!("updates entry unreadable, treating as empty: {err}");
                    Vec::new()
                }
            };
            return Self {
                updates: RwLock::new(updates),
                persist_lock: Mutex::new(()),
            };
        }

        #[cfg(test)]
        Self {
            updates: RwLock::new(Vec::new()),
            persist_lock: Mutex::new(()),
        }
    }

    /// All stored updates, newest first.
    pub fn all(&self) -> Vec<Update> {
        self.updates.read().clone()
    }

    /// Materialize `draft` and prepend it to the collection.
    pub async fn append(&self, draft: UpdateDraft) -> Result<Update, store::Error> {
        let update = {
            let mut w = self.updates.write();

            let mut id = Utc::now().timestamp_millis() as u64;
            while w.iter().any(|e| e.id == id) {
                id += 1;
            }

            let update = Update {
                id,
                time: Utc::now(),
                title: draft.title,
                description: draft.description,
                image: draft.image,
                category: draft.category,
                urgent: draft.urgent,
            };
            w.insert(0, update.clone());
            update
        };

        self.persist().await?;
        Ok(update)
    }

    async fn persist(&self) -> Result<(), store::Error> {
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
        self.updates.write().clear();
    }
}
