pub mod handle;

use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tokio::sync::Mutex;

pub use messbuddy_shared::optout::*;

use messbuddy_shared::meal::Meal;

use crate::store;

pub static INSTANCE: Lazy<OptOutManager> = Lazy::new(OptOutManager::new);

/// Longest range one overview or declaration may span, in days.
pub const MAX_RANGE_DAYS: i64 = 62;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("end date earlier than start date")]
    DateRangeInverted,
    #[error("date range longer than {MAX_RANGE_DAYS} days")]
    DateOutOfRange,
}

impl crate::AsResCode for Error {
    fn response_code(&self) -> hyper::StatusCode {
        hyper::StatusCode::FORBIDDEN
    }
}

/// The caller-supplied part of an opt-out record.
pub struct OptOutDraft {
    pub author: String,
    pub meal: Option<Meal>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
}

pub struct OptOutManager {
    pub opt_outs: RwLock<Vec<OptOut>>,
    persist_lock: Mutex<()>,
}

impl OptOutManager {
    const KEY: &'static str = "optouts";

    /// Read and create an opt-out manager from the optouts entry.
    fn new() -> Self {
        #[cfg(not(test))]
        {
            let opt_outs = match store::read_entry::<Vec<OptOut>>(Self::KEY) {
                Ok(opt_outs) => opt_outs,
                Err(store::Error::NotFound) => Vec::new(),
                Err(err) => {
                    tracing::warn!("optouts entry unreadable, treating as empty: {err}");
                    Vec::new()
                }
            };
            return Self {
                opt_outs: RwLock::new(opt_outs),
                persist_lock: Mutex::new(()),
            };
        }

        #[cfg(test)]
        Self {
            opt_outs: RwLock::new(Vec::new()),
            persist_lock: Mutex::new(()),
        }
    }

    /// All stored declarations, newest first.
    pub fn all(&self) -> Vec<OptOut> {
        self.opt_outs.read().clone()
    }

    /// Materialize `draft` and prepend it to the collection.
    pub async fn append(&self, draft: OptOutDraft) -> Result<OptOut, store::Error> {
        let opt_out = {
            let mut w = self.opt_outs.write();

            let mut id = Utc::now().timestamp_millis() as u64;
            while w.iter().any(|e| e.id == id) {
                id += 1;
            }

            let opt_out = OptOut {
                id,
                author: draft.author,
                meal: draft.meal,
                start_date: draft.start_date,
                end_date: draft.end_date,
                reason: draft.reason,
                time: Utc::now(),
            };
            w.insert(0, opt_out.clone());
            opt_out
        };

        self.persist().await?;
        Ok(opt_out)
    }

    /// Count distinct students opted out of the target meal on the
    /// target date, so overlapping declarations don't double-count.
    pub fn count(&self, date: NaiveDate, meal: Meal) -> u32 {
        let r = self.opt_outs.read();
        let mut authors: Vec<&str> = r
            .iter()
            .filter(|o| o.covers(date, meal))
            .map(|o| o.author.as_str())
            .collect();
        authors.sort_unstable();
        authors.dedup();
        authors.len() as u32
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
        self.opt_outs.write().clear();
    }
}
