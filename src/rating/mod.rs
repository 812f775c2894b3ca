pub mod handle;

use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tokio::sync::Mutex;

pub use messbuddy_shared::rating::*;

use messbuddy_shared::meal::Meal;

use crate::store;

pub static INSTANCE: Lazy<RatingManager> = Lazy::new(RatingManager::new);

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("stars must be between 1 and 5")]
    StarsOutOfRange,
}

impl crate::AsResCode for Error {
    fn response_code(&self) -> hyper::StatusCode {
        hyper::StatusCode::FORBIDDEN
    }
}

/// The caller-supplied part of a rating record.
pub struct RatingDraft {
    pub author: String,
    pub meal: Meal,
    pub date: NaiveDate,
    pub stars: u8,
    pub text: String,
}

pub struct RatingManager {
    pub ratings: RwLock<Vec<Rating>>,
    persist_lock: Mutex<()>,
}

impl RatingManager {
    const KEY: &'static str = "ratings";

    /// Read and create a rating manager from the ratings entry.
    fn new() -> Self {
        #[cfg(not(test))]
        {
            let ratings = match store::read_entry::<Vec<Rating>>(Self::KEY) {
                Ok(ratings) => ratings,
                Err(store::Error::NotFound) => Vec::new(),
                Err(err) => {
                    tracing::warn!("ratings entry unreadable, treating as empty: {err}");
                    Vec::new()
                }
            };
            return Self {
                ratings: RwLock::new(ratings),
                persist_lock: Mutex::new(()),
            };
        }

        #[cfg(test)]
        Self {
            ratings: RwLock::new(Vec::new()),
            persist_lock: Mutex::new(()),
        }
    }

    /// All stored ratings, newest first.
    pub fn all(&self) -> Vec<Rating> {
        self.ratings.read().clone()
    }

    /// Materialize `draft` and prepend it to the collection.
    pub async fn append(&self, draft: RatingDraft) -> Result<Rating, store::Error> {
        let rating = {
            let mut w = self.ratings.write();

            let mut id = Utc::now().timestamp_millis() as u64;
            while w.iter().any(|e| e.id == id) {
                id += 1;
            }

            let rating = Rating {
                id,
                author: draft.author,
                meal: draft.meal,
                date: draft.date,
                stars: draft.stars,
                text: draft.text,
                time: Utc::now(),
            };
            w.insert(0, rating.clone());
            rating
        };

        self.persist().await?;
        Ok(rating)
    }

    /// Average stars of the target meal on the target date, if anyone
    /// rated it.
    pub fn average(&self, date: NaiveDate, meal: Meal) -> Option<f64> {
        let r = self.ratings.read();
        let stars: Vec<u8> = r
            .iter()
            .filter(|e| e.date == date && e.meal == meal)
            .map(|e| e.stars)
            .collect();

        if stars.is_empty() {
            None
        } else {
            Some(stars.iter().map(|s| f64::from(*s)).sum::<f64>() / stars.len() as f64)
        }
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
        self.ratings.write().clear();
    }
}
