pub mod handle;

use serde::{Deserialize, Serialize};

use crate::meal::Meal;

/// A student's star rating of one served meal.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Rating {
    /// The only id of this rating.
    pub id: u64,
    /// Email of the rating student.
    pub author: String,
    pub meal: Meal,
    /// The date the rated meal was served.
    pub date: chrono::NaiveDate,
    /// 1 to 5.
    pub stars: u8,
    pub text: String,
    /// Submission time of this rating.
    pub time: chrono::DateTime<chrono::Utc>,
}
