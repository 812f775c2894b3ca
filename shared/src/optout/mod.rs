pub mod handle;

use serde::{Deserialize, Serialize};

use crate::meal::Meal;

/// A student's declaration of meals they will skip.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OptOut {
    /// The only id of this declaration.
    pub id: u64,
    /// Email of the declaring student.
    pub author: String,
    /// The skipped meal; `None` means all meals of the day.
    pub meal: Option<Meal>,
    pub start_date: chrono::NaiveDate,
    /// Inclusive; equal to `start_date` for a single day.
    pub end_date: chrono::NaiveDate,
    pub reason: String,
    /// Submission time of this declaration.
    pub time: chrono::DateTime<chrono::Utc>,
}

impl OptOut {
    /// Whether this declaration covers the target meal on the target
    /// date.
    pub fn covers(&self, date: chrono::NaiveDate, meal: Meal) -> bool {
        self.start_date <= date
            && date <= self.end_date
            && self.meal.map_or(true, |m| m == meal)
    }
}
