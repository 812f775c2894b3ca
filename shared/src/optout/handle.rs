use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::meal::Meal;

#[derive(Serialize, Deserialize)]
pub struct SubmitOptOutDescriptor {
    /// The skipped meal; `None` means all meals of the day.
    pub meal: Option<Meal>,
    pub start_date: chrono::NaiveDate,
    /// Inclusive.
    pub end_date: chrono::NaiveDate,
    pub reason: String,
}

#[derive(Serialize, Deserialize)]
pub struct OverviewDescriptor {
    pub start_date: chrono::NaiveDate,
    /// Inclusive.
    pub end_date: chrono::NaiveDate,
}

/// Aggregated opt-out counts of one day, keyed by meal.
#[derive(Serialize, Deserialize, Debug)]
pub struct DayOverview {
    pub date: chrono::NaiveDate,
    pub total_students: u32,
    /// Distinct opted-out students per meal key.
    pub opt_out: BTreeMap<String, u32>,
}
