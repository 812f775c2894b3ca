use serde::{Deserialize, Serialize};

use crate::meal::Meal;

#[derive(Serialize, Deserialize)]
pub struct SubmitRatingDescriptor {
    pub meal: Meal,
    /// The date the rated meal was served.
    pub date: chrono::NaiveDate,
    /// 1 to 5.
    pub stars: u8,
    #[serde(default)]
    pub text: String,
}

#[derive(Serialize, Deserialize)]
pub struct GetRatingsDescriptor {
    pub date: chrono::NaiveDate,
}
