use serde::{Deserialize, Serialize};

/// The four meals the mess serves every day.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Meal {
    Breakfast,
    Lunch,
    Snacks,
    Dinner,
}

pub const MEALS: [Meal; 4] = [Meal::Breakfast, Meal::Lunch, Meal::Snacks, Meal::Dinner];

impl Meal {
    /// Key of this meal in serialized count maps.
    pub fn key(self) -> &'static str {
        match self {
            Meal::Breakfast => "breakfast",
            Meal::Lunch => "lunch",
            Meal::Snacks => "snacks",
            Meal::Dinner => "dinner",
        }
    }
}
