use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateMealRequest {
    #[serde(default)]
    pub text: Option<String>,
}

/// `?date=YYYY-MM-DD`, UTC day; today when absent.
#[derive(Debug, Default, Deserialize)]
pub struct DayQuery {
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailySummary {
    pub date: String,
    pub target: i32,
    pub consumed: f64,
    pub remaining: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub meals: usize,
}
