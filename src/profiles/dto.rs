use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::analysis::dto::Objective;

pub const DEFAULT_CALORIE_GOAL: i32 = 2000;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub full_name: Option<String>,
    pub age: Option<i32>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub objective: Option<Objective>,
    pub calorie_goal: i32,
    #[serde(with = "time::serde::rfc3339::option")]
    pub lgpd_consent_at: Option<OffsetDateTime>,
    /// True until consent and weight are recorded.
    pub needs_setup: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: String,
    pub age: u32,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub objective: Objective,
    #[serde(default)]
    pub calorie_goal: Option<u32>,
    #[serde(default)]
    pub lgpd_consent: bool,
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.lgpd_consent {
            return Err("Privacy policy consent is required");
        }
        if self.full_name.trim().is_empty() {
            return Err("Full name is required");
        }
        if !is_positive(self.weight_kg) || !is_positive(self.height_cm) {
            return Err("Weight and height must be positive");
        }
        if self.calorie_goal == Some(0) {
            return Err("Calorie goal must be positive");
        }
        Ok(())
    }
}

fn is_positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}
