use serde::{Deserialize, Serialize};

/// Dietary goal stored on the profile.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Objective {
    Losing,
    Maintaining,
    Gaining,
}

impl Objective {
    pub fn as_str(self) -> &'static str {
        match self {
            Objective::Losing => "losing",
            Objective::Maintaining => "maintaining",
            Objective::Gaining => "gaining",
        }
    }

    /// Lenient parse for values read back from the database.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "losing" => Some(Objective::Losing),
            "maintaining" => Some(Objective::Maintaining),
            "gaining" => Some(Objective::Gaining),
            _ => None,
        }
    }

    /// Wording used inside the prompt.
    pub fn prompt_label(self) -> &'static str {
        match self {
            Objective::Losing => "perder peso",
            Objective::Maintaining => "manter peso",
            Objective::Gaining => "ganhar massa",
        }
    }
}

/// Optional personalisation for the prompt. Never checked for plausibility.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserNutritionContext {
    #[serde(default)]
    pub age: Option<f64>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub objective: Option<Objective>,
}

/// Structured result of one meal analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NutritionEstimate {
    pub food_name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insight: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub profile: Option<UserNutritionContext>,
}
