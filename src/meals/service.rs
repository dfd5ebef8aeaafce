use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::PgPool;
use time::{macros::format_description, Date, Duration, OffsetDateTime, Time};
use tracing::{error, info};
use uuid::Uuid;

use super::{
    dto::DailySummary,
    repo::{self, Meal},
};
use crate::analysis::{error::AnalysisError, service::analyze_meal};
use crate::profiles::{dto::DEFAULT_CALORIE_GOAL, repo::Profile};
use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum LogMealError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error("meal store failed: {0}")]
    Store(#[from] anyhow::Error),
}

impl IntoResponse for LogMealError {
    fn into_response(self) -> Response {
        match self {
            LogMealError::Analysis(e) => e.into_response(),
            LogMealError::Store(e) => {
                error!(error = %e, "meal store failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal error" })),
                )
                    .into_response()
            }
        }
    }
}

/// Analyse `text` with the caller's profile as context and store the result.
pub async fn log_meal(state: &AppState, user_id: Uuid, text: &str) -> Result<Meal, LogMealError> {
    if text.trim().is_empty() {
        return Err(AnalysisError::MissingText.into());
    }

    let context = Profile::find(&state.db, user_id)
        .await?
        .map(|p| p.nutrition_context());

    let estimate = analyze_meal(state.generator.as_ref(), text, context.as_ref()).await?;
    let meal = repo::insert(&state.db, user_id, text, &estimate).await?;
    info!(meal_id = %meal.id, %user_id, calories = meal.calories, "meal logged");
    Ok(meal)
}

/// `YYYY-MM-DD`, or today (UTC) when absent.
pub fn parse_day(raw: Option<&str>) -> Result<Date, time::error::Parse> {
    match raw {
        Some(s) => Date::parse(s.trim(), format_description!("[year]-[month]-[day]")),
        None => Ok(OffsetDateTime::now_utc().date()),
    }
}

/// Half-open UTC range covering `day`.
pub fn day_bounds(day: Date) -> (OffsetDateTime, OffsetDateTime) {
    let start = day.with_time(Time::MIDNIGHT).assume_utc();
    (start, start + Duration::days(1))
}

pub fn summarize(day: Date, meals: &[Meal], target: i32) -> DailySummary {
    let (consumed, protein, carbs, fat) = meals.iter().fold((0.0, 0.0, 0.0, 0.0), |acc, m| {
        (
            acc.0 + m.calories,
            acc.1 + m.protein,
            acc.2 + m.carbs,
            acc.3 + m.fat,
        )
    });
    DailySummary {
        date: day.to_string(),
        target,
        consumed,
        remaining: f64::from(target) - consumed,
        protein,
        carbs,
        fat,
        meals: meals.len(),
    }
}

pub async fn meals_for_day(db: &PgPool, user_id: Uuid, day: Date) -> anyhow::Result<Vec<Meal>> {
    let (from, to) = day_bounds(day);
    repo::list_between(db, user_id, from, to).await
}

pub async fn daily_summary(db: &PgPool, user_id: Uuid, day: Date) -> anyhow::Result<DailySummary> {
    let target = Profile::find(db, user_id)
        .await?
        .map(|p| p.calorie_goal())
        .unwrap_or(DEFAULT_CALORIE_GOAL);
    let meals = meals_for_day(db, user_id, day).await?;
    Ok(summarize(day, &meals, target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    fn meal(calories: f64, protein: f64, carbs: f64, fat: f64) -> Meal {
        Meal {
            id: Uuid::new_v4(),
            description: "x".into(),
            food_name: "x".into(),
            calories,
            protein,
            carbs,
            fat,
            insight: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn parse_day_accepts_iso_dates() {
        assert_eq!(parse_day(Some("2025-03-09")).unwrap(), date!(2025 - 03 - 09));
        assert_eq!(parse_day(Some(" 2025-12-31 ")).unwrap(), date!(2025 - 12 - 31));
        assert!(parse_day(Some("09/03/2025")).is_err());
        assert!(parse_day(Some("2025-02-30")).is_err());
        assert_eq!(parse_day(None).unwrap(), OffsetDateTime::now_utc().date());
    }

    #[test]
    fn day_bounds_span_one_utc_day() {
        let (from, to) = day_bounds(date!(2024 - 02 - 28));
        assert_eq!(from, datetime!(2024-02-28 00:00 UTC));
        assert_eq!(to, datetime!(2024-02-29 00:00 UTC));
    }

    #[test]
    fn summary_adds_up_meals() {
        let meals = [meal(320.0, 14.0, 28.0, 16.0), meal(480.5, 30.0, 50.0, 12.5)];
        let s = summarize(date!(2025 - 01 - 15), &meals, 2000);
        assert_eq!(s.date, "2025-01-15");
        assert_eq!(s.consumed, 800.5);
        assert_eq!(s.remaining, 1199.5);
        assert_eq!(s.protein, 44.0);
        assert_eq!(s.carbs, 78.0);
        assert_eq!(s.fat, 28.5);
        assert_eq!(s.meals, 2);
    }

    #[test]
    fn empty_day_has_full_target_left() {
        let s = summarize(date!(2025 - 01 - 15), &[], 1800);
        assert_eq!(s.consumed, 0.0);
        assert_eq!(s.remaining, 1800.0);
        assert_eq!(s.meals, 0);
    }

    #[test]
    fn overeating_goes_negative() {
        let s = summarize(date!(2025 - 01 - 15), &[meal(2500.0, 0.0, 0.0, 0.0)], 2000);
        assert_eq!(s.remaining, -500.0);
    }
}
